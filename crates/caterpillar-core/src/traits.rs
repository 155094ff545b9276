//! Extension points of the step pipeline.
//!
//! Sensors fill the observation, a [`RewardFunction`] set scores the step,
//! [`TerminationCondition`]s end it early, and an [`ActionApplicator`]
//! hands the agent's action to the gait.

use crate::types::{Action, Observation};
use bevy::prelude::*;

// ---------------------------------------------------------------------------
// Sensor
// ---------------------------------------------------------------------------

/// Reads one slice of robot state out of the world.
pub trait Sensor: Send + Sync + 'static {
    type Output;

    fn read(&self, world: &mut World) -> Self::Output;

    fn name(&self) -> &str;
}

/// A sensor that writes a fixed-width block of the observation vector.
pub trait ObservationSensor: Sensor<Output = Observation> {
    /// Width of the block, constant for the sensor's lifetime.
    fn observation_dim(&self) -> usize;
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Maps an observation to one action value per joint.
pub trait Policy: Send + Sync + 'static {
    fn get_action(&self, obs: &Observation) -> Action;

    fn name(&self) -> &str;

    /// `false` for policies that sample.
    fn is_deterministic(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// RewardFunction
// ---------------------------------------------------------------------------

/// One unweighted reward term, evaluated after physics has stepped.
pub trait RewardFunction: Send + Sync + 'static {
    fn compute(&self, world: &World) -> f32;

    /// Key used in the per-step reward breakdown.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// TerminationCondition
// ---------------------------------------------------------------------------

/// A failure state that ends the episode (fall, flip, divergence).
pub trait TerminationCondition: Send + Sync + 'static {
    fn is_terminated(&self, world: &World) -> bool;

    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// ActionApplicator
// ---------------------------------------------------------------------------

/// Writes an action into the world. The action has already passed shape,
/// finiteness and bounds checks.
pub trait ActionApplicator: Send + Sync + 'static {
    fn apply(&self, world: &mut World, action: &Action);

    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// CompositeReward
// ---------------------------------------------------------------------------

/// Weighted sum of reward terms.
///
/// Penalty terms return a magnitude and carry a negative weight, or
/// return a negative value with a positive weight; either way the term's
/// contribution is `compute(world) * weight`.
pub struct CompositeReward {
    terms: Vec<(Box<dyn RewardFunction>, f32)>,
}

impl CompositeReward {
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    #[must_use]
    pub fn with_term(mut self, term: Box<dyn RewardFunction>, weight: f32) -> Self {
        self.terms.push((term, weight));
        self
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Weighted contribution of every term, in insertion order.
    pub fn breakdown(&self, world: &World) -> Vec<(&str, f32)> {
        self.terms
            .iter()
            .map(|(term, weight)| (term.name(), term.compute(world) * weight))
            .collect()
    }
}

impl Default for CompositeReward {
    fn default() -> Self {
        Self::new()
    }
}

impl RewardFunction for CompositeReward {
    fn compute(&self, world: &World) -> f32 {
        self.breakdown(world).iter().map(|(_, value)| value).sum()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "composite"
    }
}

// ---------------------------------------------------------------------------
// CompositeTermination
// ---------------------------------------------------------------------------

/// Terminates when any of its conditions holds.
pub struct CompositeTermination {
    conditions: Vec<Box<dyn TerminationCondition>>,
}

impl CompositeTermination {
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_condition(mut self, condition: Box<dyn TerminationCondition>) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Names of the conditions that hold right now.
    pub fn triggered(&self, world: &World) -> Vec<&str> {
        self.conditions
            .iter()
            .filter(|condition| condition.is_terminated(world))
            .map(|condition| condition.name())
            .collect()
    }
}

impl Default for CompositeTermination {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminationCondition for CompositeTermination {
    fn is_terminated(&self, world: &World) -> bool {
        self.conditions.iter().any(|c| c.is_terminated(world))
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "composite"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f32, &'static str);

    impl RewardFunction for Fixed {
        fn compute(&self, _world: &World) -> f32 {
            self.0
        }

        fn name(&self) -> &str {
            self.1
        }
    }

    struct Flag(bool, &'static str);

    impl TerminationCondition for Flag {
        fn is_terminated(&self, _world: &World) -> bool {
            self.0
        }

        fn name(&self) -> &str {
            self.1
        }
    }

    #[test]
    fn no_terms_no_reward() {
        let reward = CompositeReward::default();
        assert!(reward.is_empty());
        assert!(reward.compute(&World::new()).abs() < f32::EPSILON);
    }

    #[test]
    fn velocity_minus_stall() {
        // 200 × 0.01 m/s − 1 stall = 1
        let reward = CompositeReward::new()
            .with_term(Box::new(Fixed(0.01, "velocity")), 200.0)
            .with_term(Box::new(Fixed(-1.0, "stall")), 1.0);
        assert_eq!(reward.len(), 2);
        assert!((reward.compute(&World::new()) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn breakdown_keeps_order_and_weights() {
        let reward = CompositeReward::new()
            .with_term(Box::new(Fixed(0.3, "tilt")), -0.1)
            .with_term(Box::new(Fixed(0.2, "effort")), -0.01);
        let world = World::new();
        let terms = reward.breakdown(&world);
        assert_eq!(terms.iter().map(|(n, _)| *n).collect::<Vec<_>>(), ["tilt", "effort"]);
        assert!((terms[0].1 + 0.03).abs() < 1e-6);
        assert!((terms[1].1 + 0.002).abs() < 1e-6);
        let total: f32 = terms.iter().map(|(_, v)| v).sum();
        assert!((reward.compute(&world) - total).abs() < f32::EPSILON);
    }

    #[test]
    fn any_condition_terminates() {
        let world = World::new();
        assert!(!CompositeTermination::default().is_terminated(&world));

        let calm = CompositeTermination::new()
            .with_condition(Box::new(Flag(false, "fall")))
            .with_condition(Box::new(Flag(false, "divergence")));
        assert!(!calm.is_terminated(&world));
        assert!(calm.triggered(&world).is_empty());

        let fallen = CompositeTermination::new()
            .with_condition(Box::new(Flag(true, "fall")))
            .with_condition(Box::new(Flag(false, "divergence")));
        assert!(fallen.is_terminated(&world));
        assert_eq!(fallen.triggered(&world), ["fall"]);
    }

    #[test]
    fn models_can_live_in_resources() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompositeReward>();
        assert_send_sync::<CompositeTermination>();
    }
}
