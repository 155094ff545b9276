//! Termination conditions of the crawl task.

use crate::components::BaseState;
use crate::config::TerminationConfig;
use crate::traits::{CompositeTermination, TerminationCondition};
use bevy::prelude::*;

// ---------------------------------------------------------------------------
// FallTermination
// ---------------------------------------------------------------------------

/// Ends the episode when the base leaves the ground or flips over.
///
/// Both bounds are strict: a base exactly at `max_height` or exactly at
/// `max_tilt` keeps the episode running.
pub struct FallTermination {
    max_height: f32,
    max_tilt: f32,
}

impl FallTermination {
    #[must_use]
    pub const fn new(max_height: f32, max_tilt: f32) -> Self {
        Self {
            max_height,
            max_tilt,
        }
    }

    /// Pure check on a base state.
    pub fn check(&self, base: &BaseState) -> bool {
        let (roll, pitch, _) = base.roll_pitch_yaw();
        base.height() > self.max_height || roll.abs() > self.max_tilt || pitch.abs() > self.max_tilt
    }
}

impl TerminationCondition for FallTermination {
    fn is_terminated(&self, world: &World) -> bool {
        world
            .get_resource::<BaseState>()
            .is_some_and(|base| self.check(base))
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "fall"
    }
}

// ---------------------------------------------------------------------------
// DivergenceTermination
// ---------------------------------------------------------------------------

/// Ends the episode when the physics state contains NaN or infinity.
pub struct DivergenceTermination;

impl TerminationCondition for DivergenceTermination {
    fn is_terminated(&self, world: &World) -> bool {
        world
            .get_resource::<BaseState>()
            .is_some_and(|base| !base.is_finite())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "divergence"
    }
}

/// Termination conditions of the crawl task.
pub fn crawl_termination(config: &TerminationConfig) -> CompositeTermination {
    CompositeTermination::new()
        .with_condition(Box::new(FallTermination::new(
            config.max_height,
            config.max_tilt,
        )))
        .with_condition(Box::new(DivergenceTermination))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with(base: BaseState) -> World {
        let mut world = World::new();
        world.insert_resource(base);
        world
    }

    fn at_height(z: f32) -> BaseState {
        BaseState {
            position: Vec3::new(0.0, 0.0, z),
            ..BaseState::default()
        }
    }

    #[test]
    fn height_bound_is_strict() {
        let term = FallTermination::new(0.5, 1.5);
        assert!(!term.is_terminated(&world_with(at_height(0.5))));
        assert!(term.is_terminated(&world_with(at_height(0.5 + 1e-4))));
        assert!(!term.is_terminated(&world_with(at_height(0.01))));
    }

    #[test]
    fn roll_beyond_limit_terminates() {
        let term = FallTermination::new(0.5, 1.5);
        let flipped = BaseState {
            orientation: Quat::from_rotation_x(1.6),
            ..BaseState::default()
        };
        assert!(term.is_terminated(&world_with(flipped)));

        let leaning = BaseState {
            orientation: Quat::from_rotation_x(1.4),
            ..BaseState::default()
        };
        assert!(!term.is_terminated(&world_with(leaning)));
    }

    #[test]
    fn pitch_beyond_limit_terminates() {
        let term = FallTermination::new(0.5, 1.5);
        let base = BaseState {
            orientation: Quat::from_rotation_y(-1.55),
            ..BaseState::default()
        };
        assert!(term.is_terminated(&world_with(base)));
    }

    #[test]
    fn yaw_never_terminates() {
        let term = FallTermination::new(0.5, 1.5);
        let base = BaseState {
            orientation: Quat::from_rotation_z(3.0),
            ..BaseState::default()
        };
        assert!(!term.is_terminated(&world_with(base)));
    }

    #[test]
    fn missing_base_state_does_not_terminate() {
        assert!(!FallTermination::new(0.5, 1.5).is_terminated(&World::new()));
        assert!(!DivergenceTermination.is_terminated(&World::new()));
    }

    #[test]
    fn unbounded_config_only_catches_divergence() {
        let config = TerminationConfig {
            max_height: f32::INFINITY,
            max_tilt: f32::INFINITY,
            ..TerminationConfig::default()
        };
        let term = crawl_termination(&config);
        let tumbling = BaseState {
            position: Vec3::new(0.0, 0.0, 3.0),
            orientation: Quat::from_rotation_x(3.0),
            ..BaseState::default()
        };
        assert!(!term.is_terminated(&world_with(tumbling)));
        assert!(term.is_terminated(&world_with(at_height(f32::NAN))));
    }

    #[test]
    fn nan_state_terminates() {
        let base = BaseState {
            position: Vec3::new(f32::NAN, 0.0, 0.0),
            ..BaseState::default()
        };
        let term = crawl_termination(&TerminationConfig::default());
        assert!(term.is_terminated(&world_with(base)));
    }

    #[test]
    fn crawl_termination_reports_fall() {
        let term = crawl_termination(&TerminationConfig::default());
        let world = world_with(at_height(0.8));
        assert_eq!(term.triggered(&world), vec!["fall"]);
    }
}
