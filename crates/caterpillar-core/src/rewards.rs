//! Reward terms of the crawl task.
//!
//! Each term returns an unweighted value read from [`BaseState`] or
//! [`LastAction`]; weights live in [`RewardConfig`] and are applied by
//! [`crawl_reward`].

use crate::components::{BaseState, LastAction};
use crate::config::RewardConfig;
use crate::traits::{CompositeReward, RewardFunction};
use bevy::prelude::*;

fn base_state(world: &World) -> BaseState {
    world.get_resource::<BaseState>().copied().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// ForwardVelocityReward
// ---------------------------------------------------------------------------

/// Base velocity along world x.
pub struct ForwardVelocityReward;

impl RewardFunction for ForwardVelocityReward {
    fn compute(&self, world: &World) -> f32 {
        base_state(world).forward_velocity()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "forward_velocity"
    }
}

// ---------------------------------------------------------------------------
// EffortPenalty
// ---------------------------------------------------------------------------

/// Negative mean absolute deviation of the last action from neutral.
///
/// Zero when no action has been applied yet.
pub struct EffortPenalty {
    neutral: f32,
}

impl EffortPenalty {
    #[must_use]
    pub const fn new(neutral: f32) -> Self {
        Self { neutral }
    }
}

impl RewardFunction for EffortPenalty {
    #[allow(clippy::cast_precision_loss)]
    fn compute(&self, world: &World) -> f32 {
        let Some(action) = world.get_resource::<LastAction>() else {
            return 0.0;
        };
        if action.0.is_empty() {
            return 0.0;
        }
        let total: f32 = action.0.iter().map(|a| (a - self.neutral).abs()).sum();
        -(total / action.0.len() as f32)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "effort"
    }
}

// ---------------------------------------------------------------------------
// TiltPenalty
// ---------------------------------------------------------------------------

/// Negative sum of absolute roll and pitch of the base.
pub struct TiltPenalty;

impl RewardFunction for TiltPenalty {
    fn compute(&self, world: &World) -> f32 {
        let (roll, pitch, _) = base_state(world).roll_pitch_yaw();
        -(roll.abs() + pitch.abs())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "tilt"
    }
}

// ---------------------------------------------------------------------------
// StallPenalty
// ---------------------------------------------------------------------------

/// `-1.0` while the forward velocity is below `threshold`, else `0.0`.
pub struct StallPenalty {
    threshold: f32,
}

impl StallPenalty {
    #[must_use]
    pub const fn new(threshold: f32) -> Self {
        Self { threshold }
    }
}

impl RewardFunction for StallPenalty {
    fn compute(&self, world: &World) -> f32 {
        if base_state(world).forward_velocity() < self.threshold {
            -1.0
        } else {
            0.0
        }
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "stall"
    }
}

// ---------------------------------------------------------------------------
// crawl_reward
// ---------------------------------------------------------------------------

/// The crawl reward: forward progress minus effort, tilt and stall terms.
pub fn crawl_reward(config: &RewardConfig, neutral_action: f32) -> CompositeReward {
    CompositeReward::new()
        .with_term(Box::new(ForwardVelocityReward), config.velocity_weight)
        .with_term(Box::new(EffortPenalty::new(neutral_action)), config.effort_weight)
        .with_term(Box::new(TiltPenalty), config.tilt_weight)
        .with_term(
            Box::new(StallPenalty::new(config.stall_threshold)),
            config.stall_penalty,
        )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
