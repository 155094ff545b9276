// caterpillar-core: Types, traits, config, components and errors for the caterpillar crawl environment.

pub mod components;
pub mod config;
pub mod error;
pub mod rewards;
pub mod terminations;
pub mod traits;
pub mod types;

use bevy::prelude::*;

use crate::components::{BaseState, LastAction};
use crate::config::{
    ActionConfig, GaitConfig, MotorConfig, RewardConfig, RobotConfig, SimConfig, TerminationConfig,
};

// ---------------------------------------------------------------------------
// CaterpillarSet
// ---------------------------------------------------------------------------

/// Ordering of the per-step pipeline inside `Update`.
///
/// One `App::update()` is one environment step: the action is turned into
/// joint targets, physics advances, reward and termination are evaluated and
/// the observation is rebuilt.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaterpillarSet {
    /// Advance the step counter and turn the cached action into joint targets.
    Act,
    /// Push joint targets to the physics session and step it.
    Simulate,
    /// Reward, termination and truncation.
    Evaluate,
    /// Rebuild the observation vector.
    Observe,
    /// Bookkeeping that only reads the finished step.
    Report,
}

// ---------------------------------------------------------------------------
// CaterpillarCorePlugin
// ---------------------------------------------------------------------------

/// Configures the step ordering and inserts the default config resources.
///
/// Resources already present in the world (for example inserted by a scene
/// builder from a TOML file) are left untouched.
pub struct CaterpillarCorePlugin;

impl Plugin for CaterpillarCorePlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (
                CaterpillarSet::Act,
                CaterpillarSet::Simulate,
                CaterpillarSet::Evaluate,
                CaterpillarSet::Observe,
                CaterpillarSet::Report,
            )
                .chain(),
        );

        app.init_resource::<SimConfig>()
            .init_resource::<RobotConfig>()
            .init_resource::<GaitConfig>()
            .init_resource::<MotorConfig>()
            .init_resource::<RewardConfig>()
            .init_resource::<TerminationConfig>()
            .init_resource::<ActionConfig>()
            .init_resource::<BaseState>()
            .init_resource::<LastAction>();
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        CaterpillarCorePlugin, CaterpillarSet,
        components::{BaseState, JointCommand, JointIndex, JointState, LastAction},
        config::{
            ActionBounds, ActionConfig, BodyConfig, CaterpillarConfig, EvaluationConfig,
            GaitConfig, MotorConfig, RewardConfig, RobotConfig, ShowcaseConfig, SimConfig,
            TerminationConfig, TrainingConfig,
        },
        error::{CaterpillarError, ConfigError, SimError, SpaceError, ValidationError},
        rewards::{EffortPenalty, ForwardVelocityReward, StallPenalty, TiltPenalty, crawl_reward},
        terminations::{DivergenceTermination, FallTermination, crawl_termination},
        traits::{
            ActionApplicator, CompositeReward, CompositeTermination, ObservationSensor, Policy,
            RewardFunction, Sensor, TerminationCondition,
        },
        types::{
            Action, ActionSpace, BoxSpace, Observation, ObservationSpace, ResetInfo, ResetResult,
            StepInfo, StepResult,
        },
    };
}
