//! Gymnasium-style environment wrapper around a Bevy App.
//!
//! [`GymEnv`] owns one [`App`] and its physics session. Every
//! [`step`](GymEnv::step) validates the action, caches it, runs exactly one
//! `App::update()` (one control step) and reads back observation, reward and
//! episode flags.

use bevy::prelude::*;
use tracing::{debug, info};

use caterpillar_core::components::{JointCommand, LastAction};
use caterpillar_core::config::{ActionBounds, ActionConfig};
use caterpillar_core::error::{CaterpillarError, SimError, ValidationError};
use caterpillar_core::traits::ActionApplicator;
use caterpillar_core::types::{
    Action, ActionSpace, Observation, ObservationSpace, ResetInfo, ResetResult, StepInfo,
    StepResult,
};
use caterpillar_env::buffer::ObservationBuffer;
use caterpillar_env::episode::{Episode, EpisodeState};
use caterpillar_env::systems::{RewardBreakdown, observe_system};
use caterpillar_physics::PhysicsBackend;

use crate::Environment;

// ---------------------------------------------------------------------------
// GymEnv
// ---------------------------------------------------------------------------

/// Gymnasium-compatible environment wrapping a Bevy [`App`].
///
/// The session is closed by [`close`](Environment::close) or, failing that,
/// when the environment is dropped.
pub struct GymEnv {
    app: App,
    obs_space: ObservationSpace,
    act_space: ActionSpace,
    applicator: Box<dyn ActionApplicator>,
    backend: Box<dyn PhysicsBackend>,
    closed: bool,
}

impl GymEnv {
    /// Wrap an app whose physics session is already open and whose robot is
    /// registered. Call [`reset`](Environment::reset) before stepping.
    pub fn new(
        app: App,
        obs_space: ObservationSpace,
        act_space: ActionSpace,
        applicator: Box<dyn ActionApplicator>,
        backend: Box<dyn PhysicsBackend>,
    ) -> Self {
        Self {
            app,
            obs_space,
            act_space,
            applicator,
            backend,
            closed: false,
        }
    }

    pub const fn app(&self) -> &App {
        &self.app
    }

    pub const fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    pub fn episode(&self) -> &Episode {
        self.app.world().resource::<Episode>()
    }

    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    fn current_observation(&self) -> Observation {
        self.app
            .world()
            .get_resource::<ObservationBuffer>()
            .map_or_else(|| Observation::zeros(0), ObservationBuffer::as_observation)
    }

    /// Check shape and finiteness, then apply the configured bounds policy.
    fn checked_action(&self, action: &Action) -> Result<Action, ValidationError> {
        let expected = self.act_space.size();
        if action.len() != expected {
            return Err(ValidationError::ActionDimMismatch {
                expected,
                got: action.len(),
            });
        }
        action.validate()?;

        let config = self
            .app
            .world()
            .get_resource::<ActionConfig>()
            .cloned()
            .unwrap_or_default();
        match (config.bounds, action.first_out_of_bounds(config.low, config.high)) {
            (_, None) => Ok(action.clone()),
            (ActionBounds::Reject, Some(dim)) => Err(ValidationError::ActionOutOfBounds { dim }),
            (ActionBounds::Clamp, Some(dim)) => {
                debug!(dim, "action clamped to bounds");
                Ok(action.clamped(config.low, config.high))
            }
        }
    }
}

impl Environment for GymEnv {
    fn observation_space(&self) -> &ObservationSpace {
        &self.obs_space
    }

    fn action_space(&self) -> &ActionSpace {
        &self.act_space
    }

    fn reset(&mut self, seed: Option<u64>) -> Result<ResetResult, CaterpillarError> {
        if self.closed {
            return Err(SimError::SessionClosed.into());
        }
        let n_actions = self.act_space.size();
        let world = self.app.world_mut();
        self.backend.reset(world)?;

        world.insert_resource(LastAction(vec![0.0; n_actions]));
        let mut commands = world.query::<&mut JointCommand>();
        for mut command in commands.iter_mut(world) {
            *command = JointCommand::default();
        }
        world.resource_mut::<Episode>().reset(seed);
        observe_system(world);

        debug!(?seed, "environment reset");
        Ok(ResetResult {
            observation: self.current_observation(),
            info: ResetInfo {
                seed,
                ..Default::default()
            },
        })
    }

    fn step(&mut self, action: &Action) -> Result<StepResult, CaterpillarError> {
        if self.closed {
            return Err(SimError::SessionClosed.into());
        }
        match self.episode().state {
            EpisodeState::Idle => return Err(SimError::NotReset.into()),
            EpisodeState::Done => return Err(SimError::EpisodeFinished.into()),
            EpisodeState::Running => {}
        }

        let action = self.checked_action(action)?;
        self.applicator.apply(self.app.world_mut(), &action);
        self.app.update();

        let observation = self.current_observation();
        let world = self.app.world();
        let episode = world.resource::<Episode>();
        let custom = world
            .get_resource::<RewardBreakdown>()
            .map(|b| b.0.iter().cloned().collect())
            .unwrap_or_default();

        Ok(StepResult {
            observation,
            reward: episode.last_reward,
            terminated: episode.terminated,
            truncated: episode.truncated,
            info: StepInfo {
                episode_length: episode.step_count,
                episode_reward: episode.total_reward,
                custom,
            },
        })
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if self.backend.close(self.app.world_mut()) {
            info!(backend = self.backend.name(), "environment closed");
        }
    }
}

impl Drop for GymEnv {
    fn drop(&mut self) {
        self.close();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
