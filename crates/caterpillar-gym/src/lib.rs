//! Gymnasium-style environment interface for the caterpillar robot.
//!
//! - [`Environment`]: the `reset`/`step`/`close` contract training and
//!   evaluation code is written against
//! - [`GymEnv`](mod@env): the implementation driving one Bevy [`App`](bevy::app::App)
//!   and its physics session
//! - [`applicator`]: writes the validated action into the world

pub mod applicator;
pub mod env;

use caterpillar_core::error::CaterpillarError;
use caterpillar_core::types::{Action, ActionSpace, ObservationSpace, ResetResult, StepResult};

pub use applicator::LastActionApplicator;
pub use env::GymEnv;

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// A resettable, steppable environment.
pub trait Environment {
    fn observation_space(&self) -> &ObservationSpace;

    fn action_space(&self) -> &ActionSpace;

    /// Return to the start state. `seed` is recorded; the reset itself is
    /// deterministic.
    fn reset(&mut self, seed: Option<u64>) -> Result<ResetResult, CaterpillarError>;

    /// Apply `action` for one control step.
    fn step(&mut self, action: &Action) -> Result<StepResult, CaterpillarError>;

    /// Release the physics session. Idempotent.
    fn close(&mut self);
}

pub mod prelude {
    pub use crate::{Environment, GymEnv, LastActionApplicator};
}
