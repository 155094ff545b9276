//! The neutral policy.

use caterpillar_core::traits::Policy;
use caterpillar_core::types::{Action, Observation};

/// Always the neutral action, so the robot follows the bare traveling wave.
///
/// Also the action the open-loop showcase feeds the environment, where the
/// gait ignores it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeutralPolicy {
    dim: usize,
    neutral: f32,
}

impl NeutralPolicy {
    pub const fn new(dim: usize, neutral: f32) -> Self {
        Self { dim, neutral }
    }

    pub fn action(&self) -> Action {
        Action::filled(self.dim, self.neutral)
    }
}

impl Policy for NeutralPolicy {
    fn get_action(&self, _obs: &Observation) -> Action {
        self.action()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "NeutralPolicy"
    }
}
