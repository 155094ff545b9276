//! Linear policy squashed into the unit action box.
//!
//! `action = 0.5 + 0.5 · tanh(W · obs + b)`: all-zero parameters give the
//! neutral action, so an untrained policy reproduces the bare gait.

use caterpillar_core::traits::Policy;
use caterpillar_core::types::{Action, Observation};
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::policies::NeutralPolicy;

/// Dense linear map from observation to action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearPolicy {
    obs_dim: usize,
    act_dim: usize,
    /// Row-major `act_dim × obs_dim`.
    weights: Vec<f32>,
    bias: Vec<f32>,
}

impl LinearPolicy {
    /// All-zero policy.
    pub fn zeros(obs_dim: usize, act_dim: usize) -> Self {
        Self {
            obs_dim,
            act_dim,
            weights: vec![0.0; obs_dim * act_dim],
            bias: vec![0.0; act_dim],
        }
    }

    /// Build from a flat parameter vector laid out as [`params`](Self::params).
    pub fn from_params(
        obs_dim: usize,
        act_dim: usize,
        params: Vec<f32>,
    ) -> Result<Self, PolicyError> {
        let expected = Self::param_count(obs_dim, act_dim);
        if params.len() != expected {
            return Err(PolicyError::ShapeMismatch {
                expected,
                got: params.len(),
            });
        }
        let mut weights = params;
        let bias = weights.split_off(obs_dim * act_dim);
        Ok(Self {
            obs_dim,
            act_dim,
            weights,
            bias,
        })
    }

    pub const fn param_count(obs_dim: usize, act_dim: usize) -> usize {
        obs_dim * act_dim + act_dim
    }

    pub const fn obs_dim(&self) -> usize {
        self.obs_dim
    }

    pub const fn act_dim(&self) -> usize {
        self.act_dim
    }

    /// Weights followed by biases.
    pub fn params(&self) -> Vec<f32> {
        let mut params = Vec::with_capacity(self.weights.len() + self.bias.len());
        params.extend_from_slice(&self.weights);
        params.extend_from_slice(&self.bias);
        params
    }

    /// Check the stored vectors against the declared dimensions.
    ///
    /// Artifacts are plain JSON, so a hand-edited file can disagree with
    /// itself.
    pub fn validate(&self) -> Result<(), PolicyError> {
        let expected = Self::param_count(self.obs_dim, self.act_dim);
        let got = self.weights.len() + self.bias.len();
        if got != expected || self.bias.len() != self.act_dim {
            return Err(PolicyError::ShapeMismatch { expected, got });
        }
        Ok(())
    }

    /// Evaluate on a raw observation slice.
    pub fn act(&self, obs: &[f32]) -> Result<Vec<f32>, PolicyError> {
        if obs.len() != self.obs_dim {
            return Err(PolicyError::ShapeMismatch {
                expected: self.obs_dim,
                got: obs.len(),
            });
        }
        Ok(self
            .weights
            .chunks_exact(self.obs_dim.max(1))
            .zip(&self.bias)
            .map(|(row, b)| {
                let z: f32 = row.iter().zip(obs).map(|(w, x)| w * x).sum::<f32>() + b;
                0.5f32.mul_add(z.tanh(), 0.5)
            })
            .collect())
    }
}

impl Policy for LinearPolicy {
    /// Falls back to the neutral action on a shape mismatch.
    fn get_action(&self, obs: &Observation) -> Action {
        self.act(obs.as_slice()).map_or_else(
            |err| {
                tracing::warn!(%err, "linear policy fed a mismatched observation");
                NeutralPolicy::new(self.act_dim, 0.5).action()
            },
            Action::new,
        )
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "LinearPolicy"
    }

    fn is_deterministic(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
