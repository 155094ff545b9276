use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{SpaceError, ValidationError};

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

/// Flat f32 vector representing environment state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    data: Vec<f32>,
}

impl Observation {
    pub const fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    pub const fn len(&self) -> usize {
        self.data.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

impl std::ops::Index<usize> for Observation {
    type Output = f32;
    fn index(&self, i: usize) -> &f32 {
        &self.data[i]
    }
}

impl From<Vec<f32>> for Observation {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// One value per actuated joint, nominally in [0, 1].
///
/// 0.5 is the neutral value: the gait then follows the baseline wave exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    data: Vec<f32>,
}

impl Action {
    pub const fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    pub fn zeros(len: usize) -> Self {
        Self::filled(len, 0.0)
    }

    pub fn filled(len: usize, value: f32) -> Self {
        Self {
            data: vec![value; len],
        }
    }

    pub const fn len(&self) -> usize {
        self.data.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Reject NaN and infinite entries.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for val in &self.data {
            if val.is_nan() {
                return Err(ValidationError::ActionContainsNan);
            }
            if val.is_infinite() {
                return Err(ValidationError::ActionContainsInf);
            }
        }
        Ok(())
    }

    /// Index of the first entry outside `[low, high]`, if any.
    pub fn first_out_of_bounds(&self, low: f32, high: f32) -> Option<usize> {
        self.data.iter().position(|v| *v < low || *v > high)
    }

    /// Copy of this action with every entry clamped into `[low, high]`.
    #[must_use]
    pub fn clamped(&self, low: f32, high: f32) -> Self {
        Self {
            data: self.data.iter().map(|v| v.clamp(low, high)).collect(),
        }
    }
}

impl From<Vec<f32>> for Action {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

// ---------------------------------------------------------------------------
// BoxSpace
// ---------------------------------------------------------------------------

/// A box in R^n with per-dimension bounds. Follows Gymnasium conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSpace {
    pub low: Vec<f32>,
    pub high: Vec<f32>,
}

/// Space of observation vectors.
pub type ObservationSpace = BoxSpace;

/// Space of action vectors.
pub type ActionSpace = BoxSpace;

impl BoxSpace {
    pub fn new(low: Vec<f32>, high: Vec<f32>) -> Result<Self, SpaceError> {
        if low.len() != high.len() {
            return Err(SpaceError::DimensionMismatch {
                low: low.len(),
                high: high.len(),
            });
        }
        if low.iter().zip(&high).any(|(l, h)| l > h) {
            return Err(SpaceError::InvalidDefinition(
                "low must be <= high in every dimension".into(),
            ));
        }
        Ok(Self { low, high })
    }

    /// Same bounds in every dimension.
    pub fn uniform(dim: usize, low: f32, high: f32) -> Self {
        Self {
            low: vec![low; dim],
            high: vec![high; dim],
        }
    }

    /// Box with infinite bounds.
    pub fn unbounded(dim: usize) -> Self {
        Self::uniform(dim, f32::NEG_INFINITY, f32::INFINITY)
    }

    pub fn shape(&self) -> Vec<usize> {
        vec![self.low.len()]
    }

    pub fn size(&self) -> usize {
        self.low.len()
    }

    pub fn contains(&self, values: &[f32]) -> bool {
        values.len() == self.low.len()
            && values
                .iter()
                .zip(self.low.iter().zip(self.high.iter()))
                .all(|(v, (l, h))| v >= l && v <= h)
    }
}

// ---------------------------------------------------------------------------
// StepResult / ResetResult
// ---------------------------------------------------------------------------

/// Result of `env.step(action)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f32,
    /// Episode ended because the robot fell or launched.
    pub terminated: bool,
    /// Episode ended due to the step limit.
    pub truncated: bool,
    pub info: StepInfo,
}

impl StepResult {
    pub const fn is_done(&self) -> bool {
        self.terminated || self.truncated
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepInfo {
    pub episode_length: u32,
    pub episode_reward: f32,
    /// Weighted reward terms by name.
    pub custom: HashMap<String, f32>,
}

/// Result of `env.reset()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResult {
    pub observation: Observation,
    pub info: ResetInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetInfo {
    pub seed: Option<u64>,
    pub custom: HashMap<String, f32>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_basics() {
        let obs = Observation::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(obs.len(), 3);
        assert!(!obs.is_empty());
        assert!((obs[1] - 2.0).abs() < f32::EPSILON);
        assert_eq!(obs.into_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn action_validate_rejects_nan_and_inf() {
        assert_eq!(
            Action::new(vec![0.5, f32::NAN]).validate(),
            Err(ValidationError::ActionContainsNan)
        );
        assert_eq!(
            Action::new(vec![f32::INFINITY]).validate(),
            Err(ValidationError::ActionContainsInf)
        );
        assert!(Action::filled(9, 0.5).validate().is_ok());
    }

    #[test]
    fn action_clamped_into_unit_box() {
        let action = Action::new(vec![-0.2, 0.4, 1.7]);
        assert_eq!(action.first_out_of_bounds(0.0, 1.0), Some(0));
        let clamped = action.clamped(0.0, 1.0);
        assert_eq!(clamped.as_slice(), &[0.0, 0.4, 1.0]);
        assert_eq!(clamped.first_out_of_bounds(0.0, 1.0), None);
    }

    #[test]
    fn box_space_rejects_mismatched_bounds() {
        assert!(matches!(
            BoxSpace::new(vec![0.0; 2], vec![1.0; 3]),
            Err(SpaceError::DimensionMismatch { low: 2, high: 3 })
        ));
        assert!(matches!(
            BoxSpace::new(vec![1.0], vec![0.0]),
            Err(SpaceError::InvalidDefinition(_))
        ));
    }

    #[test]
    fn box_space_contains() {
        let space = BoxSpace::uniform(3, 0.0, 1.0);
        assert_eq!(space.shape(), vec![3]);
        assert!(space.contains(&[0.0, 0.5, 1.0]));
        assert!(!space.contains(&[0.0, 1.5, 1.0]));
        assert!(!space.contains(&[0.5, 0.5]));
    }

    #[test]
    fn unbounded_contains_anything_finite() {
        let space = BoxSpace::unbounded(2);
        assert!(space.contains(&[1e9, -1e9]));
    }

    #[test]
    fn step_result_done_flags() {
        let result = StepResult {
            observation: Observation::zeros(1),
            reward: 0.0,
            terminated: false,
            truncated: true,
            info: StepInfo::default(),
        };
        assert!(result.is_done());
    }
}
