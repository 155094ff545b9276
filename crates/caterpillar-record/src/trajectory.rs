//! Fixed-capacity per-step log of a rollout.
//!
//! Rows are appended once per environment step until the log is full;
//! later rows are dropped. Episode boundaries are kept as a list of
//! step indices so plots can show where the robot was respawned.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::RecordError;

// ---------------------------------------------------------------------------
// TrajectoryLog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryLog {
    capacity: usize,
    joints: usize,
    /// Step duration in seconds, used for time axes.
    pub dt: f32,
    /// One row of per-joint action values per step.
    actions: Vec<Vec<f32>>,
    /// Base forward (x) velocity per step.
    velocity: Vec<f32>,
    /// Base xy position per step.
    position: Vec<[f32; 2]>,
    /// Steps at which a new episode began.
    discontinuities: Vec<usize>,
}

impl TrajectoryLog {
    pub fn new(joints: usize, capacity: usize, dt: f32) -> Self {
        Self {
            capacity,
            joints,
            dt,
            actions: Vec::with_capacity(capacity),
            velocity: Vec::with_capacity(capacity),
            position: Vec::with_capacity(capacity),
            discontinuities: Vec::new(),
        }
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub const fn joints(&self) -> usize {
        self.joints
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Append one step. Returns `false` once the log is full.
    ///
    /// Rows shorter than the joint count are padded with zeros, longer ones
    /// are cut.
    pub fn record(&mut self, action: &[f32], forward_velocity: f32, position: [f32; 2]) -> bool {
        if self.is_full() {
            return false;
        }
        if action.len() != self.joints {
            warn!(
                expected = self.joints,
                got = action.len(),
                "action row resized to joint count"
            );
        }
        let mut row = action.to_vec();
        row.resize(self.joints, 0.0);
        self.actions.push(row);
        self.velocity.push(forward_velocity);
        self.position.push(position);
        true
    }

    /// Mark that the next recorded step starts a new episode.
    pub fn mark_discontinuity(&mut self) {
        let step = self.len();
        if self.discontinuities.last() != Some(&step) {
            debug!(step, "episode boundary");
            self.discontinuities.push(step);
        }
    }

    pub fn discontinuities(&self) -> &[usize] {
        &self.discontinuities
    }

    pub fn actions(&self) -> &[Vec<f32>] {
        &self.actions
    }

    pub fn velocity(&self) -> &[f32] {
        &self.velocity
    }

    pub fn position(&self) -> &[[f32; 2]] {
        &self.position
    }

    /// Action values of one joint over time.
    pub fn joint_series(&self, joint: usize) -> Result<Vec<f32>, RecordError> {
        if joint >= self.joints {
            return Err(RecordError::JointOutOfRange {
                joint,
                joints: self.joints,
            });
        }
        Ok(self.actions.iter().map(|row| row[joint]).collect())
    }

    pub fn x_series(&self) -> Vec<f32> {
        self.position.iter().map(|p| p[0]).collect()
    }

    pub fn mean_velocity(&self) -> f32 {
        if self.velocity.is_empty() {
            0.0
        } else {
            self.velocity.iter().sum::<f32>() / self.velocity.len() as f32
        }
    }

    /// Seconds elapsed at `step`.
    pub fn time_at(&self, step: usize) -> f32 {
        step as f32 * self.dt
    }

    pub fn save_json(&self, path: &Path) -> Result<(), RecordError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| RecordError::io(parent, e))?;
        }
        let json = serde_json::to_string(self)?;
        fs::write(path, json).map_err(|e| RecordError::io(path, e))
    }

    pub fn load_json(path: &Path) -> Result<Self, RecordError> {
        let json = fs::read_to_string(path).map_err(|e| RecordError::io(path, e))?;
        Ok(serde_json::from_str(&json)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
