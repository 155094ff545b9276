//! Traveling-wave gait: the baseline joint schedule plus the residual
//! correction contributed by the action.
//!
//! Joint `i` at step `t` follows `sin(t·wave_freq − i·wave_lag)`, so the
//! wave travels from the head (joint 0) towards the tail. The action shifts
//! each joint around that baseline by at most half its amplitude.

use bevy::prelude::*;

use caterpillar_core::components::{JointCommand, JointIndex, JointState, LastAction};
use caterpillar_core::config::{GaitConfig, MotorConfig, ShowcaseConfig};

use crate::episode::Episode;

// ---------------------------------------------------------------------------
// TravelingWave
// ---------------------------------------------------------------------------

/// Baseline sinusoid plus residual correction, evaluated per joint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TravelingWave {
    pub wave_freq: f32,
    pub wave_lag: f32,
    pub residual_scale: f32,
    pub amplitude_gain: f32,
    pub neutral_action: f32,
}

impl Default for TravelingWave {
    fn default() -> Self {
        Self::from_config(&GaitConfig::default())
    }
}

impl TravelingWave {
    pub const fn from_config(config: &GaitConfig) -> Self {
        Self {
            wave_freq: config.wave_freq,
            wave_lag: config.wave_lag,
            residual_scale: config.residual_scale,
            amplitude_gain: config.amplitude_gain,
            neutral_action: config.neutral_action,
        }
    }

    /// Unit-amplitude baseline of joint `joint` at step `step`.
    pub fn baseline(&self, step: u32, joint: usize) -> f32 {
        (step as f32 * self.wave_freq - joint as f32 * self.wave_lag).sin()
    }

    /// Map an action in `[0, 1]` onto a signed correction in `[-1, 1]`.
    pub fn correction(&self, action: f32) -> f32 {
        (action - self.neutral_action) * 2.0
    }

    /// Inverse of [`correction`](Self::correction).
    pub fn action_for(&self, correction: f32) -> f32 {
        correction.mul_add(0.5, self.neutral_action)
    }

    /// Joint target angle for `action` at `step`.
    pub fn target(&self, step: u32, joint: usize, action: f32) -> f32 {
        let residual = self.residual_scale * self.correction(action);
        (self.baseline(step, joint) + residual) * self.amplitude_gain
    }

    /// Phase signal `[sin(t·wave_freq), cos(t·wave_freq)]`.
    pub fn phase(&self, step: u32) -> [f32; 2] {
        let (sin, cos) = (step as f32 * self.wave_freq).sin_cos();
        [sin, cos]
    }
}

// ---------------------------------------------------------------------------
// OpenLoopWave
// ---------------------------------------------------------------------------

/// Fixed wave used to showcase the body without a policy.
///
/// Time runs in seconds (`step / control_hz`) rather than in steps, and
/// `step` counts from 0 at the first command after a reset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpenLoopWave {
    /// Angular frequency (rad/s).
    pub frequency: f32,
    /// Phase offset between neighbouring joints (rad).
    pub wave_length: f32,
    pub amplitude: f32,
    pub max_force: f32,
    /// Joint speed cap (rad/s).
    pub max_velocity: f32,
    pub control_hz: f32,
}

impl OpenLoopWave {
    pub const fn from_config(config: &ShowcaseConfig, control_hz: f32) -> Self {
        Self {
            frequency: config.frequency,
            wave_length: config.wave_length,
            amplitude: config.amplitude,
            max_force: config.max_force,
            max_velocity: config.max_velocity,
            control_hz,
        }
    }

    /// Raw wave value in `[-1, 1]`.
    pub fn raw(&self, step: u32, joint: usize) -> f32 {
        let t = step as f32 / self.control_hz;
        (t * self.frequency - joint as f32 * self.wave_length).sin()
    }

    pub fn target(&self, step: u32, joint: usize) -> f32 {
        self.amplitude * self.raw(step, joint)
    }

    /// The raw value rescaled to `[0, 1]`, comparable to a policy action.
    pub fn intensity(&self, step: u32, joint: usize) -> f32 {
        (self.raw(step, joint) + 1.0) / 2.0
    }

    /// Pull `goal` to within one control period of travel at
    /// `max_velocity` from the joint's measured angle.
    pub fn limit_rate(&self, goal: f32, current: f32) -> f32 {
        let reach = self.max_velocity / self.control_hz;
        goal.clamp(current - reach, current + reach)
    }
}

// ---------------------------------------------------------------------------
// GaitMode
// ---------------------------------------------------------------------------

/// How joint targets are produced each step.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq)]
pub enum GaitMode {
    /// Traveling wave plus the residual from [`LastAction`].
    #[default]
    Residual,
    /// Fixed wave; actions are ignored.
    OpenLoop(OpenLoopWave),
}

// ---------------------------------------------------------------------------
// gait_command_system
// ---------------------------------------------------------------------------

/// Write every joint's position target for the current step.
///
/// Runs in [`CaterpillarSet::Act`](caterpillar_core::CaterpillarSet::Act)
/// after the step counter has advanced. Joints without an action entry use
/// the neutral action. The open-loop wave is sampled one step behind the
/// counter and rate-limited against the joint's last measured angle.
#[allow(clippy::needless_pass_by_value)]
pub fn gait_command_system(
    episode: Res<Episode>,
    mode: Res<GaitMode>,
    gait: Res<GaitConfig>,
    motor: Res<MotorConfig>,
    action: Res<LastAction>,
    mut joints: Query<(&JointIndex, &mut JointCommand, Option<&JointState>)>,
) {
    if !episode.is_running() {
        return;
    }
    let step = episode.step_count;
    match *mode {
        GaitMode::Residual => {
            let wave = TravelingWave::from_config(&gait);
            let max_force = motor.max_force();
            for (index, mut command, _) in &mut joints {
                let value = action
                    .0
                    .get(index.0)
                    .copied()
                    .unwrap_or(wave.neutral_action);
                command.target_position = wave.target(step, index.0, value);
                command.max_force = max_force;
            }
        }
        GaitMode::OpenLoop(wave) => {
            let elapsed = step.saturating_sub(1);
            for (index, mut command, state) in &mut joints {
                let goal = wave.target(elapsed, index.0);
                command.target_position =
                    state.map_or(goal, |state| wave.limit_rate(goal, state.position));
                command.max_force = wave.max_force;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
