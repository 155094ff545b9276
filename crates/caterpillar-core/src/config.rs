use std::path::{Path, PathBuf};

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_physics_dt() -> f64 {
    1.0 / 240.0
}
const fn default_max_episode_steps() -> u32 {
    2000
}
const fn default_gravity() -> [f32; 3] {
    [0.0, 0.0, -9.81]
}
const fn default_base_position() -> [f32; 3] {
    [0.0, 0.0, 0.05]
}
const fn default_friction() -> f32 {
    0.5
}
const fn default_segments() -> usize {
    10
}
const fn default_segment_length() -> f32 {
    0.03
}
const fn default_segment_radius() -> f32 {
    0.008
}
const fn default_segment_mass() -> f32 {
    0.002
}
const fn default_joint_axis() -> [f32; 3] {
    [0.0, 0.0, 1.0]
}
const fn default_joint_limit() -> f32 {
    1.57
}
const fn default_wave_freq() -> f32 {
    0.03
}
const fn default_wave_lag() -> f32 {
    1.5
}
const fn default_half() -> f32 {
    0.5
}
const fn default_amplitude_gain() -> f32 {
    1.5
}
const fn default_nominal_torque() -> f32 {
    0.00328e-3
}
const fn default_force_scaling() -> f32 {
    5000.0
}
const fn default_motor_stiffness() -> f32 {
    200.0
}
const fn default_motor_damping() -> f32 {
    10.0
}
const fn default_velocity_weight() -> f32 {
    200.0
}
const fn default_effort_weight() -> f32 {
    0.01
}
const fn default_tilt_weight() -> f32 {
    0.1
}
const fn default_stall_threshold() -> f32 {
    0.005
}
const fn default_one() -> f32 {
    1.0
}
const fn default_max_tilt() -> f32 {
    1.5
}
const fn default_termination_penalty() -> f32 {
    50.0
}
const fn default_total_timesteps() -> u64 {
    50_000
}
const fn default_checkpoint_freq() -> u64 {
    10_000
}
fn default_save_path() -> PathBuf {
    PathBuf::from("models")
}
fn default_name_prefix() -> String {
    "crawl_policy".into()
}
fn default_final_model() -> String {
    "crawl_policy_final.json".into()
}
const fn default_directions() -> usize {
    8
}
const fn default_top_directions() -> usize {
    4
}
const fn default_step_size() -> f32 {
    0.02
}
const fn default_exploration_noise() -> f32 {
    0.03
}
const fn default_rollout_horizon() -> u32 {
    500
}
const fn default_eval_steps() -> usize {
    1000
}
fn default_eval_results_dir() -> PathBuf {
    PathBuf::from("paper_results_50k")
}
fn default_phase_joints() -> Vec<usize> {
    vec![0, 4, 8]
}
const fn default_show_steps() -> usize {
    1200
}
const fn default_show_frequency() -> f32 {
    8.0
}
const fn default_show_amplitude() -> f32 {
    0.8
}
const fn default_show_force() -> f32 {
    500.0
}
const fn default_show_velocity() -> f32 {
    10.0
}
fn default_show_results_dir() -> PathBuf {
    PathBuf::from("paper_results_show")
}
const fn default_zoom_window() -> [usize; 2] {
    [100, 300]
}

// ---------------------------------------------------------------------------
// SimConfig
// ---------------------------------------------------------------------------

/// Physics timing and episode length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
pub struct SimConfig {
    /// Physics timestep in seconds (default: 1/240).
    #[serde(default = "default_physics_dt")]
    pub physics_dt: f64,

    /// Control timestep in seconds. Must be >= `physics_dt`.
    /// The ratio `control_dt` / `physics_dt` gives substeps per env step.
    #[serde(default = "default_physics_dt")]
    pub control_dt: f64,

    /// Truncation bound (default: 2000).
    #[serde(default = "default_max_episode_steps")]
    pub max_episode_steps: u32,

    /// Master random seed.
    #[serde(default)]
    pub seed: u64,

    /// Gravity vector [x, y, z] in m/s^2.
    #[serde(default = "default_gravity")]
    pub gravity: [f32; 3],
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            physics_dt: default_physics_dt(),
            control_dt: default_physics_dt(),
            max_episode_steps: default_max_episode_steps(),
            seed: 0,
            gravity: default_gravity(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.physics_dt <= 0.0 {
            return Err(ConfigError::InvalidPhysicsDt(self.physics_dt));
        }
        if self.control_dt < self.physics_dt {
            return Err(ConfigError::ControlDtLessThanPhysicsDt);
        }
        if self.max_episode_steps == 0 {
            return Err(ConfigError::invalid("max_episode_steps", "must be > 0"));
        }
        Ok(())
    }

    /// Number of physics substeps per environment step.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn substeps(&self) -> usize {
        ((self.control_dt / self.physics_dt).round() as usize).max(1)
    }

    /// Physics rate in Hz.
    pub fn physics_hz(&self) -> f64 {
        1.0 / self.physics_dt
    }
}

// ---------------------------------------------------------------------------
// BodyConfig
// ---------------------------------------------------------------------------

/// Geometry of the built-in segment chain used when no URDF file is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    /// Number of rigid segments; the chain has `segments - 1` joints.
    #[serde(default = "default_segments")]
    pub segments: usize,

    /// Segment length along the body axis (m).
    #[serde(default = "default_segment_length")]
    pub segment_length: f32,

    /// Segment cross-section radius (m).
    #[serde(default = "default_segment_radius")]
    pub segment_radius: f32,

    /// Mass of one segment (kg).
    #[serde(default = "default_segment_mass")]
    pub segment_mass: f32,

    /// Joint rotation axis in the parent frame. `[0, 0, 1]` bends sideways.
    #[serde(default = "default_joint_axis")]
    pub joint_axis: [f32; 3],

    /// Symmetric joint limit (rad).
    #[serde(default = "default_joint_limit")]
    pub joint_limit: f32,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            segments: default_segments(),
            segment_length: default_segment_length(),
            segment_radius: default_segment_radius(),
            segment_mass: default_segment_mass(),
            joint_axis: default_joint_axis(),
            joint_limit: default_joint_limit(),
        }
    }
}

impl BodyConfig {
    /// Number of actuated joints the generated chain exposes.
    pub const fn joint_count(&self) -> usize {
        self.segments.saturating_sub(1)
    }
}

// ---------------------------------------------------------------------------
// RobotConfig
// ---------------------------------------------------------------------------

/// Where the robot comes from and how it is placed in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
pub struct RobotConfig {
    /// URDF file to load. `None` uses the built-in segment chain.
    #[serde(default)]
    pub urdf_path: Option<PathBuf>,

    /// Start position of the base link.
    #[serde(default = "default_base_position")]
    pub base_position: [f32; 3],

    /// Start orientation of the base link as roll, pitch, yaw.
    #[serde(default)]
    pub base_rpy: [f32; 3],

    /// Lateral friction of the ground plane.
    #[serde(default = "default_friction")]
    pub ground_friction: f32,

    /// Friction of every link collider.
    #[serde(default = "default_friction")]
    pub link_friction: f32,

    /// Linear damping applied to every link.
    #[serde(default)]
    pub linear_damping: f32,

    /// Angular damping applied to every link.
    #[serde(default)]
    pub angular_damping: f32,

    #[serde(default)]
    pub body: BodyConfig,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            urdf_path: None,
            base_position: default_base_position(),
            base_rpy: [0.0; 3],
            ground_friction: default_friction(),
            link_friction: default_friction(),
            linear_damping: 0.0,
            angular_damping: 0.0,
            body: BodyConfig::default(),
        }
    }
}

impl RobotConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.urdf_path.is_none() && self.body.segments < 2 {
            return Err(ConfigError::invalid("body.segments", "must be >= 2"));
        }
        if self.body.segment_length <= 0.0 || self.body.segment_radius <= 0.0 {
            return Err(ConfigError::invalid(
                "body",
                "segment_length and segment_radius must be > 0",
            ));
        }
        if self.body.segment_mass <= 0.0 {
            return Err(ConfigError::invalid("body.segment_mass", "must be > 0"));
        }
        if self.ground_friction < 0.0 || self.link_friction < 0.0 {
            return Err(ConfigError::invalid("friction", "must be >= 0"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GaitConfig
// ---------------------------------------------------------------------------

/// Traveling-wave gait and residual correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
pub struct GaitConfig {
    /// Phase advance per step (rad/step).
    #[serde(default = "default_wave_freq")]
    pub wave_freq: f32,

    /// Phase offset between neighbouring joints (rad).
    #[serde(default = "default_wave_lag")]
    pub wave_lag: f32,

    /// Weight of the correction relative to the unit baseline.
    #[serde(default = "default_half")]
    pub residual_scale: f32,

    /// Overall gain applied to baseline plus residual.
    #[serde(default = "default_amplitude_gain")]
    pub amplitude_gain: f32,

    /// Action value that maps to zero correction.
    #[serde(default = "default_half")]
    pub neutral_action: f32,
}

impl Default for GaitConfig {
    fn default() -> Self {
        Self {
            wave_freq: default_wave_freq(),
            wave_lag: default_wave_lag(),
            residual_scale: default_half(),
            amplitude_gain: default_amplitude_gain(),
            neutral_action: default_half(),
        }
    }
}

// ---------------------------------------------------------------------------
// MotorConfig
// ---------------------------------------------------------------------------

/// Position-control motor parameters shared by every actuated joint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
pub struct MotorConfig {
    /// Nominal actuator torque (N*m).
    #[serde(default = "default_nominal_torque")]
    pub nominal_torque: f32,

    /// Multiplier applied to the nominal torque.
    #[serde(default = "default_force_scaling")]
    pub force_scaling: f32,

    /// Position gain of the joint motor.
    #[serde(default = "default_motor_stiffness")]
    pub stiffness: f32,

    /// Velocity gain of the joint motor.
    #[serde(default = "default_motor_damping")]
    pub damping: f32,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            nominal_torque: default_nominal_torque(),
            force_scaling: default_force_scaling(),
            stiffness: default_motor_stiffness(),
            damping: default_motor_damping(),
        }
    }
}

impl MotorConfig {
    /// Force cap handed to the position controller.
    pub fn max_force(&self) -> f32 {
        self.nominal_torque * self.force_scaling
    }
}

// ---------------------------------------------------------------------------
// RewardConfig
// ---------------------------------------------------------------------------

/// Weights of the crawl reward terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
pub struct RewardConfig {
    #[serde(default = "default_velocity_weight")]
    pub velocity_weight: f32,

    #[serde(default = "default_effort_weight")]
    pub effort_weight: f32,

    #[serde(default = "default_tilt_weight")]
    pub tilt_weight: f32,

    /// Forward speed below which the stall penalty applies (m/s).
    #[serde(default = "default_stall_threshold")]
    pub stall_threshold: f32,

    #[serde(default = "default_one")]
    pub stall_penalty: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            velocity_weight: default_velocity_weight(),
            effort_weight: default_effort_weight(),
            tilt_weight: default_tilt_weight(),
            stall_threshold: default_stall_threshold(),
            stall_penalty: default_one(),
        }
    }
}

// ---------------------------------------------------------------------------
// TerminationConfig
// ---------------------------------------------------------------------------

/// Fall detection bounds and the penalty charged on termination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
pub struct TerminationConfig {
    /// Base height above which the robot counts as launched (m).
    #[serde(default = "default_half")]
    pub max_height: f32,

    /// Roll/pitch magnitude above which the robot counts as flipped (rad).
    #[serde(default = "default_max_tilt")]
    pub max_tilt: f32,

    /// Subtracted from the step reward when the episode terminates.
    #[serde(default = "default_termination_penalty")]
    pub penalty: f32,
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            max_height: default_half(),
            max_tilt: default_max_tilt(),
            penalty: default_termination_penalty(),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionConfig
// ---------------------------------------------------------------------------

/// What to do with action values outside `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionBounds {
    /// Clamp into range and continue.
    #[default]
    Clamp,
    /// Reject the step with a validation error.
    Reject,
}

/// Bounds of the per-joint action box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
pub struct ActionConfig {
    #[serde(default)]
    pub low: f32,

    #[serde(default = "default_one")]
    pub high: f32,

    #[serde(default)]
    pub bounds: ActionBounds,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            low: 0.0,
            high: default_one(),
            bounds: ActionBounds::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// TrainingConfig
// ---------------------------------------------------------------------------

/// Training driver budget, checkpointing and search hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Environment steps to consume before stopping.
    #[serde(default = "default_total_timesteps")]
    pub total_timesteps: u64,

    /// Write a checkpoint every time this many more steps were consumed.
    #[serde(default = "default_checkpoint_freq")]
    pub checkpoint_freq: u64,

    /// Directory holding checkpoints and the final artifact.
    #[serde(default = "default_save_path")]
    pub save_path: PathBuf,

    /// Checkpoint file name prefix.
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,

    /// File name of the final artifact inside `save_path`.
    #[serde(default = "default_final_model")]
    pub final_model: String,

    /// Perturbation directions sampled per iteration.
    #[serde(default = "default_directions")]
    pub directions: usize,

    /// Best directions kept for the update.
    #[serde(default = "default_top_directions")]
    pub top_directions: usize,

    #[serde(default = "default_step_size")]
    pub step_size: f32,

    /// Standard deviation of parameter perturbations.
    #[serde(default = "default_exploration_noise")]
    pub exploration_noise: f32,

    /// Step cap of a single rollout.
    #[serde(default = "default_rollout_horizon")]
    pub rollout_horizon: u32,

    #[serde(default)]
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            total_timesteps: default_total_timesteps(),
            checkpoint_freq: default_checkpoint_freq(),
            save_path: default_save_path(),
            name_prefix: default_name_prefix(),
            final_model: default_final_model(),
            directions: default_directions(),
            top_directions: default_top_directions(),
            step_size: default_step_size(),
            exploration_noise: default_exploration_noise(),
            rollout_horizon: default_rollout_horizon(),
            seed: 0,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.checkpoint_freq == 0 {
            return Err(ConfigError::invalid("training.checkpoint_freq", "must be > 0"));
        }
        if self.directions == 0 {
            return Err(ConfigError::invalid("training.directions", "must be > 0"));
        }
        if self.top_directions == 0 || self.top_directions > self.directions {
            return Err(ConfigError::invalid(
                "training.top_directions",
                "must be in 1..=directions",
            ));
        }
        if self.exploration_noise <= 0.0 {
            return Err(ConfigError::invalid("training.exploration_noise", "must be > 0"));
        }
        if self.rollout_horizon == 0 {
            return Err(ConfigError::invalid("training.rollout_horizon", "must be > 0"));
        }
        Ok(())
    }

    /// Path of the final artifact.
    pub fn final_model_path(&self) -> PathBuf {
        self.save_path.join(&self.final_model)
    }
}

// ---------------------------------------------------------------------------
// EvaluationConfig
// ---------------------------------------------------------------------------

/// Deterministic replay of a trained policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default = "default_eval_steps")]
    pub steps: usize,

    #[serde(default = "default_eval_results_dir")]
    pub results_dir: PathBuf,

    /// Multiplier on the per-step sleep when pacing is enabled.
    #[serde(default = "default_one")]
    pub slow_motion_factor: f32,

    /// Joints drawn in the phase-shift chart.
    #[serde(default = "default_phase_joints")]
    pub phase_joints: Vec<usize>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            steps: default_eval_steps(),
            results_dir: default_eval_results_dir(),
            slow_motion_factor: default_one(),
            phase_joints: default_phase_joints(),
        }
    }
}

// ---------------------------------------------------------------------------
// ShowcaseConfig
// ---------------------------------------------------------------------------

/// Open-loop gait demonstration driven by wall-clock simulation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowcaseConfig {
    #[serde(default = "default_show_steps")]
    pub steps: usize,

    /// Angular frequency of the wave (rad/s).
    #[serde(default = "default_show_frequency")]
    pub frequency: f32,

    /// Phase offset between neighbouring joints (rad).
    #[serde(default = "default_one")]
    pub wave_length: f32,

    /// Joint angle amplitude (rad).
    #[serde(default = "default_show_amplitude")]
    pub amplitude: f32,

    /// Motor force cap used by the demo.
    #[serde(default = "default_show_force")]
    pub max_force: f32,

    /// Joint speed cap used by the demo (rad/s).
    #[serde(default = "default_show_velocity")]
    pub max_velocity: f32,

    #[serde(default = "default_show_results_dir")]
    pub results_dir: PathBuf,

    /// Step range of the phase-lag zoom panel.
    #[serde(default = "default_zoom_window")]
    pub zoom_window: [usize; 2],

    #[serde(default = "default_phase_joints")]
    pub phase_joints: Vec<usize>,
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        Self {
            steps: default_show_steps(),
            frequency: default_show_frequency(),
            wave_length: default_one(),
            amplitude: default_show_amplitude(),
            max_force: default_show_force(),
            max_velocity: default_show_velocity(),
            results_dir: default_show_results_dir(),
            zoom_window: default_zoom_window(),
            phase_joints: default_phase_joints(),
        }
    }
}

// ---------------------------------------------------------------------------
// CaterpillarConfig
// ---------------------------------------------------------------------------

/// Everything one TOML file can configure. Every section is optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CaterpillarConfig {
    #[serde(default)]
    pub simulation: SimConfig,
    #[serde(default)]
    pub robot: RobotConfig,
    #[serde(default)]
    pub gait: GaitConfig,
    #[serde(default)]
    pub motor: MotorConfig,
    #[serde(default)]
    pub reward: RewardConfig,
    #[serde(default)]
    pub termination: TerminationConfig,
    #[serde(default)]
    pub action: ActionConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub showcase: ShowcaseConfig,
}

impl CaterpillarConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.robot.validate()?;
        self.training.validate()?;
        if self.action.low >= self.action.high {
            return Err(ConfigError::invalid("action", "low must be < high"));
        }
        if self.termination.max_height <= 0.0 || self.termination.max_tilt <= 0.0 {
            return Err(ConfigError::invalid(
                "termination",
                "max_height and max_tilt must be > 0",
            ));
        }
        if self.reward.stall_threshold < 0.0 {
            return Err(ConfigError::invalid("reward.stall_threshold", "must be >= 0"));
        }
        if self.motor.max_force() <= 0.0 {
            return Err(ConfigError::invalid("motor", "max force must be > 0"));
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_config_defaults() {
        let config = SimConfig::default();
        assert!((config.physics_dt - 1.0 / 240.0).abs() < f64::EPSILON);
        assert_eq!(config.max_episode_steps, 2000);
        assert_eq!(config.substeps(), 1);
        assert!((config.gravity[2] - (-9.81)).abs() < f32::EPSILON);
    }

    #[test]
    fn sim_config_rejects_bad_dt() {
        let config = SimConfig {
            physics_dt: 0.0,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPhysicsDt(_))
        ));

        let config = SimConfig {
            control_dt: 0.001,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ControlDtLessThanPhysicsDt)
        ));
    }

    #[test]
    fn sim_config_requires_a_step_limit() {
        let config = SimConfig {
            max_episode_steps: 0,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "max_episode_steps"
        ));
    }

    #[test]
    fn substeps_follow_control_ratio() {
        let config = SimConfig {
            physics_dt: 1.0 / 240.0,
            control_dt: 4.0 / 240.0,
            ..SimConfig::default()
        };
        assert_eq!(config.substeps(), 4);
    }

    #[test]
    fn motor_max_force_is_scaled_torque() {
        let motor = MotorConfig::default();
        assert!((motor.max_force() - 0.0164).abs() < 1e-6);
    }

    #[test]
    fn gait_defaults() {
        let gait = GaitConfig::default();
        assert!((gait.wave_freq - 0.03).abs() < f32::EPSILON);
        assert!((gait.wave_lag - 1.5).abs() < f32::EPSILON);
        assert!((gait.residual_scale - 0.5).abs() < f32::EPSILON);
        assert!((gait.amplitude_gain - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn body_joint_count() {
        assert_eq!(BodyConfig::default().joint_count(), 9);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = CaterpillarConfig::from_toml_str("").unwrap();
        assert_eq!(config, CaterpillarConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_given_fields() {
        let toml = r#"
            [reward]
            velocity_weight = 100.0

            [action]
            bounds = "reject"

            [training]
            total_timesteps = 2000
        "#;
        let config = CaterpillarConfig::from_toml_str(toml).unwrap();
        assert!((config.reward.velocity_weight - 100.0).abs() < f32::EPSILON);
        assert!((config.reward.tilt_weight - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.action.bounds, ActionBounds::Reject);
        assert_eq!(config.training.total_timesteps, 2000);
        assert_eq!(config.training.checkpoint_freq, 10_000);
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let result = CaterpillarConfig::from_toml_str("[reward\nvelocity_weight = ");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn validation_rejects_inverted_action_bounds() {
        let mut config = CaterpillarConfig::default();
        config.action.low = 1.0;
        config.action.high = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn validation_rejects_too_many_top_directions() {
        let mut config = CaterpillarConfig::default();
        config.training.top_directions = config.training.directions + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let result = CaterpillarConfig::from_file("/nonexistent/caterpillar.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = CaterpillarConfig::default();
        let text = toml::to_string(&config).unwrap();
        let back = CaterpillarConfig::from_toml_str(&text).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn final_model_path_joins_save_path() {
        let training = TrainingConfig::default();
        assert_eq!(
            training.final_model_path(),
            PathBuf::from("models/crawl_policy_final.json")
        );
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let config =
            CaterpillarConfig::from_toml_str(include_str!("../../../configs/caterpillar.toml"))
                .unwrap();
        let defaults = CaterpillarConfig::default();
        assert!((config.simulation.physics_dt - defaults.simulation.physics_dt).abs() < 1e-12);
        assert_eq!(config.simulation.substeps(), 1);
        assert_eq!(config.simulation.max_episode_steps, 2000);
        assert_eq!(config.robot, defaults.robot);
        assert_eq!(config.gait, defaults.gait);
        assert_eq!(config.action, defaults.action);
        assert_eq!(config.training, defaults.training);
        assert_eq!(config.evaluation, defaults.evaluation);
        assert_eq!(config.showcase, defaults.showcase);
        assert!((config.motor.max_force() - defaults.motor.max_force()).abs() < 1e-6);
    }
}
