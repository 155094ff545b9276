//! Scene builder for constructing a fully configured environment.
//!
//! [`SceneBuilder`] inserts the configuration, adds the plugins, opens the
//! physics session, spawns the robot and registers the observation sensors.
//!
//! ```no_run
//! use caterpillar_sim::SceneBuilder;
//!
//! let env = SceneBuilder::new()
//!     .with_max_episode_steps(500)
//!     .build()
//!     .unwrap()
//!     .into_env();
//! ```

use bevy::prelude::*;
use thiserror::Error;
use tracing::info;

use caterpillar_core::config::CaterpillarConfig;
use caterpillar_core::error::{ConfigError, SimError};
use caterpillar_core::types::BoxSpace;
use caterpillar_env::gait::GaitMode;
use caterpillar_env::register_crawl_sensors;
use caterpillar_env::sensors::crawl_observation_dim;
use caterpillar_gym::{GymEnv, LastActionApplicator};
use caterpillar_physics::{CaterpillarPhysicsPlugin, PhysicsBackend, RapierBackend};
use caterpillar_urdf::{RobotModel, SpawnedRobot, UrdfError, load_robot, spawn_robot};

use crate::CaterpillarSimPlugin;

// ---------------------------------------------------------------------------
// SceneError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Robot description: {0}")]
    Urdf(#[from] UrdfError),

    #[error("Physics setup: {0}")]
    Simulation(#[from] SimError),
}

// ---------------------------------------------------------------------------
// SpawnedScene
// ---------------------------------------------------------------------------

/// A built scene: the app with an open physics session and its robot.
pub struct SpawnedScene {
    pub app: App,
    pub model: RobotModel,
    pub robot: SpawnedRobot,
    action_low: f32,
    action_high: f32,
}

impl SpawnedScene {
    pub fn joint_count(&self) -> usize {
        self.robot.joint_count()
    }

    pub fn observation_dim(&self) -> usize {
        crawl_observation_dim(self.joint_count())
    }

    /// Hand the scene over to a [`GymEnv`], which then owns the session.
    pub fn into_env(self) -> GymEnv {
        let n_joints = self.joint_count();
        GymEnv::new(
            self.app,
            BoxSpace::unbounded(crawl_observation_dim(n_joints)),
            BoxSpace::uniform(n_joints, self.action_low, self.action_high),
            Box::new(LastActionApplicator),
            Box::new(RapierBackend),
        )
    }
}

// ---------------------------------------------------------------------------
// SceneBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for a single-robot caterpillar scene.
#[derive(Default)]
pub struct SceneBuilder {
    config: CaterpillarConfig,
    model: Option<RobotModel>,
    gait_mode: GaitMode,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: CaterpillarConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub const fn with_max_episode_steps(mut self, max_steps: u32) -> Self {
        self.config.simulation.max_episode_steps = max_steps;
        self
    }

    /// Use `model` instead of loading the robot named by the config.
    #[must_use]
    pub fn with_robot(mut self, model: RobotModel) -> Self {
        self.model = Some(model);
        self
    }

    /// Add a robot from a URDF XML string.
    pub fn with_robot_urdf(self, urdf_xml: &str) -> Result<Self, UrdfError> {
        let model = caterpillar_urdf::parse_string(urdf_xml)?;
        Ok(self.with_robot(model))
    }

    #[must_use]
    pub const fn with_gait_mode(mut self, mode: GaitMode) -> Self {
        self.gait_mode = mode;
        self
    }

    /// Build the app, open its physics session and spawn the robot.
    pub fn build(self) -> Result<SpawnedScene, SceneError> {
        let config = self.config;
        config.validate()?;
        let model = match self.model {
            Some(model) => model,
            None => load_robot(&config.robot)?,
        };

        let mut app = App::new();
        // Configs go in first so the plugins keep them instead of defaults.
        app.insert_resource(config.simulation.clone())
            .insert_resource(config.robot.clone())
            .insert_resource(config.gait.clone())
            .insert_resource(config.motor.clone())
            .insert_resource(config.reward.clone())
            .insert_resource(config.termination.clone())
            .insert_resource(config.action.clone());
        app.add_plugins(CaterpillarSimPlugin)
            .add_plugins(CaterpillarPhysicsPlugin::new(RapierBackend));
        app.insert_resource(self.gait_mode);
        app.finish();
        app.cleanup();

        let world = app.world_mut();
        let robot = spawn_robot(world, &model)?;
        RapierBackend.open(world)?;
        RapierBackend.register_robot(world, &model, &robot)?;
        register_crawl_sensors(world, robot.joint_count());

        info!(
            robot = %model.name,
            joints = robot.joint_count(),
            obs_dim = crawl_observation_dim(robot.joint_count()),
            "scene built"
        );
        Ok(SpawnedScene {
            app,
            model,
            robot,
            action_low: config.action.low,
            action_high: config.action.high,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use caterpillar_core::config::{SimConfig, TerminationConfig};
    use caterpillar_env::episode::Episode;

    #[test]
    fn default_scene_has_nine_joints() {
        let scene = SceneBuilder::new().build().unwrap();
        assert_eq!(scene.joint_count(), 9);
        assert_eq!(scene.observation_dim(), 33);
        assert!(RapierBackend.is_open(scene.app.world()));
        assert!(scene.app.world().get_resource::<Episode>().is_some());
    }

    #[test]
    fn config_values_reach_the_world() {
        let mut config = CaterpillarConfig::default();
        config.termination.penalty = 7.0;
        let scene = SceneBuilder::new()
            .with_config(config)
            .with_max_episode_steps(12)
            .build()
            .unwrap();
        let world = scene.app.world();
        assert_eq!(world.resource::<SimConfig>().max_episode_steps, 12);
        assert!((world.resource::<TerminationConfig>().penalty - 7.0).abs() < f32::EPSILON);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = CaterpillarConfig::default();
        config.simulation.physics_dt = 0.0;
        let result = SceneBuilder::new().with_config(config).build();
        assert!(matches!(result, Err(SceneError::Config(_))));
    }

    #[test]
    fn robot_without_joints_is_rejected() {
        let result = SceneBuilder::new()
            .with_robot_urdf(r#"<robot name="rock"><link name="a"/></robot>"#)
            .unwrap()
            .build();
        assert!(matches!(result, Err(SceneError::Urdf(_))));
    }

    #[test]
    fn into_env_spaces_match_robot() {
        use caterpillar_gym::Environment;
        let env = SceneBuilder::new().build().unwrap().into_env();
        assert_eq!(env.action_space().size(), 9);
        assert_eq!(env.observation_space().size(), 33);
    }
}
