//! Robot description loading for the caterpillar environment.
//!
//! Parses URDF files into a [`RobotModel`], rewrites xacro exports into
//! loadable URDF, generates the built-in segment chain and spawns one ECS
//! entity per actuated joint.

pub mod chain;
pub mod error;
pub mod parser;
pub mod spawner;
pub mod types;
pub mod xacro;

use caterpillar_core::config::RobotConfig;
use tracing::info;

pub use error::UrdfError;
pub use parser::{parse_file, parse_string};
pub use spawner::{JointName, SpawnedRobot, spawn_robot};
pub use types::RobotModel;

/// Load the robot a [`RobotConfig`] points at.
///
/// Parses `urdf_path` when set, otherwise generates the segment chain from
/// `body`.
pub fn load_robot(config: &RobotConfig) -> Result<RobotModel, UrdfError> {
    let model = match &config.urdf_path {
        Some(path) => parse_file(path)?,
        None => parse_string(&chain::segment_chain_urdf(&config.body))?,
    };
    info!(
        robot = %model.name,
        links = model.links.len(),
        dof = model.dof(),
        "loaded robot model"
    );
    Ok(model)
}

pub mod prelude {
    pub use crate::{
        RobotModel, UrdfError,
        chain::segment_chain_urdf,
        load_robot,
        parser::{parse_file, parse_string},
        spawner::{JointName, SpawnedRobot, spawn_robot},
        types::{Geometry, JointData, JointType, LinkData},
        xacro::{XacroRewriter, convert_file},
    };
}
