//! Bevy entity spawning from a parsed [`RobotModel`].
//!
//! Creates one entity per actuated joint with [`JointName`], [`JointIndex`],
//! [`JointCommand`] and [`JointState`] components.

use bevy::prelude::*;
use caterpillar_core::components::{JointCommand, JointIndex, JointState};

use crate::error::UrdfError;
use crate::types::RobotModel;

// ---------------------------------------------------------------------------
// JointName component
// ---------------------------------------------------------------------------

/// Component storing the URDF joint name on a joint entity.
#[derive(Component, Clone, Debug, PartialEq, Eq)]
pub struct JointName(pub String);

// ---------------------------------------------------------------------------
// SpawnedRobot
// ---------------------------------------------------------------------------

/// Joint entities of a spawned robot, head to tail.
#[derive(Debug, Clone)]
pub struct SpawnedRobot {
    /// Robot name from the URDF.
    pub name: String,
    /// `(joint name, entity)` in joint-index order.
    pub joints: Vec<(String, Entity)>,
}

impl SpawnedRobot {
    /// Get the entity for a joint by name.
    pub fn joint_entity(&self, name: &str) -> Option<Entity> {
        self.joints
            .iter()
            .find(|(joint, _)| joint == name)
            .map(|(_, entity)| *entity)
    }

    /// Number of spawned joint entities.
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Entities in joint-index order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.joints.iter().map(|(_, entity)| *entity)
    }
}

// ---------------------------------------------------------------------------
// spawn_robot
// ---------------------------------------------------------------------------

/// Spawn one entity per actuated joint, numbered head to tail.
///
/// Fails with [`UrdfError::NoActuatedJoints`] when there is nothing to drive.
pub fn spawn_robot(world: &mut World, model: &RobotModel) -> Result<SpawnedRobot, UrdfError> {
    let chain = model.actuated_chain();
    if chain.is_empty() {
        return Err(UrdfError::NoActuatedJoints(model.name.clone()));
    }

    let joints = chain
        .into_iter()
        .enumerate()
        .map(|(index, joint)| {
            let entity = world
                .spawn((
                    JointName(joint.name.clone()),
                    JointIndex(index),
                    JointCommand::default(),
                    JointState::default(),
                ))
                .id();
            (joint.name.clone(), entity)
        })
        .collect();

    Ok(SpawnedRobot {
        name: model.name.clone(),
        joints,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::segment_chain_urdf;
    use crate::parser::parse_string;
    use caterpillar_core::config::BodyConfig;

    const FIXED_ONLY_URDF: &str = r#"
        <robot name="brick">
            <link name="a"/>
            <link name="b"/>
            <joint name="weld" type="fixed">
                <parent link="a"/>
                <child link="b"/>
            </joint>
        </robot>
    "#;

    fn chain_model() -> RobotModel {
        parse_string(&segment_chain_urdf(&BodyConfig::default())).unwrap()
    }

    #[test]
    fn spawn_creates_one_entity_per_actuated_joint() {
        let mut world = World::new();
        let spawned = spawn_robot(&mut world, &chain_model()).unwrap();
        assert_eq!(spawned.name, "caterpillar");
        assert_eq!(spawned.joint_count(), 9);
    }

    #[test]
    fn indices_follow_chain_order() {
        let mut world = World::new();
        let spawned = spawn_robot(&mut world, &chain_model()).unwrap();
        for (i, entity) in spawned.entities().enumerate() {
            assert_eq!(world.get::<JointIndex>(entity), Some(&JointIndex(i)));
            assert_eq!(
                world.get::<JointName>(entity).unwrap().0,
                format!("joint_{i}")
            );
        }
    }

    #[test]
    fn spawned_joints_start_at_rest() {
        let mut world = World::new();
        let spawned = spawn_robot(&mut world, &chain_model()).unwrap();
        let entity = spawned.joint_entity("joint_4").unwrap();
        assert_eq!(world.get::<JointState>(entity), Some(&JointState::default()));
        assert_eq!(
            world.get::<JointCommand>(entity),
            Some(&JointCommand::default())
        );
        assert!(spawned.joint_entity("missing").is_none());
    }

    #[test]
    fn robot_without_actuated_joints_is_rejected() {
        let mut world = World::new();
        let model = parse_string(FIXED_ONLY_URDF).unwrap();
        assert!(matches!(
            spawn_robot(&mut world, &model),
            Err(UrdfError::NoActuatedJoints(name)) if name == "brick"
        ));
    }
}
