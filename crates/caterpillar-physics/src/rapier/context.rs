//! The rapier world of one session, held as a single bevy resource.

use std::collections::HashMap;

use bevy::prelude::{Entity, Quat, Resource, Vec3};
use caterpillar_core::components::{BaseState, JointState};
use caterpillar_core::config::SimConfig;
use rapier3d::prelude::{
    CCDSolver, ColliderSet, DefaultBroadPhase, ImpulseJointHandle, ImpulseJointSet,
    IntegrationParameters, IslandManager, JointAxis, MultibodyJointSet, NarrowPhase,
    PhysicsPipeline, RigidBodyHandle, RigidBodySet,
};

// ---------------------------------------------------------------------------
// JointInfo
// ---------------------------------------------------------------------------

/// What the motor and state readers need to know about a joint.
pub struct JointInfo {
    pub parent_body: RigidBodyHandle,
    pub child_body: RigidBodyHandle,
    /// Joint axis in the parent link frame (unit direction).
    pub axis: Vec3,
    pub is_prismatic: bool,
}

impl JointInfo {
    const fn motor_axis(&self) -> JointAxis {
        if self.is_prismatic {
            JointAxis::LinX
        } else {
            JointAxis::AngX
        }
    }
}

// ---------------------------------------------------------------------------
// RapierContext
// ---------------------------------------------------------------------------

/// One open physics session.
///
/// The pipeline borrows every set mutably in the same call, hence one
/// resource for all of them.
#[derive(Resource)]
pub struct RapierContext {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,

    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub ccd_solver: CCDSolver,

    pub integration_parameters: IntegrationParameters,
    pub gravity: Vec3,
    /// Number of physics substeps per environment step.
    pub substeps: usize,

    // ECS entity and link name lookups.
    pub joint_handles: HashMap<Entity, ImpulseJointHandle>,
    pub joint_info: HashMap<Entity, JointInfo>,
    /// Link name -> body.
    pub body_handles: HashMap<String, RigidBodyHandle>,
    /// Body of the root link, whose pose is the robot's base pose.
    pub base_body: Option<RigidBodyHandle>,

    /// Poses captured after spawning; every reset returns here.
    pub initial_poses: HashMap<RigidBodyHandle, (Vec3, Quat)>,
}

impl RapierContext {
    /// An empty world stepping at `dt`, `substeps` times per environment step.
    pub fn new(gravity: Vec3, dt: f32, substeps: usize) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = dt;

        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            ccd_solver: CCDSolver::new(),
            integration_parameters,
            gravity,
            substeps: substeps.max(1),
            joint_handles: HashMap::new(),
            joint_info: HashMap::new(),
            body_handles: HashMap::new(),
            base_body: None,
            initial_poses: HashMap::new(),
        }
    }

    /// Session configured from [`SimConfig`].
    pub fn from_config(config: &SimConfig) -> Self {
        let gravity = Vec3::new(config.gravity[0], config.gravity[1], config.gravity[2]);
        #[allow(clippy::cast_possible_truncation)]
        let dt = config.physics_dt as f32;
        Self::new(gravity, dt, config.substeps())
    }

    /// Store current body poses as the state restored by [`reset_to_initial`](Self::reset_to_initial).
    pub fn snapshot_initial_state(&mut self) {
        self.initial_poses.clear();
        for &handle in self.body_handles.values() {
            if let Some(body) = self.rigid_body_set.get(handle) {
                let pose = body.position();
                self.initial_poses
                    .insert(handle, (pose.translation, pose.rotation));
            }
        }
    }

    /// Restore every body to its snapshot pose with zero velocity and
    /// relax every joint motor to a zero target.
    pub fn reset_to_initial(&mut self) {
        for (&handle, &(translation, rotation)) in &self.initial_poses {
            if let Some(body) = self.rigid_body_set.get_mut(handle) {
                body.set_translation(translation, true);
                body.set_rotation(rotation, true);
                body.set_linvel(Vec3::ZERO, true);
                body.set_angvel(Vec3::ZERO, true);
                body.reset_forces(true);
                body.reset_torques(true);
            }
        }
        for (entity, &handle) in &self.joint_handles {
            let Some(info) = self.joint_info.get(entity) else {
                continue;
            };
            if let Some(joint) = self.impulse_joint_set.get_mut(handle, true) {
                joint.data.set_motor(info.motor_axis(), 0.0, 0.0, 0.0, 0.0);
                joint.data.set_motor_max_force(info.motor_axis(), 0.0);
            }
        }
    }

    /// Drive one joint toward `target` with a PD motor capped at `max_force`.
    pub fn set_joint_target(
        &mut self,
        entity: Entity,
        target: f32,
        max_force: f32,
        stiffness: f32,
        damping: f32,
    ) {
        let Some(&handle) = self.joint_handles.get(&entity) else {
            return;
        };
        let Some(info) = self.joint_info.get(&entity) else {
            return;
        };
        let axis = info.motor_axis();
        if let Some(joint) = self.impulse_joint_set.get_mut(handle, true) {
            joint.data.set_motor(axis, target, 0.0, stiffness, damping);
            joint.data.set_motor_max_force(axis, max_force);
        }
    }

    /// Advance the world by one substep of `integration_parameters.dt`.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }

    /// Run every substep of one environment step.
    pub fn step_substeps(&mut self) {
        for _ in 0..self.substeps {
            self.step();
        }
    }

    /// Pose and velocity of the root link.
    pub fn base_state(&self) -> Option<BaseState> {
        let body = self.rigid_body_set.get(self.base_body?)?;
        let pose = body.position();
        let linvel = body.linvel();
        let angvel = body.angvel();
        Some(BaseState {
            position: pose.translation,
            orientation: pose.rotation,
            linear_velocity: Vec3::new(linvel.x, linvel.y, linvel.z),
            angular_velocity: Vec3::new(angvel.x, angvel.y, angvel.z),
        })
    }

    /// Angle and rate of one joint, measured from its two bodies.
    pub fn joint_state(&self, entity: Entity) -> Option<JointState> {
        let info = self.joint_info.get(&entity)?;
        let parent_body = self.rigid_body_set.get(info.parent_body)?;
        let child_body = self.rigid_body_set.get(info.child_body)?;
        let parent_rot = parent_body.position().rotation;
        let world_axis = parent_rot * info.axis;

        if info.is_prismatic {
            let relative_pos = child_body.position().translation - parent_body.position().translation;
            let relative_vel = child_body.linvel() - parent_body.linvel();
            return Some(JointState {
                position: relative_pos.dot(world_axis),
                velocity: relative_vel.dot(world_axis),
            });
        }

        // Angle about the axis from the relative rotation's quaternion.
        let relative_rotation = parent_rot.inverse() * child_body.position().rotation;
        let sin_half = Vec3::new(
            relative_rotation.x,
            relative_rotation.y,
            relative_rotation.z,
        );
        let position = 2.0 * f32::atan2(sin_half.dot(info.axis), relative_rotation.w);
        let relative_angvel = child_body.angvel() - parent_body.angvel();
        Some(JointState {
            position,
            velocity: relative_angvel.dot(world_axis),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rapier3d::prelude::RigidBodyBuilder;

    #[test]
    fn from_config_uses_physics_dt_and_gravity() {
        let context = RapierContext::from_config(&SimConfig::default());
        assert!((context.integration_parameters.dt - 1.0 / 240.0).abs() < 1e-7);
        assert!((context.gravity.z + 9.81).abs() < f32::EPSILON);
        assert_eq!(context.substeps, 1);
    }

    #[test]
    fn base_state_requires_base_body() {
        let context = RapierContext::new(Vec3::ZERO, 0.01, 1);
        assert!(context.base_state().is_none());
    }

    #[test]
    fn free_fall_under_gravity() {
        let mut context = RapierContext::new(Vec3::new(0.0, 0.0, -9.81), 1.0 / 240.0, 1);
        let handle = context.rigid_body_set.insert(
            RigidBodyBuilder::dynamic()
                .translation(Vec3::new(0.0, 0.0, 1.0))
                .can_sleep(false)
                .build(),
        );
        context.body_handles.insert("ball".into(), handle);
        context.base_body = Some(handle);
        context.snapshot_initial_state();

        for _ in 0..24 {
            context.step();
        }
        let falling = context.base_state().unwrap();
        assert!(falling.position.z < 1.0);
        assert!(falling.linear_velocity.z < 0.0);

        context.reset_to_initial();
        let reset = context.base_state().unwrap();
        assert_eq!(reset.position, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(reset.linear_velocity, Vec3::ZERO);
        assert_eq!(reset.orientation, Quat::IDENTITY);
    }
}
