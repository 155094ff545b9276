//! URDF-to-Rapier bridge: turns a [`RobotModel`] into rigid bodies,
//! colliders and impulse joints, and adds the ground plane.

use std::collections::{HashMap, VecDeque};
use std::f32::consts::FRAC_PI_2;

use bevy::prelude::{EulerRot, Quat, Vec3};
use rapier3d::prelude::{
    Collider, ColliderBuilder, FixedJointBuilder, GenericJoint, JointAxis, MassProperties,
    MotorModel, PrismaticJointBuilder, RevoluteJointBuilder, RigidBody, RigidBodyBuilder,
};
use tracing::{debug, warn};

use caterpillar_core::config::RobotConfig;
use caterpillar_core::error::SimError;
use caterpillar_urdf::types::{Collision, Geometry, JointData, JointType, LinkData, Pose};
use caterpillar_urdf::{RobotModel, SpawnedRobot};

use super::context::{JointInfo, RapierContext};

/// Half thickness of the ground slab; its top face sits at z = 0.
const GROUND_HALF_THICKNESS: f32 = 0.05;
/// Half extent of the ground slab along x and y.
const GROUND_HALF_EXTENT: f32 = 50.0;
/// Radius of the placeholder collider for links without collision geometry.
const FALLBACK_RADIUS: f32 = 0.005;

// ---------------------------------------------------------------------------
// register_robot
// ---------------------------------------------------------------------------

/// Register a robot's links and joints with the rapier session.
///
/// Every link becomes a dynamic body placed at the base pose plus the
/// accumulated joint offsets. Actuated joints get a force-based position
/// motor and are mapped to their ECS entity. The start pose is snapshotted
/// for reset.
pub fn register_robot(
    context: &mut RapierContext,
    model: &RobotModel,
    spawned: &SpawnedRobot,
    robot: &RobotConfig,
) -> Result<(), SimError> {
    let base_position = Vec3::from_array(robot.base_position);
    let base_rotation = rpy_to_quat(robot.base_rpy);

    let root = model
        .links
        .get(&model.root_link)
        .ok_or_else(|| SimError::RobotSetup(format!("root link '{}' missing", model.root_link)))?;
    let root_handle = context
        .rigid_body_set
        .insert(create_link_body(root, base_position, base_rotation, robot));
    insert_link_colliders(context, root, root_handle, robot.link_friction);
    context
        .body_handles
        .insert(model.root_link.clone(), root_handle);
    context.base_body = Some(root_handle);

    // Offsets are expressed in the base frame; joint rpy is not applied to
    // the rest pose.
    let mut link_offset: HashMap<&str, Vec3> = HashMap::new();
    link_offset.insert(model.root_link.as_str(), Vec3::ZERO);

    let mut queue = VecDeque::from([model.root_link.as_str()]);
    while let Some(parent_name) = queue.pop_front() {
        let parent_offset = link_offset[parent_name];
        let parent_handle = context.body_handles[parent_name];

        for joint in model.child_joints(parent_name) {
            if joint.pose.rpy.iter().any(|a| a.abs() > f32::EPSILON) {
                warn!(joint = %joint.name, "joint origin rotation ignored");
            }
            let child = model.links.get(&joint.child).ok_or_else(|| {
                SimError::RobotSetup(format!(
                    "joint '{}' references missing link '{}'",
                    joint.name, joint.child
                ))
            })?;

            let anchor = Vec3::from_array(joint.pose.xyz);
            let child_offset = parent_offset + anchor;
            link_offset.insert(joint.child.as_str(), child_offset);

            let child_handle = context.rigid_body_set.insert(create_link_body(
                child,
                base_position + base_rotation * child_offset,
                base_rotation,
                robot,
            ));
            insert_link_colliders(context, child, child_handle, robot.link_friction);
            context.body_handles.insert(joint.child.clone(), child_handle);

            let rapier_joint = build_rapier_joint(joint, anchor);
            let joint_handle =
                context
                    .impulse_joint_set
                    .insert(parent_handle, child_handle, rapier_joint, true);

            if joint.joint_type.is_actuated() {
                let entity = spawned.joint_entity(&joint.name).ok_or_else(|| {
                    SimError::RobotSetup(format!("joint '{}' has no entity", joint.name))
                })?;
                context.joint_handles.insert(entity, joint_handle);
                context.joint_info.insert(
                    entity,
                    JointInfo {
                        parent_body: parent_handle,
                        child_body: child_handle,
                        axis: Vec3::from_array(joint.axis).normalize_or_zero(),
                        is_prismatic: joint.joint_type == JointType::Prismatic,
                    },
                );
            }

            queue.push_back(joint.child.as_str());
        }
    }

    debug!(
        bodies = context.body_handles.len(),
        joints = context.joint_handles.len(),
        "robot registered"
    );
    context.snapshot_initial_state();
    Ok(())
}

/// Insert a fixed ground slab whose top face is the plane z = 0.
pub fn insert_ground(context: &mut RapierContext, friction: f32) {
    let ground = context.rigid_body_set.insert(
        RigidBodyBuilder::fixed()
            .translation(Vec3::new(0.0, 0.0, -GROUND_HALF_THICKNESS))
            .build(),
    );
    let collider = ColliderBuilder::cuboid(
        GROUND_HALF_EXTENT,
        GROUND_HALF_EXTENT,
        GROUND_HALF_THICKNESS,
    )
    .friction(friction)
    .restitution(0.0)
    .build();
    context
        .collider_set
        .insert_with_parent(collider, ground, &mut context.rigid_body_set);
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// URDF roll-pitch-yaw (fixed axes x, y, z) as a quaternion.
pub fn rpy_to_quat(rpy: [f32; 3]) -> Quat {
    Quat::from_euler(EulerRot::ZYX, rpy[2], rpy[1], rpy[0])
}

fn create_link_body(
    link: &LinkData,
    position: Vec3,
    rotation: Quat,
    robot: &RobotConfig,
) -> RigidBody {
    let mut builder = RigidBodyBuilder::dynamic()
        .translation(position)
        .rotation(rotation.to_scaled_axis())
        .linear_damping(robot.linear_damping)
        .angular_damping(robot.angular_damping)
        .can_sleep(false);

    if let Some(inertial) = &link.inertial {
        builder = builder.additional_mass_properties(MassProperties::new(
            Vec3::from_array(inertial.center.xyz),
            inertial.mass,
            Vec3::from_array(inertial.principal),
        ));
    }

    builder.build()
}

fn insert_link_colliders(
    context: &mut RapierContext,
    link: &LinkData,
    handle: rapier3d::prelude::RigidBodyHandle,
    friction: f32,
) {
    // Mass comes from the inertial block when there is one.
    let density = if link.inertial.is_some() { 0.0 } else { 1000.0 };

    let mut colliders: Vec<Collider> = link
        .collisions
        .iter()
        .filter_map(|collision| build_collider(link, collision))
        .map(|builder| {
            builder
                .friction(friction)
                .restitution(0.0)
                .density(density)
                .build()
        })
        .collect();

    if colliders.is_empty() {
        colliders.push(
            ColliderBuilder::ball(FALLBACK_RADIUS)
                .friction(friction)
                .density(density)
                .build(),
        );
    }

    for collider in colliders {
        context
            .collider_set
            .insert_with_parent(collider, handle, &mut context.rigid_body_set);
    }
}

fn build_collider(link: &LinkData, collision: &Collision) -> Option<ColliderBuilder> {
    // Rapier cylinders and capsules run along y unless stated otherwise;
    // URDF cylinders run along z.
    let (builder, shape_rotation) = match &collision.geometry {
        Geometry::Sphere { radius } => (ColliderBuilder::ball(*radius), Quat::IDENTITY),
        Geometry::Box { size } => (
            ColliderBuilder::cuboid(size[0] / 2.0, size[1] / 2.0, size[2] / 2.0),
            Quat::IDENTITY,
        ),
        Geometry::Cylinder { radius, length } => (
            ColliderBuilder::cylinder(length / 2.0, *radius),
            Quat::from_rotation_x(FRAC_PI_2),
        ),
        Geometry::Capsule { radius, length } => (
            ColliderBuilder::capsule_z(length / 2.0, *radius),
            Quat::IDENTITY,
        ),
        Geometry::Mesh { filename, .. } => {
            warn!(link = %link.name, mesh = %filename, "mesh collision skipped");
            return None;
        }
    };
    let Pose { xyz, rpy } = collision.pose;
    let rotation = rpy_to_quat(rpy) * shape_rotation;
    Some(
        builder
            .translation(Vec3::from_array(xyz))
            .rotation(rotation.to_scaled_axis()),
    )
}

fn build_rapier_joint(joint: &JointData, anchor: Vec3) -> GenericJoint {
    let axis = Vec3::from_array(joint.axis).normalize_or_zero();
    match joint.joint_type {
        JointType::Revolute | JointType::Continuous => {
            let mut rapier_joint: GenericJoint = RevoluteJointBuilder::new(axis)
                .local_anchor1(anchor)
                .contacts_enabled(false)
                .build()
                .into();
            if joint.joint_type == JointType::Revolute
                && let Some(range) = joint.range
            {
                rapier_joint.set_limits(JointAxis::AngX, range);
            }
            rapier_joint.set_motor_model(JointAxis::AngX, MotorModel::ForceBased);
            rapier_joint.set_motor(JointAxis::AngX, 0.0, 0.0, 0.0, 0.0);
            rapier_joint
        }
        JointType::Prismatic => {
            let mut rapier_joint: GenericJoint = PrismaticJointBuilder::new(axis)
                .local_anchor1(anchor)
                .contacts_enabled(false)
                .build()
                .into();
            if let Some(range) = joint.range {
                rapier_joint.set_limits(JointAxis::LinX, range);
            }
            rapier_joint.set_motor_model(JointAxis::LinX, MotorModel::ForceBased);
            rapier_joint.set_motor(JointAxis::LinX, 0.0, 0.0, 0.0, 0.0);
            rapier_joint
        }
        _ => FixedJointBuilder::new()
            .local_anchor1(anchor)
            .contacts_enabled(false)
            .build()
            .into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
