//! Rapier physics step system.

use bevy::prelude::*;

use caterpillar_core::components::{BaseState, JointCommand, JointState};
use caterpillar_core::config::MotorConfig;

use super::context::RapierContext;

/// Apply joint targets, step physics, read back joint and base state.
///
/// Does nothing while no session is open.
#[allow(clippy::needless_pass_by_value)]
pub fn rapier_step_system(
    context: Option<ResMut<RapierContext>>,
    motor: Res<MotorConfig>,
    mut joints: Query<(Entity, &JointCommand, &mut JointState)>,
    mut base: ResMut<BaseState>,
) {
    let Some(mut context) = context else {
        return;
    };

    // 1. Position motors
    for (entity, command, _) in &joints {
        context.set_joint_target(
            entity,
            command.target_position,
            command.max_force,
            motor.stiffness,
            motor.damping,
        );
    }

    // 2. Step physics
    context.step_substeps();

    // 3. Read back
    for (entity, _, mut state) in &mut joints {
        if let Some(measured) = context.joint_state(entity) {
            *state = measured;
        }
    }
    if let Some(measured) = context.base_state() {
        *base = measured;
    }
}

/// Copy the session's current joint and base state into the world.
///
/// Used after a reset, when no step has run yet.
pub fn read_back_state(world: &mut World) {
    let Some(context) = world.remove_resource::<RapierContext>() else {
        return;
    };
    let mut joints = world.query::<(Entity, &mut JointState)>();
    for (entity, mut state) in joints.iter_mut(world) {
        if let Some(measured) = context.joint_state(entity) {
            *state = measured;
        }
    }
    if let Some(measured) = context.base_state() {
        world.insert_resource(measured);
    }
    world.insert_resource(context);
}
