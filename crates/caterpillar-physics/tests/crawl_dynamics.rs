//! Integration test: the segment chain under raw rapier.
//!
//! Builds the default ten-segment chain on the ground plane and checks that:
//! 1. With motors relaxed the body rests on the ground instead of falling through
//! 2. Reset restores the exact start state, every time
//! 3. A position command bends the commanded joint toward its target

use bevy::prelude::*;
use caterpillar_core::CaterpillarCorePlugin;
use caterpillar_core::components::{BaseState, JointCommand, JointIndex, JointState};
use caterpillar_core::config::{MotorConfig, RobotConfig};
use caterpillar_physics::{CaterpillarPhysicsPlugin, PhysicsBackend, RapierBackend};
use caterpillar_urdf::{SpawnedRobot, load_robot, spawn_robot};

fn build_app() -> (App, SpawnedRobot) {
    let mut app = App::new();
    app.add_plugins(CaterpillarCorePlugin);
    app.add_plugins(CaterpillarPhysicsPlugin::new(RapierBackend));

    let model = load_robot(&RobotConfig::default()).unwrap();
    let world = app.world_mut();
    RapierBackend.open(world).unwrap();
    let spawned = spawn_robot(world, &model).unwrap();
    RapierBackend.register_robot(world, &model, &spawned).unwrap();
    (app, spawned)
}

fn joint_positions(app: &mut App) -> Vec<(usize, f32)> {
    let world = app.world_mut();
    let mut query = world.query::<(&JointIndex, &JointState)>();
    let mut positions: Vec<(usize, f32)> = query
        .iter(world)
        .map(|(index, state)| (index.0, state.position))
        .collect();
    positions.sort_by_key(|(index, _)| *index);
    positions
}

#[test]
fn relaxed_chain_rests_on_ground() {
    let (mut app, _) = build_app();
    for _ in 0..480 {
        app.update();
    }
    let base = app.world().resource::<BaseState>();
    assert!(base.is_finite());
    assert!(base.height() > 0.0, "fell through ground: {}", base.height());
    assert!(base.height() < 0.05, "did not settle: {}", base.height());
}

#[test]
fn reset_restores_start_state() {
    let (mut app, _) = build_app();
    let start = *app.world().resource::<BaseState>();
    let start_joints = joint_positions(&mut app);

    for round in 0..2 {
        for _ in 0..100 + round * 50 {
            app.update();
        }
        RapierBackend.reset(app.world_mut()).unwrap();
        let base = *app.world().resource::<BaseState>();
        assert_eq!(base.position, start.position);
        assert_eq!(base.orientation, start.orientation);
        assert_eq!(base.linear_velocity, Vec3::ZERO);
        assert_eq!(joint_positions(&mut app), start_joints);
    }
}

#[test]
fn motor_command_bends_joint() {
    let (mut app, spawned) = build_app();
    let max_force = MotorConfig::default().max_force();
    let head_joint = spawned.joints[0].1;
    app.world_mut()
        .entity_mut(head_joint)
        .insert(JointCommand {
            target_position: 0.5,
            max_force,
        });

    for _ in 0..240 {
        app.update();
    }
    let state = *app.world().get::<JointState>(head_joint).unwrap();
    assert!(state.position > 0.1, "joint barely moved: {}", state.position);
}

#[test]
fn closed_session_stops_stepping() {
    let (mut app, _) = build_app();
    assert!(RapierBackend.close(app.world_mut()));
    let before = *app.world().resource::<BaseState>();
    app.update();
    assert_eq!(*app.world().resource::<BaseState>(), before);
}
