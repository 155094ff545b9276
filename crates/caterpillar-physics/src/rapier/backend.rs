//! [`RapierBackend`]: concrete physics backend using raw `rapier3d`.

use bevy::prelude::*;
use tracing::info;

use caterpillar_core::CaterpillarSet;
use caterpillar_core::config::{RobotConfig, SimConfig};
use caterpillar_core::error::SimError;
use caterpillar_urdf::{RobotModel, SpawnedRobot};

use crate::backend::PhysicsBackend;

use super::bridge::{insert_ground, register_robot};
use super::context::RapierContext;
use super::systems::{rapier_step_system, read_back_state};

/// Raw rapier3d physics backend.
///
/// Registers the physics step system in [`CaterpillarSet::Simulate`] on the
/// `Update` schedule. Gravity and timestep come from [`SimConfig`], ground
/// and link friction from [`RobotConfig`].
pub struct RapierBackend;

impl PhysicsBackend for RapierBackend {
    fn open(&self, world: &mut World) -> Result<(), SimError> {
        if world.contains_resource::<RapierContext>() {
            return Err(SimError::SessionAlreadyOpen);
        }
        let sim = world.get_resource::<SimConfig>().cloned().unwrap_or_default();
        let ground_friction = world
            .get_resource::<RobotConfig>()
            .map_or_else(|| RobotConfig::default().ground_friction, |r| r.ground_friction);

        let mut context = RapierContext::from_config(&sim);
        insert_ground(&mut context, ground_friction);
        info!(
            dt = sim.physics_dt,
            substeps = context.substeps,
            "physics session opened"
        );
        world.insert_resource(context);
        Ok(())
    }

    fn build(&self, app: &mut App) {
        app.add_systems(Update, rapier_step_system.in_set(CaterpillarSet::Simulate));
    }

    fn register_robot(
        &self,
        world: &mut World,
        model: &RobotModel,
        spawned: &SpawnedRobot,
    ) -> Result<(), SimError> {
        let robot = world.get_resource::<RobotConfig>().cloned().unwrap_or_default();
        let mut context = world
            .get_resource_mut::<RapierContext>()
            .ok_or(SimError::SessionClosed)?;
        register_robot(&mut context, model, spawned, &robot)?;
        drop(context);
        read_back_state(world);
        Ok(())
    }

    fn reset(&self, world: &mut World) -> Result<(), SimError> {
        let mut context = world
            .get_resource_mut::<RapierContext>()
            .ok_or(SimError::SessionClosed)?;
        if context.base_body.is_none() {
            return Err(SimError::ResetFailed("no robot registered".into()));
        }
        context.reset_to_initial();
        drop(context);
        read_back_state(world);
        Ok(())
    }

    fn close(&self, world: &mut World) -> bool {
        let closed = world.remove_resource::<RapierContext>().is_some();
        if closed {
            info!("physics session closed");
        }
        closed
    }

    fn is_open(&self, world: &World) -> bool {
        world.contains_resource::<RapierContext>()
    }

    fn name(&self) -> &str {
        "rapier3d"
    }
}
