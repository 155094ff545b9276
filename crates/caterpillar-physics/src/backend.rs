//! Engine-agnostic physics backend trait.
//!
//! A backend owns one physics session per world. The session is an explicit
//! resource: opening a second one in the same world is an error, and
//! [`close`](PhysicsBackend::close) releases it.

use bevy::prelude::{App, World};
use caterpillar_core::error::SimError;
use caterpillar_urdf::{RobotModel, SpawnedRobot};

/// A physics engine that can host the caterpillar scene.
pub trait PhysicsBackend: Send + Sync + 'static {
    /// Insert a fresh session into `world`.
    ///
    /// Fails with [`SimError::SessionAlreadyOpen`] if `world` already has one.
    fn open(&self, world: &mut World) -> Result<(), SimError>;

    /// Register the step system in
    /// [`CaterpillarSet::Simulate`](caterpillar_core::CaterpillarSet::Simulate).
    fn build(&self, app: &mut App);

    /// Create bodies and joints for a spawned robot and record its start pose.
    fn register_robot(
        &self,
        world: &mut World,
        model: &RobotModel,
        spawned: &SpawnedRobot,
    ) -> Result<(), SimError>;

    /// Put the robot back at its start pose with zero joint angles and
    /// velocities, then write that state into the world.
    fn reset(&self, world: &mut World) -> Result<(), SimError>;

    /// Release the session. Returns `false` if none was open.
    fn close(&self, world: &mut World) -> bool;

    /// Whether `world` currently holds a session.
    fn is_open(&self, world: &World) -> bool;

    /// Engine name for logs.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxed_backend_can_live_in_a_plugin() {
        fn shareable<T: Send + Sync + 'static>() {}
        shareable::<Box<dyn PhysicsBackend>>();
    }
}
