//! The physics plugin that delegates to a concrete backend.

use bevy::app::{App, Plugin};

use crate::backend::PhysicsBackend;

/// Bevy plugin that wires a [`PhysicsBackend`]'s step system into the app.
///
/// The session itself is opened separately with
/// [`PhysicsBackend::open`] so that a failure surfaces as an error.
pub struct CaterpillarPhysicsPlugin {
    backend: Box<dyn PhysicsBackend>,
}

impl CaterpillarPhysicsPlugin {
    pub fn new(backend: impl PhysicsBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// The name of the active physics backend.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }
}

impl Plugin for CaterpillarPhysicsPlugin {
    fn build(&self, app: &mut App) {
        self.backend.build(app);
    }
}
