// caterpillar-physics: Physics session abstraction for the caterpillar environment.
//
// A `PhysicsBackend` owns the session lifecycle (open, register robot, reset,
// close) and registers its step system in `CaterpillarSet::Simulate`. The
// raw rapier3d implementation lives in `rapier`.

pub mod backend;
pub mod plugin;
pub mod rapier;

pub use backend::PhysicsBackend;
pub use plugin::CaterpillarPhysicsPlugin;
pub use rapier::{RapierBackend, RapierContext};
