//! The `rapier3d` backend.
//!
//! Each environment step runs the
//! [`PhysicsPipeline`](rapier3d::pipeline::PhysicsPipeline) for the configured
//! number of substeps, then mirrors joint and base state into ECS components.

pub mod backend;
pub mod bridge;
pub mod context;
pub mod systems;

pub use backend::RapierBackend;
pub use context::RapierContext;
