//! Policies and policy artifacts for the caterpillar environment.
//!
//! - [`policies`]: the neutral policy
//! - [`linear`]: the trainable [`LinearPolicy`]
//! - [`checkpoint`]: JSON artifacts, checkpoint naming and artifact lookup

pub mod checkpoint;
pub mod error;
pub mod linear;
pub mod policies;

pub use checkpoint::{PolicyArtifact, checkpoint_path, find_latest_checkpoint, resolve_policy_artifact};
pub use error::PolicyError;
pub use linear::LinearPolicy;
pub use policies::NeutralPolicy;

pub mod prelude {
    pub use crate::{
        LinearPolicy, PolicyArtifact, PolicyError,
        checkpoint::{checkpoint_path, find_latest_checkpoint, resolve_policy_artifact},
        policies::NeutralPolicy,
    };
}
