use caterpillar_core::error::{CaterpillarError, ConfigError};
use caterpillar_policy::PolicyError;
use thiserror::Error;

/// Errors raised while training.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("Invalid training configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Environment error: {0}")]
    Environment(#[from] CaterpillarError),

    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),
}
