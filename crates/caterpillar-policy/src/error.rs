use std::path::PathBuf;

use thiserror::Error;

/// Errors loading, saving or evaluating a policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed policy artifact: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Policy shape mismatch: expected {expected} values, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("No trained policy found in {0} (run `train` first)")]
    NoArtifact(PathBuf),
}

impl PolicyError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
