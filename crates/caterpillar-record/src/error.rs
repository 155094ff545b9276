use std::path::PathBuf;

use thiserror::Error;

/// Errors writing trajectory logs or charts.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Trajectory serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to encode {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Nothing to plot: trajectory is empty")]
    EmptyTrajectory,

    #[error("Joint {joint} out of range (trajectory has {joints} joints)")]
    JointOutOfRange { joint: usize, joints: usize },
}

impl RecordError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
