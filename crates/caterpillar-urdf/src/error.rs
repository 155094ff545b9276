//! Failures while reading, rewriting or spawning a robot description.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum UrdfError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The xacro export to convert is not on disk.
    #[error("no xacro source at {0}")]
    SourceNotFound(PathBuf),

    #[error("cannot rewrite description: {0}")]
    Conversion(String),

    /// urdf-rs rejected the XML.
    #[error("invalid URDF: {0}")]
    Parse(String),

    #[error("no link named {0}")]
    MissingLink(String),

    #[error("no joint named {0}")]
    MissingJoint(String),

    #[error("{0} joints are not supported")]
    UnsupportedJointType(String),

    /// Every link is some joint's child, so the tree has no root.
    #[error("kinematic tree has no root link")]
    NoRootLink,

    #[error("robot {0} has no actuated joints")]
    NoActuatedJoints(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_offending_name() {
        let cases = [
            (UrdfError::Parse("unexpected EOF".into()), "invalid URDF: unexpected EOF"),
            (UrdfError::MissingLink("seg_0".into()), "no link named seg_0"),
            (
                UrdfError::SourceNotFound(PathBuf::from("urdf/caterpillar.xacro")),
                "no xacro source at urdf/caterpillar.xacro",
            ),
            (
                UrdfError::UnsupportedJointType("spherical".into()),
                "spherical joints are not supported",
            ),
            (
                UrdfError::NoActuatedJoints("blob".into()),
                "robot blob has no actuated joints",
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn io_failure_leads_with_the_path() {
        let error = UrdfError::Io {
            path: PathBuf::from("/tmp/caterpillar.urdf"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(error.to_string(), "/tmp/caterpillar.urdf: denied");
    }
}
