use thiserror::Error;

/// Any error surfaced by the environment interface.
#[derive(Debug, Error)]
pub enum CaterpillarError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("simulation: {0}")]
    Simulation(#[from] SimError),

    #[error("space: {0}")]
    Space(#[from] SpaceError),

    #[error("rejected: {0}")]
    Validation(#[from] ValidationError),
}

/// Problems loading or checking a [`crate::config::CaterpillarConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("physics_dt is {0}, expected a positive step")]
    InvalidPhysicsDt(f64),

    #[error("control_dt is shorter than physics_dt")]
    ControlDtLessThanPhysicsDt,

    #[error("{field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Lifecycle violations and failures while building or resetting the scene.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("this world already owns a physics session")]
    SessionAlreadyOpen,

    #[error("the physics session is closed")]
    SessionClosed,

    #[error("no episode running, reset first")]
    NotReset,

    #[error("episode finished, reset before stepping")]
    EpisodeFinished,

    #[error("reset failed: {0}")]
    ResetFailed(String),

    #[error("cannot build robot: {0}")]
    RobotSetup(String),
}

#[derive(Debug, Error)]
pub enum SpaceError {
    #[error("bounds disagree in length (low has {low}, high has {high})")]
    DimensionMismatch { low: usize, high: usize },

    #[error("bad space: {0}")]
    InvalidDefinition(String),
}

/// Rejections of a single action or observation. `Copy`, so the step path
/// can return them without allocating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("action has {got} values, expected {expected}")]
    ActionDimMismatch { expected: usize, got: usize },

    #[error("action contains NaN")]
    ActionContainsNan,

    #[error("action contains an infinite value")]
    ActionContainsInf,

    #[error("action value {dim} is outside the action space")]
    ActionOutOfBounds { dim: usize },

    #[error("observation has {got} values, expected {expected}")]
    ObservationDimMismatch { expected: usize, got: usize },
}
