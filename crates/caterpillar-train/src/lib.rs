//! Training driver for the caterpillar environment.
//!
//! [`RandomSearchTrainer`] improves a [`LinearPolicy`] by augmented random
//! search: perturb the parameters along random directions, score each
//! direction by a pair of rollouts, and step along the best ones. It only
//! needs the [`Environment`] contract, so it trains against any
//! implementation of it.
//!
//! [`LinearPolicy`]: caterpillar_policy::LinearPolicy
//! [`Environment`]: caterpillar_gym::Environment

pub mod error;
pub mod trainer;

pub use error::TrainError;
pub use trainer::{RandomSearchTrainer, TrainingSummary};
