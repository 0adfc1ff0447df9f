//! Error taxonomy for the simulation core

use thiserror::Error;

use crate::star::StarId;

/// Everything that can go wrong while configuring or stepping a simulation.
///
/// None of these are fatal to a running loop: a tick that fails leaves the
/// live collection untouched and the scheduler simply skips it.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("sandbox seed {index} rejected: {reason}")]
    InvalidSeed { index: usize, reason: String },

    #[error("star {id} cannot take size {size}; sizes must be positive with a finite mass")]
    InvalidSize { id: StarId, size: f64 },

    #[error("stars {a} and {b} share a position without colliding")]
    Degenerate { a: StarId, b: StarId },

    #[error("star {id} would leave the finite domain")]
    NonFinite { id: StarId },

    #[error("no live star with id {0}")]
    UnknownStar(StarId),

    #[error("snapshot i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;
