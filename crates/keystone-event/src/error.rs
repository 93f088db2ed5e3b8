//! Error types for SAIDs, thresholds and key events.

use keystone_cesr::CesrError;
use thiserror::Error;

/// Errors raised while building, parsing or validating key events.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("material error: {0}")]
    Cesr(#[from] CesrError),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("expected a JSON object")]
    NotAnObject,

    #[error("missing field {0:?}")]
    MissingField(String),

    #[error("invalid field {field:?}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("invalid version string: {0}")]
    InvalidVersion(String),

    #[error("declared size {declared} does not match serialized size {actual}")]
    SizeMismatch { declared: usize, actual: usize },

    #[error("invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("invalid witness configuration: {0}")]
    InvalidWitnesses(String),

    #[error("invalid prefix: {0}")]
    InvalidPrefix(String),

    #[error("unexpected event type {actual}, expected {expected}")]
    UnexpectedIlk { expected: String, actual: String },

    #[error("pre-rotation commitment violated: {0}")]
    CommitmentViolation(String),

    #[error("sequence violation: expected {expected}, got {actual}")]
    SequenceViolation { expected: u128, actual: u128 },

    #[error("prior event digest mismatch: expected {expected}, got {actual}")]
    PriorMismatch { expected: String, actual: String },

    #[error("self-addressing digest mismatch in field {0:?}")]
    SaidMismatch(String),

    #[error("identifier {0} is not transferable")]
    NonTransferable(String),

    #[error("signature threshold not met: {verified} verified of {provided} provided")]
    ThresholdUnsatisfied { verified: usize, provided: usize },
}

impl From<serde_json::Error> for EventError {
    fn from(e: serde_json::Error) -> Self {
        EventError::Serialization(e.to_string())
    }
}

/// Result type for event operations.
pub type Result<T> = std::result::Result<T, EventError>;
