//! Error types for key management.

use keystone_cesr::CesrError;
use keystone_event::EventError;
use thiserror::Error;

/// Errors that can occur while creating, rotating or using keys.
#[derive(Debug, Error)]
pub enum KeeperError {
    /// Material or key error.
    #[error("material error: {0}")]
    Cesr(#[from] CesrError),

    /// Event or threshold error.
    #[error("event error: {0}")]
    Event(#[from] EventError),

    /// New signing keys do not match the prior next-key commitment.
    #[error("pre-rotation commitment violated: {0}")]
    CommitmentViolation(String),

    /// The keeper has already created its inception keys.
    #[error("keeper already incepted")]
    AlreadyIncepted,

    /// The keeper has no keys yet.
    #[error("keeper not incepted")]
    NotIncepted,

    /// No next keys were committed, so the keys cannot rotate.
    #[error("keys are not transferable")]
    NonTransferable,

    /// Invalid counts, indices or parameters.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// A signing key is not part of the group key list.
    #[error("key {0} is not a group member key")]
    NotGroupMember(String),

    /// An external key module failed or broke its contract.
    #[error("external key module: {0}")]
    External(String),

    /// No keeper is registered for the identifier.
    #[error("unknown identifier: {0}")]
    UnknownPrefix(String),

    /// A lock was poisoned by a panicking thread.
    #[error("keeper state lock poisoned")]
    Poisoned,
}

/// Result type for key management operations.
pub type Result<T> = std::result::Result<T, KeeperError>;
