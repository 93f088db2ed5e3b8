//! Error types for Keystone.

use keystone_cesr::CesrError;
use keystone_event::EventError;
use keystone_keeper::KeeperError;
use thiserror::Error;

/// Errors that can occur in controller and log operations.
#[derive(Debug, Error)]
pub enum KeystoneError {
    /// Material codec error.
    #[error("material error: {0}")]
    Cesr(#[from] CesrError),

    /// Event construction or validation error.
    #[error("event error: {0}")]
    Event(#[from] EventError),

    /// Key management error.
    #[error("keeper error: {0}")]
    Keeper(#[from] KeeperError),

    /// Malformed event stream.
    #[error("invalid stream: {0}")]
    InvalidStream(String),

    /// Invalid operation for the identifier's current state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type for Keystone operations.
pub type Result<T> = std::result::Result<T, KeystoneError>;
