//! Error types for the CESR codec.

use thiserror::Error;

/// Errors raised while converting or constructing CESR material.
///
/// Every variant is fatal to the single conversion that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CesrError {
    #[error("unknown derivation code: {0}")]
    UnknownCode(String),

    #[error("unsupported code {code} for {context}")]
    UnsupportedCode { code: String, context: &'static str },

    #[error("invalid raw size for code {code}: expected {expected}, got {actual}")]
    RawSize {
        code: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid variable size for code {code}: {reason}")]
    VariableSize { code: String, reason: String },

    #[error("need {needed} more characters or bytes to finish framing")]
    Shortage { needed: usize },

    #[error("malformed text: {0}")]
    MalformedText(String),

    #[error("invalid base64url character {0:?}")]
    InvalidBase64(char),

    #[error("non-zero pad or lead bits in material with code {0}")]
    NonZeroPad(String),

    #[error("index {index} out of range for code {code} (max {max})")]
    IndexOutOfRange { code: String, index: u64, max: u64 },

    #[error("invalid ondex for code {code}: {reason}")]
    InvalidOndex { code: String, reason: String },

    #[error("count {count} out of range for counter code {code} (max {max})")]
    CountOutOfRange { code: String, count: u64, max: u64 },

    #[error("invalid hex number: {0}")]
    InvalidNumber(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("key stretch failed: {0}")]
    Stretch(String),
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CesrError>;
