//! Error types for pact-types

use thiserror::Error;

/// Errors raised while encoding, decoding or verifying Pact data
#[derive(Debug, Error)]
pub enum TypesError {
    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid base64url input
    #[error("Invalid base64: {0}")]
    Base64(String),

    /// Recomputed command hash differs from the declared one
    #[error("Hash mismatch: expected {expected}, computed {actual}")]
    HashMismatch {
        /// Hash the data claimed to have
        expected: String,
        /// Hash computed from the data
        actual: String,
    },

    /// A value did not have the expected shape
    #[error("Malformed value: {0}")]
    MalformedValue(String),
}

/// Result alias for pact-types operations
pub type TypesResult<T> = Result<T, TypesError>;

impl From<serde_json::Error> for TypesError {
    fn from(e: serde_json::Error) -> Self {
        TypesError::Serialization(e.to_string())
    }
}

impl From<base64::DecodeError> for TypesError {
    fn from(e: base64::DecodeError) -> Self {
        TypesError::Base64(e.to_string())
    }
}
