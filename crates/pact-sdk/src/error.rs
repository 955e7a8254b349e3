//! SDK error types

use pact_types::{CommandResponse, TypesError};
use thiserror::Error;

/// SDK error type
#[derive(Debug, Error)]
pub enum SdkError {
    /// Transport/network error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Unexpected HTTP status from the node
    #[error("HTTP {status}: {body}")]
    Http {
        /// Status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The node answered with a body that does not have the expected shape
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Remote execution failed
    #[error("Execution failed: {}", failure_message(.0))]
    Execution(Box<CommandResponse>),

    /// Content hash does not match the declared request key
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        /// Declared request key
        expected: String,
        /// Recomputed hash
        actual: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid client settings
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A mempool operation was attempted without a P2P host
    #[error("No P2P host configured for this network")]
    MissingP2pHost,

    /// Chain set requested before discovery ran
    #[error("Client not initialized: call initialize() first")]
    NotInitialized,
}

fn failure_message(response: &CommandResponse) -> &str {
    response
        .result
        .error
        .as_ref()
        .map(|e| e.message.as_str())
        .unwrap_or("unknown error")
}

impl From<serde_json::Error> for SdkError {
    fn from(e: serde_json::Error) -> Self {
        SdkError::Serialization(e.to_string())
    }
}

impl From<TypesError> for SdkError {
    fn from(e: TypesError) -> Self {
        match e {
            TypesError::HashMismatch { expected, actual } => {
                SdkError::HashMismatch { expected, actual }
            }
            TypesError::Serialization(msg) => SdkError::Serialization(msg),
            other => SdkError::Protocol(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_message() {
        let response = CommandResponse::synthesized_failure("boom", "info");
        let err = SdkError::Execution(Box::new(response));
        assert_eq!(err.to_string(), "Execution failed: boom");
    }

    #[test]
    fn test_from_types_error() {
        let err: SdkError = TypesError::HashMismatch {
            expected: "a".to_string(),
            actual: "b".to_string(),
        }
        .into();
        assert!(matches!(err, SdkError::HashMismatch { .. }));

        let err: SdkError = TypesError::MalformedValue("x".to_string()).into();
        assert!(matches!(err, SdkError::Protocol(_)));
    }
}
