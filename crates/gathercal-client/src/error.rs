//! Client error types.

use thiserror::Error;

use gathercal_core::{RuleError, TracingError};
use gathercal_server::ServerError;
use gathercal_store::StoreError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A command-line argument was rejected.
    #[error("invalid argument: {0}")]
    Usage(String),

    /// A recurrence rule given on the command line did not parse.
    #[error("unrecognized recurrence rule `{rule}`: {source}")]
    Rule {
        rule: String,
        #[source]
        source: RuleError,
    },

    /// The event store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Expansion or calendar building failed.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// Output could not be serialized.
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("failed to initialize logging: {0}")]
    Tracing(#[from] TracingError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }
}
