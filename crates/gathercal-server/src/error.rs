//! Server error types.

use thiserror::Error;

use gathercal_store::StoreError;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The event store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A fail-fast expansion run stopped at a template.
    #[error("Expansion aborted at template {template_id} after {created} created, {skipped} skipped: {source}")]
    ExpansionAborted {
        template_id: String,
        created: usize,
        skipped: usize,
        #[source]
        source: StoreError,
    },

    /// A week identifier did not parse as `YYYY-Www`.
    #[error("Invalid week: {week_id} (expected YYYY-Www)")]
    InvalidWeek { week_id: String },

    /// A background task ended unexpectedly.
    #[error("Task failed: {message}")]
    Task { message: String },
}

impl ServerError {
    /// Creates an invalid week error.
    pub fn invalid_week(week_id: impl Into<String>) -> Self {
        Self::InvalidWeek {
            week_id: week_id.into(),
        }
    }

    pub fn task(message: impl Into<String>) -> Self {
        Self::Task {
            message: message.into(),
        }
    }

    /// Returns true if retrying the same operation later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            Self::ExpansionAborted { source, .. } => source.is_retryable(),
            Self::InvalidWeek { .. } | Self::Task { .. } => false,
        }
    }
}
