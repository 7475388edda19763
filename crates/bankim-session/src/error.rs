//! Session error types.

use std::time::Duration;

use bankim_types::StorageError;
use thiserror::Error;

/// Errors from the session lifecycle manager and its handlers.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The warning must fire strictly before the timeout.
    #[error("Invalid session timeouts: warning {warning:?} must be shorter than timeout {timeout:?}")]
    InvalidTimeouts { warning: Duration, timeout: Duration },

    /// Clearing persisted state failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A timeout handler reported a failure.
    #[error("Session handler failed: {0}")]
    Handler(String),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
