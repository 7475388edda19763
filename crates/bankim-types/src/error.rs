//! Error types shared across bankim crates.

use thiserror::Error;

/// Result type alias for persisted-storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Errors raised by a [`KeyValueStore`](crate::KeyValueStore) backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),
}
