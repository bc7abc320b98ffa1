//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The store cannot be reached at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// No row carries the given business identifier.
    #[error("row not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The connection mutex was poisoned by a panicking holder.
    #[error("connection lock poisoned")]
    LockPoisoned,

    /// A stored value could not be decoded, such as a non-RFC 3339 timestamp.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl StorageError {
    /// Maps constraint violations to [`StorageError::Conflict`], everything
    /// else to [`StorageError::Database`].
    pub(crate) fn from_write(err: rusqlite::Error, key: &str) -> Self {
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::ConstraintViolation) => {
                StorageError::Conflict(format!("{key}: {err}"))
            }
            _ => StorageError::Database(err),
        }
    }
}
