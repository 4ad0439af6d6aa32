//! Error types for the store module.

use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The store could not be reached (poisoned lock, failed worker task).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Invalid data in storage or in a snapshot being installed.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),
}

impl StoreError {
    /// True if the store could not be reached right now and nothing was
    /// written: a poisoned lock, a lost worker, or a database file that is
    /// busy, locked or cannot be opened.
    pub fn is_unavailable(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            StoreError::Database(e) => matches!(
                e.sqlite_error_code(),
                Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::CannotOpen)
            ),
            StoreError::InvalidData(_) | StoreError::Migration(_) => false,
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_failure(code: i32) -> StoreError {
        StoreError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(code),
            None,
        ))
    }

    #[test]
    fn test_unavailable_classification() {
        assert!(StoreError::Unavailable("lock poisoned".into()).is_unavailable());
        assert!(sqlite_failure(rusqlite::ffi::SQLITE_BUSY).is_unavailable());
        assert!(sqlite_failure(rusqlite::ffi::SQLITE_LOCKED).is_unavailable());

        assert!(!sqlite_failure(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE).is_unavailable());
        assert!(!StoreError::InvalidData("duplicate".into()).is_unavailable());
        assert!(!StoreError::Migration("unknown version".into()).is_unavailable());
    }
}
