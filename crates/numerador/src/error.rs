//! Error types for the registry, backup and desk layers.

use numerador_core::ValidationError;
use numerador_store::StoreError;
use thiserror::Error;

/// Errors that can occur while reading or writing backup CSV files.
#[derive(Debug, Error)]
pub enum BackupError {
    /// Malformed CSV or a field that does not fit its column type.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Header row does not match the expected columns.
    #[error("unexpected header in {file}: expected {expected}, found {found}")]
    Header {
        file: &'static str,
        expected: String,
        found: String,
    },
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors that can occur during registry and desk operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Input rejected before touching storage.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Backup encoding or decoding failed.
    #[error("backup error: {0}")]
    Backup(#[from] BackupError),

    /// Missing, wrong or expired credentials.
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// In-process state could not be reached (poisoned session table).
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl RegistryError {
    /// True for failures that leave no trace and may succeed if repeated
    /// later: the store or the session table could not be reached.
    pub fn is_recoverable(&self) -> bool {
        match self {
            RegistryError::Store(e) => e.is_unavailable(),
            RegistryError::Unavailable(_) => true,
            _ => false,
        }
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unreachable_state_is_recoverable() {
        let unavailable = RegistryError::Store(StoreError::Unavailable("lock poisoned".into()));
        assert!(unavailable.is_recoverable());
        assert!(RegistryError::Unavailable("session table poisoned".into()).is_recoverable());

        let rejected = RegistryError::Store(StoreError::InvalidData("duplicate number".into()));
        assert!(!rejected.is_recoverable());
        assert!(!RegistryError::Validation(ValidationError::EmptyDestination).is_recoverable());
        assert!(!RegistryError::Unauthorized("session expired".into()).is_recoverable());
    }
}
