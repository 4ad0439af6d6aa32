//! Error types for Numerador Core.

use thiserror::Error;

/// Validation errors raised before anything touches storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("destination must not be empty")]
    EmptyDestination,

    #[error("document type must not be empty")]
    EmptyDocumentType,

    #[error("unknown document type: {0}")]
    UnknownDocumentType(String),

    #[error("malformed document number: {0}")]
    MalformedNumber(String),
}
