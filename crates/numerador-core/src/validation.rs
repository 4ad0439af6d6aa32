//! Input validation for issuance requests.

use crate::error::ValidationError;

/// Check a destination and return it trimmed.
///
/// Whitespace-only destinations are rejected.
pub fn validate_destination(destination: &str) -> Result<&str, ValidationError> {
    let trimmed = destination.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyDestination);
    }
    Ok(trimmed)
}

/// Check that a type key is usable as a counter key.
pub fn validate_document_type(doc_type: &str) -> Result<(), ValidationError> {
    if doc_type.trim().is_empty() {
        return Err(ValidationError::EmptyDocumentType);
    }
    Ok(())
}

/// Check that a type belongs to an allowed set.
pub fn validate_known_type<S: AsRef<str>>(
    doc_type: &str,
    allowed: &[S],
) -> Result<(), ValidationError> {
    validate_document_type(doc_type)?;
    if allowed.iter().any(|t| t.as_ref() == doc_type) {
        Ok(())
    } else {
        Err(ValidationError::UnknownDocumentType(doc_type.to_string()))
    }
}
