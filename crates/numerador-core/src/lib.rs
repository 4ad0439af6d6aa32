//! # Numerador Core
//!
//! Pure types for the Numerador protocol registry: document records,
//! sequence counters, and the number formatting policy.
//!
//! This crate contains no I/O and no storage. Everything here is a plain
//! value or a pure function over values.
//!
//! ## Key Types
//!
//! - [`DocumentRecord`] - An issued document with its protocol number
//! - [`NewDocument`] - A document about to be inserted (no id yet)
//! - [`SequenceCounter`] - Last issued value for one document type
//! - [`Snapshot`] - Complete image of both tables, used by backup/restore
//! - [`NumberFormat`] - Deterministic `[prefix-]NNN/YYYY` formatting

pub mod error;
pub mod number;
pub mod types;
pub mod validation;

pub use error::ValidationError;
pub use number::NumberFormat;
pub use types::{
    parse_issue_date, DocumentRecord, NewDocument, SequenceCounter, Snapshot,
    DEFAULT_DOCUMENT_TYPES,
};
pub use validation::{validate_destination, validate_document_type, validate_known_type};
