//! Store trait: the abstract interface for counters and documents.
//!
//! This trait allows the registry to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use numerador_core::{DocumentRecord, NewDocument, SequenceCounter, Snapshot};

use crate::error::Result;

/// Result of inserting a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertResult {
    /// Document was stored; carries the assigned id.
    Inserted(DocumentRecord),
    /// A document with the same `(type, number)` already exists.
    Conflict {
        /// Id of the existing document.
        existing: i64,
    },
}

/// Row counts reported by [`Store::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStatus {
    pub documents: u64,
    pub counters: u64,
}

/// The Store trait: async interface for the sequence store and the
/// document table.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Atomic allocation**: two concurrent `allocate` calls for the same
///   type never return the same value.
/// - **Conflict reporting**: inserting a taken `(type, number)` returns
///   `Conflict` with the existing id.
/// - **Atomic replace**: `replace_all` installs a snapshot entirely or not
///   at all.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Sequence Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Increment the counter for `doc_type` and return the new value.
    ///
    /// A missing counter counts as 0, so the first allocation returns 1.
    async fn allocate(&self, doc_type: &str) -> Result<u64>;

    /// Current counter value for `doc_type`, without incrementing.
    async fn current(&self, doc_type: &str) -> Result<Option<u64>>;

    /// All counters, ordered by type.
    async fn list_counters(&self) -> Result<Vec<SequenceCounter>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Document Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a numbered document.
    async fn insert_document(&self, doc: &NewDocument) -> Result<InsertResult>;

    /// Get a document by id.
    async fn get_document(&self, id: i64) -> Result<Option<DocumentRecord>>;

    /// List documents newest-first, optionally restricted to one type.
    async fn list_documents(&self, doc_type: Option<&str>) -> Result<Vec<DocumentRecord>>;

    /// Distinct types present in the document table, sorted.
    async fn document_types(&self) -> Result<Vec<String>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Bulk Operations (for backup/restore)
    // ─────────────────────────────────────────────────────────────────────────

    /// Dump both tables: documents by ascending id, counters by type.
    async fn snapshot(&self) -> Result<Snapshot>;

    /// Delete every document and counter and insert the snapshot verbatim.
    ///
    /// If any row fails, the store is left exactly as it was.
    async fn replace_all(&self, snapshot: &Snapshot) -> Result<()>;

    /// Health check with row counts.
    async fn status(&self) -> Result<StoreStatus>;
}
