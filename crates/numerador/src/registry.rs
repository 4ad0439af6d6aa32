//! The Registry: issues numbered documents and manages their history.
//!
//! Issuance is allocate, format, insert. The counter increment is atomic in
//! the store; if the formatted number is already taken (a restored counter
//! lagging behind restored rows, or an earlier crash between allocation and
//! insert) the value is dropped and a fresh one allocated. Numbers stay
//! unique; gaps are accepted.

use std::path::Path;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};

use numerador_core::{
    validate_destination, validate_document_type, DocumentRecord, NewDocument, Snapshot,
};
use numerador_store::{InsertResult, Store, StoreStatus};

use crate::backup;
use crate::config::RegistryConfig;
use crate::error::Result;

/// The document registry.
///
/// Owns no state besides the store handle and its configuration; counter
/// values are always read from and written to the store.
pub struct Registry<S: Store> {
    /// The storage backend.
    store: Arc<S>,
    /// Configuration.
    config: RegistryConfig,
}

impl<S: Store> Clone for Registry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: Store> Registry<S> {
    /// Create a new registry over a store.
    pub fn new(store: S, config: RegistryConfig) -> Self {
        Self::with_shared(Arc::new(store), config)
    }

    /// Create a registry over a store shared with other components.
    pub fn with_shared(store: Arc<S>, config: RegistryConfig) -> Self {
        Self { store, config }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Issuance
    // ─────────────────────────────────────────────────────────────────────────

    /// Issue the next number for `doc_type` and record the document.
    ///
    /// `issue_date` defaults to today's local date; its year goes into the
    /// number. A blank destination is rejected before anything is written.
    pub async fn issue(
        &self,
        doc_type: &str,
        destination: &str,
        issue_date: Option<NaiveDate>,
    ) -> Result<DocumentRecord> {
        validate_document_type(doc_type)?;
        let destination = validate_destination(destination)?;
        let issue_date = issue_date.unwrap_or_else(today);
        let year = issue_date.year();

        loop {
            let value = self.store.allocate(doc_type).await?;
            let number = self.config.number_format.format(value, doc_type, year);
            let doc = NewDocument::new(doc_type, number, destination, issue_date);

            match self.store.insert_document(&doc).await? {
                InsertResult::Inserted(record) => {
                    tracing::info!(
                        "issued {} {} to {} (document #{})",
                        record.doc_type,
                        record.number,
                        record.destination,
                        record.id
                    );
                    return Ok(record);
                }
                InsertResult::Conflict { existing } => {
                    tracing::warn!(
                        "{} {} already taken by document #{}, allocating again",
                        doc.doc_type,
                        doc.number,
                        existing
                    );
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// All documents newest-first, optionally only those of one type.
    pub async fn query(&self, filter_type: Option<&str>) -> Result<Vec<DocumentRecord>> {
        Ok(self.store.list_documents(filter_type).await?)
    }

    /// Get a document by id.
    pub async fn get(&self, id: i64) -> Result<Option<DocumentRecord>> {
        Ok(self.store.get_document(id).await?)
    }

    /// Types that appear in the history, sorted. Feeds history filters.
    pub async fn document_types_in_use(&self) -> Result<Vec<String>> {
        Ok(self.store.document_types().await?)
    }

    /// Last value issued for a type, if any.
    pub async fn last_value(&self, doc_type: &str) -> Result<Option<u64>> {
        Ok(self.store.current(doc_type).await?)
    }

    /// Health check: reaches the store and reports row counts.
    pub async fn status(&self) -> Result<StoreStatus> {
        Ok(self.store.status().await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Backup / Restore
    // ─────────────────────────────────────────────────────────────────────────

    /// Complete snapshot of documents and counters.
    pub async fn backup_all(&self) -> Result<Snapshot> {
        let snapshot = self.store.snapshot().await?;
        tracing::info!(
            "backup taken: {} documents, {} counters",
            snapshot.documents.len(),
            snapshot.counters.len()
        );
        Ok(snapshot)
    }

    /// Replace everything with the snapshot, verbatim.
    ///
    /// Counters are installed as given, not recomputed from the documents,
    /// so issuance resumes from the restored counter values. On failure the
    /// previous contents remain.
    pub async fn restore(&self, snapshot: &Snapshot) -> Result<()> {
        if let Err(e) = self.store.replace_all(snapshot).await {
            tracing::warn!("restore aborted, previous contents kept: {}", e);
            return Err(e.into());
        }
        tracing::info!(
            "restored {} documents, {} counters",
            snapshot.documents.len(),
            snapshot.counters.len()
        );
        Ok(())
    }

    /// Take a snapshot and write it as `documents.csv` and `counters.csv`
    /// under `dir`.
    pub async fn backup_to_dir(&self, dir: impl AsRef<Path>) -> Result<Snapshot> {
        let snapshot = self.backup_all().await?;
        backup::write_dir(dir, &snapshot)?;
        Ok(snapshot)
    }

    /// Read a backup directory and restore it.
    ///
    /// A missing file or malformed CSV fails before the store is touched.
    pub async fn restore_from_dir(&self, dir: impl AsRef<Path>) -> Result<()> {
        let snapshot = backup::read_dir(dir)?;
        self.restore(&snapshot).await
    }
}

/// Today's date in local time.
fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
