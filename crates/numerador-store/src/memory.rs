//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use numerador_core::{DocumentRecord, NewDocument, SequenceCounter, Snapshot};

use crate::error::{Result, StoreError};
use crate::traits::{InsertResult, Store, StoreStatus};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock;
/// every mutation happens under a single write guard.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Documents indexed by id.
    documents: BTreeMap<i64, DocumentRecord>,

    /// Uniqueness index: (doc_type, number) -> id.
    positions: HashMap<(String, String), i64>,

    /// Counters by type.
    counters: BTreeMap<String, u64>,

    /// Highest id ever handed out; ids are never reused.
    last_id: i64,
}

impl MemoryStoreInner {
    /// Build a fresh state from a snapshot, rejecting duplicates.
    fn from_snapshot(snapshot: &Snapshot, last_id: i64) -> Result<Self> {
        let mut inner = MemoryStoreInner {
            last_id,
            ..Default::default()
        };

        for doc in &snapshot.documents {
            if inner.documents.contains_key(&doc.id) {
                return Err(StoreError::InvalidData(format!(
                    "duplicate document id {}",
                    doc.id
                )));
            }
            let key = (doc.doc_type.clone(), doc.number.clone());
            if inner.positions.contains_key(&key) {
                return Err(StoreError::InvalidData(format!(
                    "duplicate number {} for {}",
                    doc.number, doc.doc_type
                )));
            }
            inner.positions.insert(key, doc.id);
            inner.documents.insert(doc.id, doc.clone());
            inner.last_id = inner.last_id.max(doc.id);
        }

        let mut seen = HashSet::new();
        for counter in &snapshot.counters {
            if !seen.insert(counter.doc_type.as_str()) {
                return Err(StoreError::InvalidData(format!(
                    "duplicate counter for {}",
                    counter.doc_type
                )));
            }
            inner
                .counters
                .insert(counter.doc_type.clone(), counter.last_value);
        }

        Ok(inner)
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn allocate(&self, doc_type: &str) -> Result<u64> {
        if doc_type.is_empty() {
            return Err(StoreError::InvalidData("empty document type".into()));
        }

        let mut inner = self.write()?;
        let counter = inner.counters.entry(doc_type.to_string()).or_insert(0);
        *counter = counter
            .checked_add(1)
            .ok_or_else(|| StoreError::InvalidData(format!("counter overflow for {}", doc_type)))?;
        Ok(*counter)
    }

    async fn current(&self, doc_type: &str) -> Result<Option<u64>> {
        let inner = self.read()?;
        Ok(inner.counters.get(doc_type).copied())
    }

    async fn list_counters(&self) -> Result<Vec<SequenceCounter>> {
        let inner = self.read()?;
        Ok(inner
            .counters
            .iter()
            .map(|(t, v)| SequenceCounter::new(t.clone(), *v))
            .collect())
    }

    async fn insert_document(&self, doc: &NewDocument) -> Result<InsertResult> {
        let mut inner = self.write()?;

        let key = (doc.doc_type.clone(), doc.number.clone());
        if let Some(&existing) = inner.positions.get(&key) {
            return Ok(InsertResult::Conflict { existing });
        }

        inner.last_id += 1;
        let record = doc.clone().into_record(inner.last_id);
        inner.positions.insert(key, record.id);
        inner.documents.insert(record.id, record.clone());

        Ok(InsertResult::Inserted(record))
    }

    async fn get_document(&self, id: i64) -> Result<Option<DocumentRecord>> {
        let inner = self.read()?;
        Ok(inner.documents.get(&id).cloned())
    }

    async fn list_documents(&self, doc_type: Option<&str>) -> Result<Vec<DocumentRecord>> {
        let inner = self.read()?;
        Ok(inner
            .documents
            .values()
            .rev()
            .filter(|d| doc_type.map_or(true, |t| d.doc_type == t))
            .cloned()
            .collect())
    }

    async fn document_types(&self) -> Result<Vec<String>> {
        let inner = self.read()?;
        let mut types: Vec<String> = inner
            .documents
            .values()
            .map(|d| d.doc_type.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        types.sort();
        Ok(types)
    }

    async fn snapshot(&self) -> Result<Snapshot> {
        let inner = self.read()?;
        let documents = inner.documents.values().cloned().collect();
        let counters = inner
            .counters
            .iter()
            .map(|(t, v)| SequenceCounter::new(t.clone(), *v))
            .collect();
        Ok(Snapshot::new(documents, counters))
    }

    async fn replace_all(&self, snapshot: &Snapshot) -> Result<()> {
        let mut inner = self.write()?;
        // Build the replacement first; the live state is swapped only if
        // every row was accepted.
        let replacement = MemoryStoreInner::from_snapshot(snapshot, inner.last_id)?;
        *inner = replacement;
        Ok(())
    }

    async fn status(&self) -> Result<StoreStatus> {
        let inner = self.read()?;
        Ok(StoreStatus {
            documents: inner.documents.len() as u64,
            counters: inner.counters.len() as u64,
        })
    }
}
