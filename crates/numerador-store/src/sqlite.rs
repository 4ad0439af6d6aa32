//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for Numerador. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};

use numerador_core::{DocumentRecord, NewDocument, SequenceCounter, Snapshot};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{InsertResult, Store, StoreStatus};

/// Connection options for [`SqliteStore`].
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    /// How long a statement waits for a lock held by another connection.
    pub busy_timeout: Duration,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime. Several `SqliteStore` handles (or
/// processes) may share one database file; SQLite's own locking keeps
/// allocation and restore atomic across them.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, &SqliteOptions::default())
    }

    /// Open a SQLite database with explicit options.
    pub fn open_with_options(path: impl AsRef<Path>, options: &SqliteOptions) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn, options)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, &SqliteOptions::default())
    }

    fn from_connection(mut conn: Connection, options: &SqliteOptions) -> Result<Self> {
        conn.busy_timeout(options.busy_timeout)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Unavailable(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("spawn_blocking failed: {}", e)))?
    }
}

// Helper to convert a row to DocumentRecord
fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentRecord> {
    Ok(DocumentRecord {
        id: row.get("id")?,
        doc_type: row.get("doc_type")?,
        number: row.get("number")?,
        destination: row.get("destination")?,
        issue_date: row.get("issue_date")?,
        year: row.get("year")?,
    })
}

// Helper to convert a row to SequenceCounter
fn row_to_counter(row: &rusqlite::Row<'_>) -> rusqlite::Result<SequenceCounter> {
    Ok(SequenceCounter {
        doc_type: row.get("doc_type")?,
        last_value: column_u64(row, 1)?,
    })
}

fn column_u64(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let value: i64 = row.get(idx)?;
    u64::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, value))
}

fn to_sql_value(value: u64) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("counter value {} out of range", value)))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// A snapshot row the schema refuses is bad input, not a storage fault.
fn reject_row(err: rusqlite::Error, row: impl std::fmt::Display) -> StoreError {
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => {
            StoreError::InvalidData(format!("rejected {}: {}", row, err))
        }
        _ => StoreError::Database(err),
    }
}

const SELECT_DOCUMENT: &str =
    "SELECT id, doc_type, number, destination, issue_date, year FROM documents";

#[async_trait]
impl Store for SqliteStore {
    async fn allocate(&self, doc_type: &str) -> Result<u64> {
        if doc_type.is_empty() {
            return Err(StoreError::InvalidData("empty document type".into()));
        }
        let doc_type = doc_type.to_string();

        self.blocking(move |conn| {
            // Single statement: the increment and the read happen under one
            // write lock, so concurrent callers never see the same value.
            let value: i64 = conn.query_row(
                "INSERT INTO sequence_counters (doc_type, last_value) VALUES (?1, 1)
                 ON CONFLICT(doc_type) DO UPDATE SET last_value = last_value + 1
                 RETURNING last_value",
                params![doc_type],
                |row| row.get(0),
            )?;

            let value = u64::try_from(value).map_err(|_| {
                StoreError::InvalidData(format!("negative counter for {}: {}", doc_type, value))
            })?;
            tracing::debug!("allocated {} for {}", value, doc_type);
            Ok(value)
        })
        .await
    }

    async fn current(&self, doc_type: &str) -> Result<Option<u64>> {
        let doc_type = doc_type.to_string();

        self.blocking(move |conn| {
            conn.query_row(
                "SELECT doc_type, last_value FROM sequence_counters WHERE doc_type = ?1",
                params![doc_type],
                row_to_counter,
            )
            .optional()
            .map(|c| c.map(|c| c.last_value))
            .map_err(StoreError::from)
        })
        .await
    }

    async fn list_counters(&self) -> Result<Vec<SequenceCounter>> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare(
                "SELECT doc_type, last_value FROM sequence_counters ORDER BY doc_type",
            )?;
            let counters = stmt
                .query_map([], row_to_counter)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(counters)
        })
        .await
    }

    async fn insert_document(&self, doc: &NewDocument) -> Result<InsertResult> {
        let doc = doc.clone();

        self.blocking(move |conn| {
            let inserted = conn.execute(
                "INSERT INTO documents (doc_type, number, destination, issue_date, year)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    doc.doc_type,
                    doc.number,
                    doc.destination,
                    doc.issue_date,
                    doc.year(),
                ],
            );

            match inserted {
                Ok(_) => {
                    let id = conn.last_insert_rowid();
                    Ok(InsertResult::Inserted(doc.into_record(id)))
                }
                Err(e) if is_unique_violation(&e) => {
                    let existing: i64 = conn.query_row(
                        "SELECT id FROM documents WHERE doc_type = ?1 AND number = ?2",
                        params![doc.doc_type, doc.number],
                        |row| row.get(0),
                    )?;
                    Ok(InsertResult::Conflict { existing })
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn get_document(&self, id: i64) -> Result<Option<DocumentRecord>> {
        self.blocking(move |conn| {
            conn.query_row(
                &format!("{} WHERE id = ?1", SELECT_DOCUMENT),
                params![id],
                row_to_document,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn list_documents(&self, doc_type: Option<&str>) -> Result<Vec<DocumentRecord>> {
        let doc_type = doc_type.map(str::to_string);

        self.blocking(move |conn| {
            let documents = match doc_type {
                Some(doc_type) => {
                    let mut stmt = conn.prepare(&format!(
                        "{} WHERE doc_type = ?1 ORDER BY id DESC",
                        SELECT_DOCUMENT
                    ))?;
                    let rows = stmt
                        .query_map(params![doc_type], row_to_document)?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    rows
                }
                None => {
                    let mut stmt =
                        conn.prepare(&format!("{} ORDER BY id DESC", SELECT_DOCUMENT))?;
                    let rows = stmt
                        .query_map([], row_to_document)?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    rows
                }
            };
            Ok(documents)
        })
        .await
    }

    async fn document_types(&self) -> Result<Vec<String>> {
        self.blocking(|conn| {
            let mut stmt =
                conn.prepare("SELECT DISTINCT doc_type FROM documents ORDER BY doc_type")?;
            let types = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(types)
        })
        .await
    }

    async fn snapshot(&self) -> Result<Snapshot> {
        self.blocking(|conn| {
            // One read transaction so both tables come from the same state.
            let tx = conn.transaction()?;

            let documents = {
                let mut stmt = tx.prepare(&format!("{} ORDER BY id ASC", SELECT_DOCUMENT))?;
                let rows = stmt
                    .query_map([], row_to_document)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            };

            let counters = {
                let mut stmt = tx.prepare(
                    "SELECT doc_type, last_value FROM sequence_counters ORDER BY doc_type",
                )?;
                let rows = stmt
                    .query_map([], row_to_counter)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            };

            tx.commit()?;
            Ok(Snapshot::new(documents, counters))
        })
        .await
    }

    async fn replace_all(&self, snapshot: &Snapshot) -> Result<()> {
        let snapshot = snapshot.clone();

        self.blocking(move |conn| {
            // Immediate: take the write lock up front so a concurrent
            // allocation cannot slip in between the delete and the inserts.
            // Dropping `tx` on any error rolls everything back.
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            tx.execute("DELETE FROM documents", [])?;
            tx.execute("DELETE FROM sequence_counters", [])?;

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO documents (id, doc_type, number, destination, issue_date, year)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )?;
                for doc in &snapshot.documents {
                    stmt.execute(params![
                        doc.id,
                        doc.doc_type,
                        doc.number,
                        doc.destination,
                        doc.issue_date,
                        doc.year,
                    ])
                    .map_err(|e| {
                        let row = format!("document #{} ({} {})", doc.id, doc.doc_type, doc.number);
                        reject_row(e, row)
                    })?;
                }
            }

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO sequence_counters (doc_type, last_value) VALUES (?1, ?2)",
                )?;
                for counter in &snapshot.counters {
                    stmt.execute(params![counter.doc_type, to_sql_value(counter.last_value)?])
                        .map_err(|e| reject_row(e, format!("counter for {}", counter.doc_type)))?;
                }
            }

            tx.commit()?;
            tracing::info!(
                "replaced store contents: {} documents, {} counters",
                snapshot.documents.len(),
                snapshot.counters.len()
            );
            Ok(())
        })
        .await
    }

    async fn status(&self) -> Result<StoreStatus> {
        self.blocking(|conn| {
            let (documents, counters): (i64, i64) = conn.query_row(
                "SELECT (SELECT COUNT(*) FROM documents), (SELECT COUNT(*) FROM sequence_counters)",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(StoreStatus {
                documents: documents as u64,
                counters: counters as u64,
            })
        })
        .await
    }
}
