//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::path::PathBuf;

use chrono::NaiveDate;
use numerador::{Registry, RegistryConfig};
use numerador_core::{DocumentRecord, NewDocument, NumberFormat};
use numerador_store::{MemoryStore, SqliteOptions, SqliteStore};
use tempfile::TempDir;

/// Issue date used by fixture helpers.
pub const FIXTURE_DATE: (i32, u32, u32) = (2025, 6, 15);

/// Build a date, panicking on an impossible one.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date")
}

fn fixture_date() -> NaiveDate {
    let (y, m, d) = FIXTURE_DATE;
    date(y, m, d)
}

/// Stored rows `first..=last` for one type and year, ids equal to values.
pub fn numbered_rows(doc_type: &str, year: i32, first: u64, last: u64) -> Vec<DocumentRecord> {
    let format = NumberFormat::plain();
    (first..=last)
        .map(|value| {
            NewDocument::new(
                doc_type,
                format.format(value, doc_type, year),
                "Fórum",
                date(year, 1, 1),
            )
            .into_record(value as i64)
        })
        .collect()
}

/// A registry over a memory store.
pub struct TestFixture {
    pub registry: Registry<MemoryStore>,
}

impl TestFixture {
    /// Plain `NNN/YYYY` numbering.
    pub fn new() -> Self {
        Self::with_format(NumberFormat::plain())
    }

    pub fn with_format(number_format: NumberFormat) -> Self {
        Self {
            registry: Registry::new(MemoryStore::new(), RegistryConfig { number_format }),
        }
    }

    /// Issue `count` documents of one type, dated [`FIXTURE_DATE`].
    pub async fn issue_many(&self, doc_type: &str, count: usize) -> Vec<DocumentRecord> {
        let mut issued = Vec::with_capacity(count);
        for i in 0..count {
            let record = self
                .registry
                .issue(doc_type, &format!("Destino {}", i + 1), Some(fixture_date()))
                .await
                .expect("issue in fixture");
            issued.push(record);
        }
        issued
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A SQLite database in a temporary directory.
///
/// Each call to [`SqliteFixture::registry`] opens an independent
/// connection, which is how concurrent sessions are modeled.
pub struct SqliteFixture {
    _dir: TempDir,
    pub path: PathBuf,
}

impl SqliteFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("numerador.db");
        // Run migrations once up front.
        drop(SqliteStore::open(&path).expect("open fixture database"));
        Self { _dir: dir, path }
    }

    pub fn registry(&self) -> Registry<SqliteStore> {
        self.registry_with(&SqliteOptions::default())
    }

    /// A registry whose connection uses `options`, e.g. a zero busy timeout.
    pub fn registry_with(&self, options: &SqliteOptions) -> Registry<SqliteStore> {
        let store =
            SqliteStore::open_with_options(&self.path, options).expect("open fixture database");
        Registry::new(store, RegistryConfig::default())
    }
}

impl Default for SqliteFixture {
    fn default() -> Self {
        Self::new()
    }
}
