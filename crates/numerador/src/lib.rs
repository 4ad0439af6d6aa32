//! # Numerador
//!
//! Year-scoped protocol numbers for the outgoing documents of a police
//! station desk: official letters, dispatches, subpoenas and the like.
//!
//! ## Overview
//!
//! - **Registry**: issues numbered documents, answers history queries, and
//!   takes or installs full snapshots
//! - **Backup**: CSV encoding of snapshots (`documents.csv`, `counters.csv`)
//! - **Desk**: the front-of-house collaborator that logs users in, checks
//!   document types against the configured list, and calls the registry
//! - **Config**: JSON-loadable settings for the database, numbering policy
//!   and desk
//!
//! ## Key Concepts
//!
//! - **Document type**: a label such as "Oficio" with its own counter
//! - **Sequence counter**: last value issued for a type; only ever grows
//! - **Document number**: counter value plus year, e.g. `003/2025`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use numerador::{Registry, RegistryConfig};
//! use numerador::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("numerador.db").unwrap();
//!     let registry = Registry::new(store, RegistryConfig::default());
//!
//!     let record = registry.issue("Oficio", "Delegacia X", None).await.unwrap();
//!     println!("{} -> {}", record.doc_type, record.number);
//!
//!     let history = registry.query(Some("Oficio")).await.unwrap();
//!     assert_eq!(history[0].id, record.id);
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `numerador::core` - Records, counters, number formatting
//! - `numerador::store` - Store trait, SQLite and in-memory backends

pub mod backup;
pub mod config;
pub mod desk;
pub mod error;
pub mod registry;

// Re-export component crates
pub use numerador_core as core;
pub use numerador_store as store;

// Re-export main types for convenience
pub use config::{AppConfig, Credentials, DatabaseConfig, DeskConfig, RegistryConfig};
pub use desk::{Desk, Session};
pub use error::{BackupError, ConfigError, RegistryError, Result};
pub use registry::Registry;

pub use numerador_core::{
    DocumentRecord, NumberFormat, SequenceCounter, Snapshot, ValidationError,
    DEFAULT_DOCUMENT_TYPES,
};
pub use numerador_store::{MemoryStore, SqliteStore, Store, StoreStatus};
