//! # Numerador Store
//!
//! Persistence for the Numerador registry: the sequence store that hands
//! out per-type counter values, and the document table that records every
//! issued number.
//!
//! ## Overview
//!
//! Both concerns live behind the [`Store`] trait so the registry stays
//! storage-agnostic. The primary implementation is [`SqliteStore`], with
//! [`MemoryStore`] for tests and throwaway setups.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`InsertResult`] - Result of inserting a document
//! - [`StoreStatus`] - Row counts reported by a health check
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use numerador_core::NewDocument;
//! use numerador_store::{InsertResult, SqliteStore, Store};
//!
//! async fn example() {
//!     let store = SqliteStore::open("numerador.db").unwrap();
//!
//!     let value = store.allocate("Oficio").await.unwrap();
//!     let date = NaiveDate::from_ymd_opt(2025, 5, 2).unwrap();
//!     let doc = NewDocument::new("Oficio", format!("{value:03}/2025"), "Fórum", date);
//!
//!     match store.insert_document(&doc).await.unwrap() {
//!         InsertResult::Inserted(record) => println!("stored as #{}", record.id),
//!         InsertResult::Conflict { existing } => println!("taken by #{existing}"),
//!     }
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Atomic allocation**: `allocate` is a single increment-and-return
//!   statement, never a separate read and write
//! - **Uniqueness**: `(type, number)` is enforced by the store; a clash is
//!   reported as `Conflict`, not as an error
//! - **All-or-nothing restore**: `replace_all` either installs the whole
//!   snapshot or leaves the previous state untouched

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::{SqliteOptions, SqliteStore};
pub use traits::{InsertResult, Store, StoreStatus};
