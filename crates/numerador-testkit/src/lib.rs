//! # Numerador Testkit
//!
//! Testing utilities for Numerador.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: registries over in-memory or temporary SQLite stores,
//!   plus helpers to fill them
//! - **Generators**: Proptest strategies for records, counters, snapshots
//!   and number formats
//!
//! ## Test Fixtures
//!
//! ```rust
//! use numerador_testkit::fixtures::TestFixture;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let fixture = TestFixture::new();
//! let issued = fixture.issue_many("Oficio", 3).await;
//! assert_eq!(issued[2].number, "003/2025");
//! # });
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use numerador_testkit::generators::snapshot;
//!
//! proptest! {
//!     #[test]
//!     fn restore_roundtrip(s in snapshot(20)) {
//!         // restore(s) then backup_all() == s
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{date, numbered_rows, SqliteFixture, TestFixture, FIXTURE_DATE};
pub use generators::{
    destination, doc_type, issue_date, number_format, sequence_counter, snapshot,
};
