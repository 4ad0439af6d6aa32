//! Proptest generators for property-based testing.

use std::collections::BTreeMap;

use proptest::prelude::*;

use chrono::NaiveDate;
use numerador_core::{NewDocument, NumberFormat, SequenceCounter, Snapshot, DEFAULT_DOCUMENT_TYPES};

/// One of the stock document types.
pub fn doc_type() -> impl Strategy<Value = String> {
    prop::sample::select(DEFAULT_DOCUMENT_TYPES.to_vec()).prop_map(String::from)
}

/// A non-blank destination.
pub fn destination() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 ,.]{0,39}".prop_map(String::from)
}

/// A valid calendar date between 2000 and 2099.
pub fn issue_date() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default())
}

/// A numbering policy, with or without a prefix.
pub fn number_format() -> impl Strategy<Value = NumberFormat> {
    (proptest::option::of("[0-9]{1,4}"), 1usize..=6).prop_map(|(prefix, width)| NumberFormat {
        prefix,
        width,
        ..NumberFormat::default()
    })
}

/// A counter for one of the stock types.
pub fn sequence_counter() -> impl Strategy<Value = SequenceCounter> {
    (doc_type(), 0u64..10_000).prop_map(|(t, v)| SequenceCounter::new(t, v))
}

/// A consistent snapshot: ids ascending and unique, `(type, number)`
/// unique, at most one counter per type, counters sorted by type.
pub fn snapshot(max_documents: usize) -> impl Strategy<Value = Snapshot> {
    let rows = prop::collection::vec(
        (doc_type(), destination(), issue_date(), 1u64..5, 1i64..4),
        0..=max_documents,
    );
    let counters = prop::collection::vec(sequence_counter(), 0..6);

    (rows, counters, number_format()).prop_map(|(rows, counters, format)| {
        let mut next_value: BTreeMap<String, u64> = BTreeMap::new();
        let mut id = 0i64;
        let mut documents = Vec::with_capacity(rows.len());

        for (doc_type, destination, date, value_gap, id_gap) in rows {
            let value = next_value.entry(doc_type.clone()).or_insert(0);
            *value += value_gap;
            id += id_gap;

            let number = format.format(*value, &doc_type, chrono::Datelike::year(&date));
            documents.push(NewDocument::new(doc_type, number, destination, date).into_record(id));
        }

        // First counter per type wins; output sorted by type.
        let mut by_type = BTreeMap::new();
        for counter in counters {
            by_type.entry(counter.doc_type.clone()).or_insert(counter);
        }
        let counters = by_type.into_values().collect();

        Snapshot::new(documents, counters)
    })
}
