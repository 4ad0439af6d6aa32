//! Record types shared by the store and the registry.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Document types offered by the desk out of the box.
///
/// The store accepts any non-empty string as a type key; this list only
/// seeds the desk configuration.
pub const DEFAULT_DOCUMENT_TYPES: [&str; 9] = [
    "Oficio",
    "Protocolo",
    "Despacho",
    "Ordem de Missão",
    "Relatório Policial",
    "Verificação de Procedência de Informação - VPI",
    "Carta Precatória Expedida",
    "Carta Precatória Recebida",
    "Intimação",
];

/// An issued document.
///
/// Immutable once stored. `(doc_type, number)` is unique across the store.
/// Field names in the serialized form match the backup CSV header
/// `id,type,number,destination,issue_date,year`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Surrogate id assigned by the store, increasing with insertion order.
    pub id: i64,
    /// Document type key.
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Formatted protocol number, e.g. `003/2025` or `466-003/2025`.
    pub number: String,
    /// Free-text destination.
    pub destination: String,
    /// Date of issuance.
    #[serde(with = "issue_date_serde")]
    pub issue_date: NaiveDate,
    /// Year of `issue_date`, kept for filtering.
    pub year: i32,
}

/// Parse an issue date written as `YYYY-MM-DD` or, as older exports
/// did, `DD/MM/YYYY`.
pub fn parse_issue_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
}

mod issue_date_serde {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&date.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_issue_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid issue date: {}", raw)))
    }
}

/// A document that has been numbered but not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub doc_type: String,
    pub number: String,
    pub destination: String,
    pub issue_date: NaiveDate,
}

impl NewDocument {
    /// Create a new document. The year is derived from `issue_date`.
    pub fn new(
        doc_type: impl Into<String>,
        number: impl Into<String>,
        destination: impl Into<String>,
        issue_date: NaiveDate,
    ) -> Self {
        Self {
            doc_type: doc_type.into(),
            number: number.into(),
            destination: destination.into(),
            issue_date,
        }
    }

    /// Year of issuance.
    pub fn year(&self) -> i32 {
        self.issue_date.year()
    }

    /// Attach the store-assigned id.
    pub fn into_record(self, id: i64) -> DocumentRecord {
        let year = self.year();
        DocumentRecord {
            id,
            doc_type: self.doc_type,
            number: self.number,
            destination: self.destination,
            issue_date: self.issue_date,
            year,
        }
    }
}

/// Last issued value for a document type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceCounter {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub last_value: u64,
}

impl SequenceCounter {
    pub fn new(doc_type: impl Into<String>, last_value: u64) -> Self {
        Self {
            doc_type: doc_type.into(),
            last_value,
        }
    }
}

/// Complete image of the registry.
///
/// Documents are ordered by ascending id and counters by ascending type,
/// so two snapshots of the same state compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub documents: Vec<DocumentRecord>,
    pub counters: Vec<SequenceCounter>,
}

impl Snapshot {
    pub fn new(documents: Vec<DocumentRecord>, counters: Vec<SequenceCounter>) -> Self {
        Self {
            documents,
            counters,
        }
    }

    /// True if the snapshot holds no rows at all.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty() && self.counters.is_empty()
    }

    /// Counter value recorded for a type, if any.
    pub fn counter(&self, doc_type: &str) -> Option<u64> {
        self.counters
            .iter()
            .find(|c| c.doc_type == doc_type)
            .map(|c| c.last_value)
    }
}
