//! CSV encoding of registry snapshots.
//!
//! A backup is two files:
//!
//! - `documents.csv` with header `id,type,number,destination,issue_date,year`
//! - `counters.csv` with header `type,last_value`
//!
//! Rows are written in snapshot order and read back in file order, so
//! `read(write(snapshot)) == snapshot`. Reading checks the header and the
//! type of every field; nothing else is validated here. Uniqueness is left
//! to the store during restore.

use std::fs::File;
use std::io;
use std::path::Path;

use numerador_core::{DocumentRecord, SequenceCounter, Snapshot};

use crate::error::BackupError;

/// File name of the documents table inside a backup directory.
pub const DOCUMENTS_FILE: &str = "documents.csv";

/// File name of the counters table inside a backup directory.
pub const COUNTERS_FILE: &str = "counters.csv";

pub const DOCUMENTS_HEADER: [&str; 6] = ["id", "type", "number", "destination", "issue_date", "year"];
pub const COUNTERS_HEADER: [&str; 2] = ["type", "last_value"];

/// Write documents as CSV, header included even when there are no rows.
pub fn write_documents<W: io::Write>(writer: W, documents: &[DocumentRecord]) -> Result<(), BackupError> {
    write_rows(writer, &DOCUMENTS_HEADER, documents)
}

/// Write counters as CSV, header included even when there are no rows.
pub fn write_counters<W: io::Write>(writer: W, counters: &[SequenceCounter]) -> Result<(), BackupError> {
    write_rows(writer, &COUNTERS_HEADER, counters)
}

/// Read a documents CSV.
pub fn read_documents<R: io::Read>(reader: R) -> Result<Vec<DocumentRecord>, BackupError> {
    read_rows(reader, DOCUMENTS_FILE, &DOCUMENTS_HEADER)
}

/// Read a counters CSV.
pub fn read_counters<R: io::Read>(reader: R) -> Result<Vec<SequenceCounter>, BackupError> {
    read_rows(reader, COUNTERS_FILE, &COUNTERS_HEADER)
}

/// Encode a snapshot as `(documents_csv, counters_csv)`.
pub fn to_csv_strings(snapshot: &Snapshot) -> Result<(String, String), BackupError> {
    let mut documents = Vec::new();
    write_documents(&mut documents, &snapshot.documents)?;
    let mut counters = Vec::new();
    write_counters(&mut counters, &snapshot.counters)?;

    Ok((into_utf8(documents)?, into_utf8(counters)?))
}

/// Decode a snapshot from the two CSV texts.
pub fn from_csv_strings(documents: &str, counters: &str) -> Result<Snapshot, BackupError> {
    Ok(Snapshot::new(
        read_documents(documents.as_bytes())?,
        read_counters(counters.as_bytes())?,
    ))
}

/// Write both files into `dir`, creating it if needed.
pub fn write_dir(dir: impl AsRef<Path>, snapshot: &Snapshot) -> Result<(), BackupError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    write_documents(File::create(dir.join(DOCUMENTS_FILE))?, &snapshot.documents)?;
    write_counters(File::create(dir.join(COUNTERS_FILE))?, &snapshot.counters)?;
    tracing::info!("wrote backup to {}", dir.display());
    Ok(())
}

/// Read both files from `dir`.
pub fn read_dir(dir: impl AsRef<Path>) -> Result<Snapshot, BackupError> {
    let dir = dir.as_ref();
    let documents = read_documents(File::open(dir.join(DOCUMENTS_FILE))?)?;
    let counters = read_counters(File::open(dir.join(COUNTERS_FILE))?)?;
    Ok(Snapshot::new(documents, counters))
}

fn write_rows<W, T>(writer: W, header: &[&str], rows: &[T]) -> Result<(), BackupError>
where
    W: io::Write,
    T: serde::Serialize,
{
    // Header written by hand: serde-driven headers only appear with a row.
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(header)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn read_rows<R, T>(reader: R, file: &'static str, expected: &[&str]) -> Result<Vec<T>, BackupError>
where
    R: io::Read,
    T: serde::de::DeserializeOwned,
{
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if !headers.iter().eq(expected.iter().copied()) {
        return Err(BackupError::Header {
            file,
            expected: expected.join(","),
            found: headers.iter().collect::<Vec<_>>().join(","),
        });
    }

    rdr.deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(BackupError::from)
}

fn into_utf8(bytes: Vec<u8>) -> Result<String, BackupError> {
    String::from_utf8(bytes).map_err(|e| BackupError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}
