//! JSON inputs and outputs: raw trial records, approved-drug references,
//! and collector snapshots.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::info;
use trialscope_core::RawTrialRecord;

use crate::StoreError;

/// Load raw trial records from a JSON document.
///
/// Accepts either a list of records or a mapping keyed by identifier; for a
/// mapping the keys are discarded.
pub fn load_raw_records(path: &Path) -> Result<Vec<RawTrialRecord>, StoreError> {
    let value = read_value(path)?;
    let records = raw_records_from_value(value)?;
    info!(path = %path.display(), count = records.len(), "loaded raw trial records");
    Ok(records)
}

/// Convert a parsed JSON document into a sequence of raw records.
pub fn raw_records_from_value(value: Value) -> Result<Vec<RawTrialRecord>, StoreError> {
    match value {
        Value::Array(items) => Ok(items.into_iter().map(RawTrialRecord::new).collect()),
        Value::Object(map) => Ok(map.into_iter().map(|(_, v)| RawTrialRecord::new(v)).collect()),
        _ => Err(StoreError::Other(
            "expected a list or an identifier-keyed mapping of trial records".into(),
        )),
    }
}

/// Load approved-drug names from a JSON mapping whose keys are drug names.
///
/// Names are lowercased and trimmed; empty keys are dropped.
pub fn load_drug_names(path: &Path) -> Result<Vec<String>, StoreError> {
    let names = drug_names_from_value(read_value(path)?)?;
    info!(path = %path.display(), count = names.len(), "loaded approved-drug names");
    Ok(names)
}

pub fn drug_names_from_value(value: Value) -> Result<Vec<String>, StoreError> {
    match value {
        Value::Object(map) => Ok(map
            .keys()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect()),
        _ => Err(StoreError::Other(
            "expected a mapping keyed by drug name".into(),
        )),
    }
}

/// Write any serialisable value as pretty-printed JSON, creating parent
/// directories. Returns the file size in bytes.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<u64, StoreError> {
    crate::files::ensure_parent(path)?;
    let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(|e| StoreError::io(path, e))?;
    crate::files::file_size(path)
}

fn read_value(path: &Path) -> Result<Value, StoreError> {
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
