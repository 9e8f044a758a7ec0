//! File discovery and format dispatch.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

use crate::StoreError;

/// Newest file (by modification time) in `dir` whose name starts with any of
/// `prefixes` and ends with `.{extension}`. `None` if the directory is missing
/// or holds no match.
pub fn latest_matching(dir: &Path, prefixes: &[&str], extension: &str) -> Option<PathBuf> {
    let suffix = format!(".{extension}");
    fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.ends_with(&suffix) && prefixes.iter().any(|p| name.starts_with(p))
        })
        .filter_map(|entry| {
            let modified = entry.metadata().ok()?.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            Some((modified, entry.path()))
        })
        .max()
        .map(|(_, path)| path)
}

/// Write a table, choosing the format from the file extension.
pub fn write_table(path: &Path, batch: &RecordBatch) -> Result<u64, StoreError> {
    match extension(path).as_deref() {
        Some("csv") => crate::csv::write_csv(path, batch),
        #[cfg(feature = "parquet")]
        Some("parquet") => crate::parquet_file::write_parquet(path, batch),
        _ => Err(StoreError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Read a table, choosing the format from the file extension. CSV input is
/// parsed against `schema`.
pub fn read_table(path: &Path, schema: SchemaRef) -> Result<RecordBatch, StoreError> {
    match extension(path).as_deref() {
        Some("csv") => crate::csv::read_csv(path, schema),
        #[cfg(feature = "parquet")]
        Some("parquet") => crate::parquet_file::read_parquet(path),
        _ => Err(StoreError::UnsupportedFormat(path.to_path_buf())),
    }
}

pub fn file_size(path: &Path) -> Result<u64, StoreError> {
    Ok(fs::metadata(path).map_err(|e| StoreError::io(path, e))?.len())
}

pub(crate) fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    Ok(())
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}
