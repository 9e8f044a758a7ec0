//! Delimited-text tables with a header row.
//!
//! Dates are written as `YYYY-MM-DD`, booleans as `true`/`false`, nulls as
//! empty cells.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use arrow::compute::concat_batches;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use tracing::info;

use crate::StoreError;
use crate::files::{ensure_parent, file_size};

/// Write a table as CSV with a header row. Returns the file size in bytes.
pub fn write_csv(path: &Path, batch: &RecordBatch) -> Result<u64, StoreError> {
    ensure_parent(path)?;
    let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(batch)?;
    drop(writer);

    let size = file_size(path)?;
    info!(path = %path.display(), rows = batch.num_rows(), bytes = size, "wrote csv");
    Ok(size)
}

/// Read a CSV with a header row into a single table of the given schema.
pub fn read_csv(path: &Path, schema: SchemaRef) -> Result<RecordBatch, StoreError> {
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .build(BufReader::new(file))?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    let batch = concat_batches(&schema, &batches)?;
    info!(path = %path.display(), rows = batch.num_rows(), "read csv");
    Ok(batch)
}
