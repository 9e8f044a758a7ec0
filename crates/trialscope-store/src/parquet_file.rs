//! Parquet tables.

use std::fs::File;
use std::path::Path;

use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::info;

use crate::StoreError;
use crate::files::{ensure_parent, file_size};

/// Write a table as a single Parquet file. Returns the file size in bytes.
pub fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<u64, StoreError> {
    ensure_parent(path)?;
    let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;

    let size = file_size(path)?;
    info!(path = %path.display(), rows = batch.num_rows(), bytes = size, "wrote parquet");
    Ok(size)
}

/// Read a Parquet file into a single table.
pub fn read_parquet(path: &Path) -> Result<RecordBatch, StoreError> {
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let batches = builder.build()?.collect::<Result<Vec<_>, _>>()?;
    Ok(concat_batches(&schema, &batches)?)
}
