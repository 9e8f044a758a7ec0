//! Typed column access and column appending for trial tables.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray,
};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::PipelineError;

fn typed<'a, T: Array + 'static>(
    batch: &'a RecordBatch,
    name: &str,
    expected: &'static str,
) -> Result<&'a T, PipelineError> {
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))?;
    col.as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| PipelineError::ColumnType {
            column: name.to_string(),
            expected,
            found: col.data_type().to_string(),
        })
}

pub(crate) fn strings<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a StringArray, PipelineError> {
    typed(batch, name, "Utf8")
}

pub(crate) fn floats<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a Float64Array, PipelineError> {
    typed(batch, name, "Float64")
}

pub(crate) fn ints<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int64Array, PipelineError> {
    typed(batch, name, "Int64")
}

pub(crate) fn dates<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a Date32Array, PipelineError> {
    typed(batch, name, "Date32")
}

pub(crate) fn bools<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a BooleanArray, PipelineError> {
    typed(batch, name, "Boolean")
}

/// Text value at `row`; null reads as `""`.
pub(crate) fn text_at(arr: &StringArray, row: usize) -> &str {
    if arr.is_null(row) { "" } else { arr.value(row) }
}

/// Text value at `row`, `None` when null.
pub(crate) fn opt_text_at(arr: &StringArray, row: usize) -> Option<&str> {
    (!arr.is_null(row)).then(|| arr.value(row))
}

pub(crate) fn opt_at<T>(arr: &arrow::array::PrimitiveArray<T>, row: usize) -> Option<T::Native>
where
    T: arrow::datatypes::ArrowPrimitiveType,
{
    (!arr.is_null(row)).then(|| arr.value(row))
}

/// Return a new batch with `fields`/`columns` appended after the existing ones.
pub(crate) fn append_columns(
    batch: &RecordBatch,
    fields: Vec<Field>,
    columns: Vec<ArrayRef>,
) -> Result<RecordBatch, PipelineError> {
    let schema = batch.schema();
    let mut all_fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    all_fields.extend(fields);

    let mut all_columns = batch.columns().to_vec();
    all_columns.extend(columns);

    Ok(RecordBatch::try_new(
        Arc::new(Schema::new(all_fields)),
        all_columns,
    )?)
}
