//! Binary completion labels.
//!
//! Rows whose status resolves to success get `completed = 1`, rows that
//! resolve to failure get `completed = 0`, and unresolved rows are dropped.

use std::sync::Arc;

use arrow::array::{BooleanArray, Int64Array};
use arrow::compute::filter_record_batch;
use arrow::datatypes::{DataType, Field};
use arrow::record_batch::RecordBatch;
use tracing::info;
use trialscope_core::{Outcome, trials};

use crate::PipelineError;
use crate::column::{append_columns, strings, text_at};

/// Keep only rows with a resolved outcome and append the `completed` label.
pub fn create_completion_labels(batch: &RecordBatch) -> Result<RecordBatch, PipelineError> {
    let status = strings(batch, trials::OVERALL_STATUS)?;
    let labels: Vec<Option<i64>> = (0..batch.num_rows())
        .map(|i| Outcome::classify(text_at(status, i)).label())
        .collect();

    let keep: BooleanArray = labels.iter().map(|l| Some(l.is_some())).collect();
    let resolved = filter_record_batch(batch, &keep)?;
    let completed = Int64Array::from_iter_values(labels.iter().flatten().copied());

    let out = append_columns(
        &resolved,
        vec![Field::new(trials::COMPLETED, DataType::Int64, false)],
        vec![Arc::new(completed)],
    )?;

    let positives = labels.iter().filter(|l| **l == Some(1)).count();
    info!(
        input = batch.num_rows(),
        labeled = out.num_rows(),
        completed = positives,
        not_completed = out.num_rows() - positives,
        "created completion labels"
    );
    Ok(out)
}
