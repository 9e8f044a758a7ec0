//! Tabular assembly: flattened rows → one Arrow `RecordBatch`.
//!
//! Enrollment counts and dates are coerced here. A value that cannot be
//! parsed becomes null and is counted in the [`AssemblyReport`]; the row is
//! always kept.

use std::fmt;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Date32Array, Float64Array, StringArray};
use arrow::record_batch::RecordBatch;
use tracing::info;
use trialscope_core::coerce::{date_to_days, parse_date, parse_number};
use trialscope_core::{FlatTrialRow, trials};

use crate::StoreError;

/// Row and column count of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableShape {
    pub rows: usize,
    pub columns: usize,
}

impl TableShape {
    pub fn of(batch: &RecordBatch) -> Self {
        Self {
            rows: batch.num_rows(),
            columns: batch.num_columns(),
        }
    }
}

impl fmt::Display for TableShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.rows, self.columns)
    }
}

/// Coercion outcomes for one assembled table.
///
/// Counts only values that were present but unparseable; absent values are
/// missing without being a coercion failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyReport {
    pub shape: TableShape,
    pub unparsed_enrollment: usize,
    pub unparsed_start_dates: usize,
    pub unparsed_completion_dates: usize,
}

/// Build the flat trial table from flattened rows.
pub fn assemble(rows: &[FlatTrialRow]) -> Result<(RecordBatch, AssemblyReport), StoreError> {
    let mut unparsed_enrollment = 0;
    let enrollment: Float64Array = rows
        .iter()
        .map(|r| {
            let raw = r.enrollment_count.as_deref()?;
            let parsed = parse_number(raw);
            if parsed.is_none() && !raw.trim().is_empty() {
                unparsed_enrollment += 1;
            }
            parsed
        })
        .collect();

    let (start_dates, unparsed_start_dates) = coerce_dates(rows, |r| &r.start_date);
    let (completion_dates, unparsed_completion_dates) =
        coerce_dates(rows, |r| &r.completion_date);

    let has_results: BooleanArray = rows.iter().map(|r| Some(r.has_results)).collect();

    let columns: Vec<ArrayRef> = vec![
        text(rows, |r| &r.nct_id),
        text(rows, |r| &r.title),
        text(rows, |r| &r.official_title),
        text(rows, |r| &r.overall_status),
        text(rows, |r| &r.phase),
        text(rows, |r| &r.study_type),
        Arc::new(enrollment),
        text(rows, |r| &r.enrollment_type),
        Arc::new(start_dates),
        Arc::new(completion_dates),
        text(rows, |r| &r.lead_sponsor),
        text(rows, |r| &r.sponsor_class),
        text(rows, |r| &r.allocation),
        text(rows, |r| &r.intervention_model),
        text(rows, |r| &r.masking),
        text(rows, |r| &r.intervention_types),
        text(rows, |r| &r.intervention_names),
        text(rows, |r| &r.conditions),
        text(rows, |r| &r.primary_outcome_measures),
        text(rows, |r| &r.min_age),
        text(rows, |r| &r.max_age),
        text(rows, |r| &r.sex),
        Arc::new(has_results),
    ];

    let batch = RecordBatch::try_new(Arc::new(trials::flat_schema()), columns)?;
    let report = AssemblyReport {
        shape: TableShape::of(&batch),
        unparsed_enrollment,
        unparsed_start_dates,
        unparsed_completion_dates,
    };
    info!(
        rows = report.shape.rows,
        columns = report.shape.columns,
        unparsed_enrollment,
        unparsed_start_dates,
        unparsed_completion_dates,
        "assembled trial table"
    );
    Ok((batch, report))
}

fn text(rows: &[FlatTrialRow], field: impl Fn(&FlatTrialRow) -> &String) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(rows.iter().map(|r| field(r).as_str())))
}

fn coerce_dates(
    rows: &[FlatTrialRow],
    field: impl Fn(&FlatTrialRow) -> &String,
) -> (Date32Array, usize) {
    let mut unparsed = 0;
    let dates = rows
        .iter()
        .map(|r| {
            let raw = field(r);
            let parsed = parse_date(raw).map(date_to_days);
            if parsed.is_none() && !raw.trim().is_empty() {
                unparsed += 1;
            }
            parsed
        })
        .collect();
    (dates, unparsed)
}
