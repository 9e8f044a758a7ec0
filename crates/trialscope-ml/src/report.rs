//! Summary reports: data quality for the cleaned table and completion-rate
//! breakdowns for the labeled table.
//!
//! Reports hold plain numbers; rendering lives in the CLI.

use std::collections::HashMap;
use std::hash::Hash;

use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use trialscope_core::{EnrollmentBucket, trials};

use crate::PipelineError;
use crate::column::{bools, floats, ints, opt_at, strings, text_at};

/// Groups with this many trials or fewer are not worth displaying.
pub const MIN_GROUP_SIZE: usize = 10;

/// Number of statuses listed in the status breakdown of a completion report.
pub const STATUS_BREAKDOWN_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct MissingValues {
    pub column: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Descriptive statistics for a numeric column (nulls excluded).
#[derive(Debug, Clone, PartialEq)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; needs at least two values.
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl Describe {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let std = (n > 1).then(|| {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        });
        Some(Self {
            count: n,
            mean,
            std,
            min: sorted[0],
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted[n - 1],
        })
    }
}

/// Linear-interpolated quantile of sorted, non-empty values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualityReport {
    pub rows: usize,
    /// Columns with at least one missing value, most-missing first.
    pub missing: Vec<MissingValues>,
    pub phase_distribution: Vec<ValueCount>,
    pub status_distribution: Vec<ValueCount>,
    pub enrollment: Option<Describe>,
}

/// Data quality report over a cleaned (flat or enriched) trial table.
pub fn quality_report(batch: &RecordBatch) -> Result<QualityReport, PipelineError> {
    let rows = batch.num_rows();
    let schema = batch.schema();

    let mut missing: Vec<MissingValues> = schema
        .fields()
        .iter()
        .zip(batch.columns())
        .filter(|(_, col)| col.null_count() > 0)
        .map(|(field, col)| MissingValues {
            column: field.name().clone(),
            count: col.null_count(),
            percent: percent(col.null_count(), rows),
        })
        .collect();
    missing.sort_by(|a, b| b.count.cmp(&a.count));

    let enrollment = floats(batch, trials::ENROLLMENT_COUNT)?;
    let enrollment_values: Vec<f64> = (0..rows).filter_map(|i| opt_at(enrollment, i)).collect();

    Ok(QualityReport {
        rows,
        missing,
        phase_distribution: value_counts(batch, trials::PHASE)?,
        status_distribution: value_counts(batch, trials::OVERALL_STATUS)?,
        enrollment: Describe::from_values(&enrollment_values),
    })
}

/// Counts of each distinct text value (null counted as `""`), most common
/// first, ties broken by value.
pub fn value_counts(batch: &RecordBatch, column: &str) -> Result<Vec<ValueCount>, PipelineError> {
    let col = strings(batch, column)?;
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for i in 0..batch.num_rows() {
        *counts.entry(text_at(col, i)).or_default() += 1;
    }
    let mut out: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount {
            value: value.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    Ok(out)
}

/// Completion rate within one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRate {
    pub group: String,
    pub count: usize,
    /// Fraction of the group with `completed = 1`.
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionReport {
    pub total_trials: usize,
    /// Most common statuses before filtering, capped at [`STATUS_BREAKDOWN_LIMIT`].
    pub status_breakdown: Vec<ValueCount>,
    pub labeled: usize,
    pub completed: usize,
    pub not_completed: usize,
    /// Largest group first.
    pub by_phase: Vec<GroupRate>,
    /// Largest group first.
    pub by_sponsor_class: Vec<GroupRate>,
    /// Non-randomized then randomized; absent when the column is missing.
    pub by_randomization: Option<Vec<GroupRate>>,
    /// Bucket order; absent when the column is missing.
    pub by_enrollment: Option<Vec<GroupRate>>,
}

/// Completion report over the unfiltered table and its labeled subset.
pub fn completion_report(
    all: &RecordBatch,
    labeled: &RecordBatch,
) -> Result<CompletionReport, PipelineError> {
    let mut status_breakdown = value_counts(all, trials::OVERALL_STATUS)?;
    status_breakdown.truncate(STATUS_BREAKDOWN_LIMIT);

    let completed_col = ints(labeled, trials::COMPLETED)?;
    let completed: Vec<bool> = (0..labeled.num_rows())
        .map(|i| opt_at(completed_col, i) == Some(1))
        .collect();
    let positives = completed.iter().filter(|c| **c).count();

    let phase = strings(labeled, trials::PHASE)?;
    let mut by_phase = group_rates(&completed, |i| Some(text_at(phase, i).to_string()));
    by_phase.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(&b.0)));

    let sponsor = strings(labeled, trials::SPONSOR_CLASS)?;
    let mut by_sponsor = group_rates(&completed, |i| Some(text_at(sponsor, i).to_string()));
    by_sponsor.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(&b.0)));

    let by_randomization = match labeled.column_by_name(trials::IS_RANDOMIZED) {
        None => None,
        Some(_) => {
            let col = bools(labeled, trials::IS_RANDOMIZED)?;
            let mut groups =
                group_rates(&completed, |i| (!col.is_null(i)).then(|| col.value(i)));
            groups.sort_by_key(|(randomized, _)| *randomized);
            Some(
                groups
                    .into_iter()
                    .map(|(randomized, rate)| GroupRate {
                        group: if randomized { "Randomized" } else { "Non-randomized" }.into(),
                        ..rate
                    })
                    .collect(),
            )
        }
    };

    let by_enrollment = match labeled.column_by_name(trials::ENROLLMENT_COUNT) {
        None => None,
        Some(_) => {
            let col = floats(labeled, trials::ENROLLMENT_COUNT)?;
            let mut groups = group_rates(&completed, |i| {
                opt_at(col, i).and_then(EnrollmentBucket::from_count)
            });
            groups.sort_by_key(|(bucket, _)| *bucket);
            Some(
                groups
                    .into_iter()
                    .map(|(bucket, rate)| GroupRate {
                        group: bucket.label().into(),
                        ..rate
                    })
                    .collect(),
            )
        }
    };

    Ok(CompletionReport {
        total_trials: all.num_rows(),
        status_breakdown,
        labeled: labeled.num_rows(),
        completed: positives,
        not_completed: labeled.num_rows() - positives,
        by_phase: named(by_phase),
        by_sponsor_class: named(by_sponsor),
        by_randomization,
        by_enrollment,
    })
}

/// Comparison of completion rates for trials testing approved drugs.
#[derive(Debug, Clone, PartialEq)]
pub struct DrugComparison {
    pub total: usize,
    pub approved: usize,
    /// Completion rates for approved vs other trials, present only when more
    /// than [`MIN_GROUP_SIZE`] trials test an approved drug.
    pub approved_rate: Option<f64>,
    pub other_rate: Option<f64>,
}

impl DrugComparison {
    pub fn approved_percent(&self) -> f64 {
        percent(self.approved, self.total)
    }

    /// Difference in percentage points (approved − other).
    pub fn difference_points(&self) -> Option<f64> {
        Some((self.approved_rate? - self.other_rate?) * 100.0)
    }
}

/// `None` when the labeled table has no approved-drug column.
pub fn approved_drug_comparison(
    labeled: &RecordBatch,
) -> Result<Option<DrugComparison>, PipelineError> {
    if labeled.column_by_name(trials::TESTS_APPROVED_DRUG).is_none() {
        return Ok(None);
    }
    let flags = ints(labeled, trials::TESTS_APPROVED_DRUG)?;
    let completed = ints(labeled, trials::COMPLETED)?;

    let mut approved = (0usize, 0usize);
    let mut other = (0usize, 0usize);
    for i in 0..labeled.num_rows() {
        let done = usize::from(opt_at(completed, i) == Some(1));
        let slot = if opt_at(flags, i) == Some(1) {
            &mut approved
        } else {
            &mut other
        };
        slot.0 += 1;
        slot.1 += done;
    }

    let rate = |(n, done): (usize, usize)| (n > 0).then(|| done as f64 / n as f64);
    let compare = approved.0 > MIN_GROUP_SIZE;
    Ok(Some(DrugComparison {
        total: labeled.num_rows(),
        approved: approved.0,
        approved_rate: if compare { rate(approved) } else { None },
        other_rate: if compare { rate(other) } else { None },
    }))
}

fn group_rates<K: Eq + Hash>(
    completed: &[bool],
    key: impl Fn(usize) -> Option<K>,
) -> Vec<(K, GroupRate)> {
    let mut groups: HashMap<K, (usize, usize)> = HashMap::new();
    for (i, done) in completed.iter().enumerate() {
        if let Some(k) = key(i) {
            let entry = groups.entry(k).or_default();
            entry.0 += 1;
            entry.1 += usize::from(*done);
        }
    }
    groups
        .into_iter()
        .map(|(k, (count, done))| {
            (
                k,
                GroupRate {
                    group: String::new(),
                    count,
                    rate: done as f64 / count as f64,
                },
            )
        })
        .collect()
}

fn named(groups: Vec<(String, GroupRate)>) -> Vec<GroupRate> {
    groups
        .into_iter()
        .map(|(group, rate)| GroupRate { group, ..rate })
        .collect()
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
