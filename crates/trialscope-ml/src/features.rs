//! Derived features computed from the assembled trial table.
//!
//! Every feature is total over missing inputs and no row is dropped.

use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use tracing::info;
use trialscope_core::features::{
    duration_days, intervention_count, is_blinded, is_completed, is_industry_sponsored,
    is_randomized, is_recruiting, phase_numeric,
};
use trialscope_core::trials;

use crate::PipelineError;
use crate::column::{append_columns, dates, opt_at, strings, text_at};

/// Append the derived feature columns to a flat trial table.
///
/// Column order follows [`trials::derived_fields`].
pub fn add_derived_features(batch: &RecordBatch) -> Result<RecordBatch, PipelineError> {
    let n = batch.num_rows();
    let start = dates(batch, trials::START_DATE)?;
    let completion = dates(batch, trials::COMPLETION_DATE)?;
    let status = strings(batch, trials::OVERALL_STATUS)?;
    let phase = strings(batch, trials::PHASE)?;
    let allocation = strings(batch, trials::ALLOCATION)?;
    let masking = strings(batch, trials::MASKING)?;
    let sponsor_class = strings(batch, trials::SPONSOR_CLASS)?;
    let intervention_types = strings(batch, trials::INTERVENTION_TYPES)?;

    let flag = |col: &StringArray, rule: fn(&str) -> bool| -> ArrayRef {
        Arc::new(
            (0..n)
                .map(|i| Some(rule(text_at(col, i))))
                .collect::<BooleanArray>(),
        )
    };

    let columns: Vec<ArrayRef> = vec![
        Arc::new(
            (0..n)
                .map(|i| duration_days(opt_at(start, i), opt_at(completion, i)))
                .collect::<Int64Array>(),
        ),
        flag(status, is_completed),
        flag(status, is_recruiting),
        Arc::new(
            (0..n)
                .map(|i| phase_numeric(text_at(phase, i)))
                .collect::<Float64Array>(),
        ),
        flag(allocation, is_randomized),
        flag(masking, is_blinded),
        flag(sponsor_class, is_industry_sponsored),
        Arc::new(Int64Array::from_iter_values(
            (0..n).map(|i| intervention_count(text_at(intervention_types, i))),
        )),
    ];

    let out = append_columns(batch, trials::derived_fields(), columns)?;
    info!(
        rows = out.num_rows(),
        added = trials::derived_fields().len(),
        "added derived features"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use trialscope_core::FlatTrialRow;
    use trialscope_store::assemble;

    fn flat(rows: Vec<FlatTrialRow>) -> RecordBatch {
        assemble(&rows).unwrap().0
    }

    fn completed_trial() -> FlatTrialRow {
        FlatTrialRow {
            nct_id: "NCT1".into(),
            overall_status: "COMPLETED".into(),
            phase: "PHASE2".into(),
            start_date: "2020-01-01".into(),
            completion_date: "2020-01-31".into(),
            allocation: "RANDOMIZED".into(),
            masking: "DOUBLE".into(),
            sponsor_class: "INDUSTRY".into(),
            intervention_types: "DRUG, DRUG".into(),
            ..Default::default()
        }
    }

    fn sparse_trial() -> FlatTrialRow {
        FlatTrialRow {
            nct_id: "NCT2".into(),
            overall_status: "RECRUITING".into(),
            phase: "BOGUS".into(),
            start_date: "2021-05".into(),
            allocation: "NON_RANDOMIZED".into(),
            masking: "NONE".into(),
            sponsor_class: "OTHER".into(),
            ..Default::default()
        }
    }

    #[test]
    fn derived_columns_match_enriched_schema() {
        let out = add_derived_features(&flat(vec![completed_trial()])).unwrap();
        assert_eq!(out.schema().as_ref(), &trials::enriched_schema());
    }

    #[test]
    fn feature_values() {
        let out = add_derived_features(&flat(vec![completed_trial(), sparse_trial()])).unwrap();
        assert_eq!(out.num_rows(), 2);

        let duration = out
            .column_by_name(trials::DURATION_DAYS)
            .unwrap()
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(duration.value(0), 30);
        assert!(duration.is_null(1));

        let phase = out
            .column_by_name(trials::PHASE_NUMERIC)
            .unwrap()
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(phase.value(0), 2.0);
        assert!(phase.is_null(1));

        let flag = |name: &str, row: usize| {
            out.column_by_name(name)
                .unwrap()
                .as_any()
                .downcast_ref::<BooleanArray>()
                .unwrap()
                .value(row)
        };
        assert!(flag(trials::IS_COMPLETED, 0));
        assert!(!flag(trials::IS_COMPLETED, 1));
        assert!(!flag(trials::IS_RECRUITING, 0));
        assert!(flag(trials::IS_RECRUITING, 1));
        assert!(flag(trials::IS_RANDOMIZED, 0));
        assert!(!flag(trials::IS_RANDOMIZED, 1));
        assert!(flag(trials::IS_BLINDED, 0));
        assert!(!flag(trials::IS_BLINDED, 1));
        assert!(flag(trials::IS_INDUSTRY_SPONSORED, 0));
        assert!(!flag(trials::IS_INDUSTRY_SPONSORED, 1));

        let count = out
            .column_by_name(trials::INTERVENTION_COUNT)
            .unwrap()
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(count.value(0), 2);
        assert_eq!(count.value(1), 0);
    }

    #[test]
    fn missing_input_column_is_an_error() {
        let out = add_derived_features(&flat(vec![completed_trial()])).unwrap();
        let projected = out.project(&[0, 1]).unwrap();
        assert!(matches!(
            add_derived_features(&projected),
            Err(PipelineError::MissingColumn(_))
        ));
    }
}
