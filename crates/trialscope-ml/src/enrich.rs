//! Approved-drug enrichment: flags labeled trials whose interventions name a
//! drug from an external reference set.

use std::sync::Arc;

use arrow::array::Int64Array;
use arrow::datatypes::{DataType, Field};
use arrow::record_batch::RecordBatch;
use tracing::info;
use trialscope_core::trials;

use crate::PipelineError;
use crate::column::{append_columns, opt_text_at, strings};

/// Reference set of approved drug names, stored lowercase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovedDrugs {
    names: Vec<String>,
}

impl ApprovedDrugs {
    /// Build from raw names. Names are trimmed and lowercased; empty and
    /// duplicate names are dropped.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        names.sort();
        names.dedup();
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Whether any reference name occurs, case-insensitively, as a substring
    /// of the joined intervention names.
    pub fn matches(&self, intervention_names: &str) -> bool {
        let haystack = intervention_names.to_lowercase();
        self.names.iter().any(|name| haystack.contains(name.as_str()))
    }
}

/// Append `tests_approved_drug` (1/0). Null intervention names give 0.
pub fn add_approved_drug_feature(
    batch: &RecordBatch,
    drugs: &ApprovedDrugs,
) -> Result<RecordBatch, PipelineError> {
    let names = strings(batch, trials::INTERVENTION_NAMES)?;
    let flags = Int64Array::from_iter_values((0..batch.num_rows()).map(|i| {
        match opt_text_at(names, i) {
            Some(s) if drugs.matches(s) => 1,
            _ => 0,
        }
    }));
    let matched = flags.values().iter().filter(|v| **v == 1).count();

    let out = append_columns(
        batch,
        vec![Field::new(trials::TESTS_APPROVED_DRUG, DataType::Int64, false)],
        vec![Arc::new(flags)],
    )?;
    info!(
        reference_drugs = drugs.len(),
        rows = out.num_rows(),
        matched,
        "added approved-drug feature"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::StringArray;
    use arrow::datatypes::Schema;

    fn names_batch(values: Vec<Option<&str>>) -> RecordBatch {
        let schema = Schema::new(vec![Field::new(
            trials::INTERVENTION_NAMES,
            DataType::Utf8,
            true,
        )]);
        RecordBatch::try_new(Arc::new(schema), vec![Arc::new(StringArray::from(values))])
            .unwrap()
    }

    fn flags(batch: &RecordBatch) -> Vec<i64> {
        batch
            .column_by_name(trials::TESTS_APPROVED_DRUG)
            .unwrap()
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap()
            .values()
            .to_vec()
    }

    #[test]
    fn case_insensitive_substring_match() {
        let drugs = ApprovedDrugs::new(["pembrolizumab"]);
        assert!(drugs.matches("Pembrolizumab Injection"));
        assert!(drugs.matches("Placebo, PEMBROLIZUMAB"));
        assert!(!drugs.matches("Nivolumab"));
        assert!(!drugs.matches(""));
    }

    #[test]
    fn reference_names_are_normalised() {
        let drugs = ApprovedDrugs::new([" Cisplatin ", "cisplatin", "", "Doxorubicin"]);
        assert_eq!(drugs.names(), &["cisplatin".to_string(), "doxorubicin".to_string()]);
        assert_eq!(drugs.len(), 2);
        assert!(!drugs.is_empty());
    }

    #[test]
    fn feature_column_values() {
        let drugs = ApprovedDrugs::new(["pembrolizumab", "cisplatin"]);
        let batch = names_batch(vec![
            Some("Pembrolizumab Injection"),
            Some("Radiation"),
            None,
            Some("Cisplatin, Etoposide"),
        ]);
        let out = add_approved_drug_feature(&batch, &drugs).unwrap();
        assert_eq!(flags(&out), vec![1, 0, 0, 1]);
    }

    #[test]
    fn empty_reference_set_matches_nothing() {
        let out = add_approved_drug_feature(
            &names_batch(vec![Some("Pembrolizumab")]),
            &ApprovedDrugs::default(),
        )
        .unwrap();
        assert_eq!(flags(&out), vec![0]);
    }
}
