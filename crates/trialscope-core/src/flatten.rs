//! Record flattening: one nested study record → one fixed-schema row.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::record::{FlattenError, RawTrialRecord};

/// Separator for list-valued fields joined into a single text column.
pub const LIST_SEPARATOR: &str = ", ";

/// Number of per-record errors kept (and logged) in a [`FlattenReport`].
pub const MAX_ERROR_DETAILS: usize = 5;

/// A study record flattened into the fixed tabular schema.
///
/// `enrollment_count` keeps the raw textual value; numeric coercion happens
/// during table assembly so that unparseable values become missing there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatTrialRow {
    pub nct_id: String,
    pub title: String,
    pub official_title: String,
    pub overall_status: String,
    pub phase: String,
    pub study_type: String,
    pub enrollment_count: Option<String>,
    pub enrollment_type: String,
    pub start_date: String,
    pub completion_date: String,
    pub lead_sponsor: String,
    pub sponsor_class: String,
    pub allocation: String,
    pub intervention_model: String,
    pub masking: String,
    pub intervention_types: String,
    pub intervention_names: String,
    pub conditions: String,
    pub primary_outcome_measures: String,
    pub min_age: String,
    pub max_age: String,
    pub sex: String,
    pub has_results: bool,
}

/// Outcome of flattening a batch of records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenReport {
    pub rows: usize,
    pub errors: usize,
    /// `(record index, error)` for the first [`MAX_ERROR_DETAILS`] failures.
    pub error_details: Vec<(usize, FlattenError)>,
}

/// Flatten one record. Missing sections resolve to defaults; a section of
/// the wrong shape fails the whole record.
pub fn flatten_record(record: &RawTrialRecord) -> Result<FlatTrialRow, FlattenError> {
    let root = record.root()?;
    let protocol = root.child("protocolSection")?;

    let identification = protocol.child("identificationModule")?;
    let status = protocol.child("statusModule")?;
    let design = protocol.child("designModule")?;
    let enrollment = design.child("enrollmentInfo")?;
    let design_info = design.child("designInfo")?;
    let lead_sponsor = protocol
        .child("sponsorCollaboratorsModule")?
        .child("leadSponsor")?;
    let eligibility = protocol.child("eligibilityModule")?;

    let interventions = protocol
        .child("armsInterventionsModule")?
        .objects("interventions")?;
    let mut intervention_types = Vec::with_capacity(interventions.len());
    let mut intervention_names = Vec::with_capacity(interventions.len());
    for intervention in &interventions {
        intervention_types.push(intervention.text("type")?);
        intervention_names.push(intervention.text("name")?);
    }

    let primary_outcome_measures = protocol
        .child("outcomesModule")?
        .objects("primaryOutcomes")?
        .iter()
        .map(|o| o.text("measure"))
        .collect::<Result<Vec<_>, _>>()?;

    let conditions = protocol.child("conditionsModule")?.strings("conditions")?;
    let phase = design.strings("phases")?.into_iter().next().unwrap_or_default();

    Ok(FlatTrialRow {
        nct_id: identification.text("nctId")?,
        title: identification.text("briefTitle")?,
        official_title: identification.text("officialTitle")?,
        overall_status: status.text("overallStatus")?,
        phase,
        study_type: design.text("studyType")?,
        enrollment_count: enrollment.scalar("count")?,
        enrollment_type: enrollment.text("type")?,
        start_date: status.child("startDateStruct")?.text("date")?,
        completion_date: status.child("completionDateStruct")?.text("date")?,
        lead_sponsor: lead_sponsor.text("name")?,
        sponsor_class: lead_sponsor.text("class")?,
        allocation: design_info.text("allocation")?,
        intervention_model: design_info.text("interventionModel")?,
        masking: design_info.child("maskingInfo")?.text("masking")?,
        intervention_types: intervention_types.join(LIST_SEPARATOR),
        intervention_names: intervention_names.join(LIST_SEPARATOR),
        conditions: conditions.join(LIST_SEPARATOR),
        primary_outcome_measures: primary_outcome_measures.join(LIST_SEPARATOR),
        min_age: eligibility.text("minimumAge")?,
        max_age: eligibility.text("maximumAge")?,
        sex: eligibility.text("sex")?,
        has_results: root.contains("resultsSection"),
    })
}

/// Flatten a batch of records, skipping (and counting) structurally broken ones.
///
/// `rows.len() + report.errors == records.len()` always holds.
pub fn flatten_records(records: &[RawTrialRecord]) -> (Vec<FlatTrialRow>, FlattenReport) {
    let mut rows = Vec::with_capacity(records.len());
    let mut report = FlattenReport::default();

    for (i, record) in records.iter().enumerate() {
        match flatten_record(record) {
            Ok(row) => rows.push(row),
            Err(e) => {
                report.errors += 1;
                if report.error_details.len() < MAX_ERROR_DETAILS {
                    warn!(record = i, error = %e, "skipping malformed trial record");
                    report.error_details.push((i, e));
                }
            }
        }
    }

    report.rows = rows.len();
    info!(
        rows = report.rows,
        errors = report.errors,
        "flattened trial records"
    );
    (rows, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_record() -> RawTrialRecord {
        RawTrialRecord::new(json!({
            "protocolSection": {
                "identificationModule": {
                    "nctId": "NCT01234567",
                    "briefTitle": "Pembrolizumab in NSCLC",
                    "officialTitle": "A Phase 2 Study of Pembrolizumab"
                },
                "statusModule": {
                    "overallStatus": "COMPLETED",
                    "startDateStruct": {"date": "2020-01-01"},
                    "completionDateStruct": {"date": "2020-01-31"}
                },
                "sponsorCollaboratorsModule": {
                    "leadSponsor": {"name": "Merck Sharp & Dohme LLC", "class": "INDUSTRY"}
                },
                "designModule": {
                    "studyType": "INTERVENTIONAL",
                    "phases": ["PHASE2", "PHASE3"],
                    "enrollmentInfo": {"count": 120, "type": "ACTUAL"},
                    "designInfo": {
                        "allocation": "RANDOMIZED",
                        "interventionModel": "PARALLEL",
                        "maskingInfo": {"masking": "DOUBLE"}
                    }
                },
                "armsInterventionsModule": {
                    "interventions": [
                        {"type": "DRUG", "name": "Pembrolizumab Injection"},
                        {"type": "DRUG", "name": "Placebo"}
                    ]
                },
                "conditionsModule": {"conditions": ["Lung Cancer", "NSCLC"]},
                "outcomesModule": {
                    "primaryOutcomes": [{"measure": "Overall survival"}]
                },
                "eligibilityModule": {
                    "minimumAge": "18 Years",
                    "maximumAge": "75 Years",
                    "sex": "ALL"
                }
            },
            "resultsSection": {}
        }))
    }

    #[test]
    fn flattens_every_field() {
        let row = flatten_record(&full_record()).unwrap();
        assert_eq!(row.nct_id, "NCT01234567");
        assert_eq!(row.title, "Pembrolizumab in NSCLC");
        assert_eq!(row.official_title, "A Phase 2 Study of Pembrolizumab");
        assert_eq!(row.overall_status, "COMPLETED");
        assert_eq!(row.phase, "PHASE2");
        assert_eq!(row.study_type, "INTERVENTIONAL");
        assert_eq!(row.enrollment_count.as_deref(), Some("120"));
        assert_eq!(row.enrollment_type, "ACTUAL");
        assert_eq!(row.start_date, "2020-01-01");
        assert_eq!(row.completion_date, "2020-01-31");
        assert_eq!(row.lead_sponsor, "Merck Sharp & Dohme LLC");
        assert_eq!(row.sponsor_class, "INDUSTRY");
        assert_eq!(row.allocation, "RANDOMIZED");
        assert_eq!(row.intervention_model, "PARALLEL");
        assert_eq!(row.masking, "DOUBLE");
        assert_eq!(row.intervention_types, "DRUG, DRUG");
        assert_eq!(row.intervention_names, "Pembrolizumab Injection, Placebo");
        assert_eq!(row.conditions, "Lung Cancer, NSCLC");
        assert_eq!(row.primary_outcome_measures, "Overall survival");
        assert_eq!(row.min_age, "18 Years");
        assert_eq!(row.max_age, "75 Years");
        assert_eq!(row.sex, "ALL");
        assert!(row.has_results);
    }

    #[test]
    fn empty_record_yields_default_row() {
        let row = flatten_record(&RawTrialRecord::new(json!({}))).unwrap();
        assert_eq!(row, FlatTrialRow::default());
        assert!(!row.has_results);
        assert_eq!(row.enrollment_count, None);
    }

    #[test]
    fn has_results_is_presence_only() {
        let row = flatten_record(&RawTrialRecord::new(json!({"resultsSection": null}))).unwrap();
        assert!(row.has_results);
    }

    #[test]
    fn flattening_is_idempotent() {
        let record = full_record();
        assert_eq!(
            flatten_record(&record).unwrap(),
            flatten_record(&record).unwrap()
        );
    }

    #[test]
    fn malformed_records_are_counted_not_fatal() {
        let records = vec![
            full_record(),
            RawTrialRecord::new(json!({"protocolSection": {"designModule": {"phases": "PHASE1"}}})),
            RawTrialRecord::new(json!("not a record")),
            RawTrialRecord::new(json!({})),
        ];
        let (rows, report) = flatten_records(&records);
        assert_eq!(rows.len(), 2);
        assert_eq!(report.rows, 2);
        assert_eq!(report.errors, 2);
        assert_eq!(rows.len() + report.errors, records.len());
        assert_eq!(report.error_details[0].0, 1);
        assert_eq!(report.error_details[1].0, 2);
    }

    #[test]
    fn error_details_are_capped() {
        let records: Vec<_> = (0..8)
            .map(|_| RawTrialRecord::new(json!({"protocolSection": []})))
            .collect();
        let (rows, report) = flatten_records(&records);
        assert!(rows.is_empty());
        assert_eq!(report.errors, 8);
        assert_eq!(report.error_details.len(), MAX_ERROR_DETAILS);
    }

    #[test]
    fn missing_identifier_still_emits_row() {
        let record = RawTrialRecord::new(json!({
            "protocolSection": {"statusModule": {"overallStatus": "RECRUITING"}}
        }));
        let (rows, report) = flatten_records(&[record]);
        assert_eq!(report.errors, 0);
        assert_eq!(rows[0].nct_id, "");
        assert_eq!(rows[0].overall_status, "RECRUITING");
    }
}
