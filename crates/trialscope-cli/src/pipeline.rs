//! Stage orchestration for the `clean`, `label`, and `run` subcommands.
//!
//! Each stage returns its table together with the reports produced along
//! the way; printing and writing are left to the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use arrow::record_batch::RecordBatch;
use chrono::Local;
use tracing::{info, warn};
use trialscope_core::{FlattenReport, flatten_records, trials};
use trialscope_ml::{
    ApprovedDrugs, CompletionReport, DrugComparison, QualityReport, add_approved_drug_feature,
    add_derived_features, approved_drug_comparison, completion_report, create_completion_labels,
    quality_report,
};
use trialscope_store::{AssemblyReport, assemble, latest_matching, load_drug_names, load_raw_records};

pub const TRIALS_RAW_PREFIX: &str = "all_cancer_trials_";
/// Raw trial snapshots considered when no input is given; the newest wins.
pub const TRIALS_RAW_INPUTS: &[&str] = &["immunotherapy_trials_combined_", TRIALS_RAW_PREFIX];
pub const DRUGS_PREFIX: &str = "all_cancer_drugs_";
pub const CLEAN_PREFIX: &str = "trials_clean_";
pub const LABELED_PREFIX: &str = "trials_completion_ml_";

// ── Data directory layout ──

/// Directory layout under the data root.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn raw_trials(&self) -> PathBuf {
        self.root.join("raw").join("clinicaltrials")
    }

    pub fn raw_drugs(&self) -> PathBuf {
        self.root.join("raw").join("fda")
    }

    pub fn processed(&self) -> PathBuf {
        self.root.join("processed")
    }
}

/// Local time stamp used in generated file names.
pub fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// `{dir}/{prefix}{stamp}.{extension}`
pub fn timestamped(dir: &Path, prefix: &str, stamp: &str, extension: &str) -> PathBuf {
    dir.join(format!("{prefix}{stamp}.{extension}"))
}

/// Use `explicit` if given, otherwise the newest file in `dir` matching any
/// of `prefixes`.
pub fn resolve_input(
    explicit: Option<PathBuf>,
    dir: &Path,
    prefixes: &[&str],
    extension: &str,
) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    let found = latest_matching(dir, prefixes, extension).with_context(|| {
        let patterns: Vec<String> = prefixes.iter().map(|p| format!("{p}*.{extension}")).collect();
        format!("no {} file found in {}", patterns.join(" or "), dir.display())
    })?;
    info!(path = %found.display(), "using newest input file");
    Ok(found)
}

// ── Clean ──

pub struct Cleaned {
    pub table: RecordBatch,
    pub flatten: FlattenReport,
    pub assembly: AssemblyReport,
    pub quality: QualityReport,
}

/// Raw JSON records → flat rows → typed table → derived features.
pub fn clean(raw_path: &Path) -> anyhow::Result<Cleaned> {
    let records = load_raw_records(raw_path)
        .with_context(|| format!("loading raw trials from {}", raw_path.display()))?;
    let (rows, flatten) = flatten_records(&records);
    let (flat, assembly) = assemble(&rows).context("assembling trial table")?;
    let table = add_derived_features(&flat).context("computing derived features")?;
    let quality = quality_report(&table).context("building quality report")?;
    Ok(Cleaned {
        table,
        flatten,
        assembly,
        quality,
    })
}

/// Read a previously cleaned table.
pub fn read_cleaned(path: &Path) -> anyhow::Result<RecordBatch> {
    trialscope_store::read_table(path, Arc::new(trials::enriched_schema()))
        .with_context(|| format!("reading cleaned trials from {}", path.display()))
}

// ── Label ──

pub struct Labeled {
    pub table: RecordBatch,
    pub report: CompletionReport,
    /// Present only when a reference set was applied.
    pub drugs: Option<DrugComparison>,
}

/// Load the approved-drug reference set. An explicit path must load; without
/// one, the newest drug file in `dir` is used and a missing file means no
/// enrichment.
pub fn load_reference(
    explicit: Option<PathBuf>,
    dir: &Path,
) -> anyhow::Result<Option<ApprovedDrugs>> {
    let path = match explicit {
        Some(path) => path,
        None => match latest_matching(dir, &[DRUGS_PREFIX], "json") {
            Some(path) => path,
            None => {
                warn!(dir = %dir.display(), "no approved-drug file found, skipping enrichment");
                return Ok(None);
            }
        },
    };
    let names = load_drug_names(&path)
        .with_context(|| format!("loading approved drugs from {}", path.display()))?;
    Ok(Some(ApprovedDrugs::new(names)))
}

/// Label resolved trials and optionally flag approved-drug interventions.
pub fn label(cleaned: &RecordBatch, drugs: Option<&ApprovedDrugs>) -> anyhow::Result<Labeled> {
    let mut table = create_completion_labels(cleaned).context("creating completion labels")?;
    if let Some(drugs) = drugs {
        table = add_approved_drug_feature(&table, drugs).context("adding approved-drug feature")?;
    }
    let report = completion_report(cleaned, &table).context("building completion report")?;
    let drugs = approved_drug_comparison(&table).context("comparing approved-drug trials")?;
    Ok(Labeled {
        table,
        report,
        drugs,
    })
}
