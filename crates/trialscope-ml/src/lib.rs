//! Feature, label, and reporting stages over Arrow trial tables.

mod column;
mod error;
pub use error::PipelineError;

pub mod enrich;
pub mod features;
pub mod labels;
pub mod report;

pub use enrich::{ApprovedDrugs, add_approved_drug_feature};
pub use features::add_derived_features;
pub use labels::create_completion_labels;
pub use report::{
    CompletionReport, DrugComparison, QualityReport, approved_drug_comparison, completion_report,
    quality_report,
};
