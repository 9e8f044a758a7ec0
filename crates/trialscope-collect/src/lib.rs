//! Collectors for the public APIs trialscope reads from.

mod error;
mod http;

pub mod drugs;
pub mod trials;

pub use drugs::{DrugEntry, DrugMap, DrugQuery, OpenFdaClient, add_manual_drugs};
pub use error::CollectError;
pub use http::REQUEST_TIMEOUT;
pub use trials::{ClinicalTrialsClient, TrialCollection, TrialQuery};
