pub mod coerce;
pub mod features;
pub mod flatten;
pub mod outcome;
pub mod record;
pub mod schema;

pub use flatten::{FlatTrialRow, FlattenReport, flatten_record, flatten_records};
pub use outcome::{EnrollmentBucket, Outcome};
pub use record::{FlattenError, RawTrialRecord};
pub use schema::trials;
