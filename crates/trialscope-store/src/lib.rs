//! Storage layer: table assembly and flat-file I/O.

mod error;
pub use error::StoreError;

pub mod csv;
pub mod files;
pub mod json;
#[cfg(feature = "parquet")]
pub mod parquet_file;
pub mod table;

pub use files::{latest_matching, read_table, write_table};
pub use json::{load_drug_names, load_raw_records, write_json};
pub use table::{AssemblyReport, TableShape, assemble};
