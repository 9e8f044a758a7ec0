use arrow::error::ArrowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing column: {0}")]
    MissingColumn(String),

    #[error("column {column} is {found}, expected {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
        found: String,
    },

    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
}
