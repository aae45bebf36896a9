//! Error types for table construction and column access.

use thiserror::Error;

/// Errors raised by [`Table`](crate::Table) operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Column not present in the table.
    #[error("column '{column}' not found")]
    ColumnNotFound { column: String },

    /// Column exists but holds text values.
    #[error("column '{column}' is not numeric")]
    NotNumeric { column: String },

    /// Column exists but holds numeric values.
    #[error("column '{column}' is not text")]
    NotText { column: String },

    /// Column length differs from the table's row count.
    #[error("column '{column}' has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Two columns share a name.
    #[error("duplicate column '{column}'")]
    DuplicateColumn { column: String },

    /// Row index outside the table.
    #[error("row {index} out of bounds for table with {height} rows")]
    RowOutOfBounds { index: usize, height: usize },

    /// Underlying polars operation failed.
    #[error("frame operation failed: {message}")]
    Frame { message: String },
}

impl From<polars::prelude::PolarsError> for ModelError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::Frame {
            message: err.to_string(),
        }
    }
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
