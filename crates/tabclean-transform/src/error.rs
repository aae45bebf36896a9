//! Error types for table transformations.

use tabclean_model::ModelError;
use thiserror::Error;

/// Errors raised while cleaning or reshaping a table.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Every value in the column is a sentinel or missing, so there is no mean.
    #[error("column '{column}' has no observed values; mean is undefined")]
    UndefinedMean { column: String },

    /// The observed mean is itself a sentinel (zero under the zero policy).
    #[error("column '{column}' averages to a sentinel value; imputation would leave sentinels")]
    SentinelMean { column: String },

    #[error("column '{column}' not found")]
    ColumnNotFound { column: String },

    #[error("column '{column}' is not numeric")]
    NotNumeric { column: String },

    /// A melt key could not be converted to a number.
    #[error("key '{key}' from column '{column}' is not numeric")]
    InvalidKey { column: String, key: String },

    /// A generated column name clashes with an existing one.
    #[error("column '{column}' already exists")]
    DuplicateColumn { column: String },

    /// A stack group lists a different number of columns than the output.
    #[error("group '{group}' has {actual} columns, expected {expected}")]
    GroupWidth {
        group: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error(transparent)]
    Model(ModelError),
}

impl From<ModelError> for TransformError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::ColumnNotFound { column } => Self::ColumnNotFound { column },
            ModelError::NotNumeric { column } => Self::NotNumeric { column },
            ModelError::DuplicateColumn { column } => Self::DuplicateColumn { column },
            other => Self::Model(other),
        }
    }
}

/// Result type for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;
