//! Error types for summary generation.

use tabclean_model::ModelError;
use tabclean_transform::TransformError;
use thiserror::Error;

/// Errors raised while deriving a summary table.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("column '{column}' not found")]
    ColumnNotFound { column: String },

    /// A statistic that needs numbers was asked of a text column.
    #[error("column '{column}' is not numeric (needed for {stat})")]
    NotNumeric { column: String, stat: String },

    /// Percent-of-total over a column summing to zero.
    #[error("column '{column}' sums to zero; percentages are undefined")]
    ZeroTotal { column: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

pub(crate) fn require_column(table: &tabclean_model::Table, column: &str) -> Result<()> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(ReportError::ColumnNotFound {
            column: column.to_string(),
        })
    }
}

pub(crate) fn require_numeric(
    table: &tabclean_model::Table,
    column: &str,
    stat: &str,
) -> Result<Vec<Option<f64>>> {
    require_column(table, column)?;
    if table.kind_of(column) != Some(tabclean_model::ColumnKind::Numeric) {
        return Err(ReportError::NotNumeric {
            column: column.to_string(),
            stat: stat.to_string(),
        });
    }
    Ok(table.numeric(column)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_numeric_names_the_statistic() {
        let err = ReportError::NotNumeric {
            column: "city_name".to_string(),
            stat: "mean".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "column 'city_name' is not numeric (needed for mean)"
        );
    }
}
