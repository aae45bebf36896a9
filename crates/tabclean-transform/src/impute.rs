//! Mean imputation of sentinel values in numeric columns.
//!
//! For each numeric column the mean of the observed (non-sentinel,
//! non-missing) values replaces every sentinel. Columns without sentinels are
//! left untouched, so imputing twice changes nothing.

use serde::Serialize;
use tracing::{debug, info};

use tabclean_model::{ColumnKind, ColumnValues, SentinelPolicy, Table};

use crate::error::{Result, TransformError};

/// Which columns to impute and how missing values are encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImputeOptions {
    pub policy: SentinelPolicy,
    /// Explicit columns to impute. `None` means every numeric column.
    pub columns: Option<Vec<String>>,
    /// Columns skipped even when numeric.
    pub exclude: Vec<String>,
}

impl ImputeOptions {
    pub fn new(policy: SentinelPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }

    #[must_use]
    pub fn excluding(mut self, column: impl Into<String>) -> Self {
        self.exclude.push(column.into());
        self
    }
}

/// Outcome of imputing one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnImputation {
    pub column: String,
    /// Sentinels replaced.
    pub replaced: usize,
    /// Mean written into sentinel cells; `None` when nothing was replaced.
    pub mean: Option<f64>,
}

/// Per-column imputation statistics for one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImputationReport {
    pub policy: SentinelPolicy,
    pub columns: Vec<ColumnImputation>,
    /// Sentinels still present in the inspected columns afterwards.
    pub remaining_sentinels: usize,
}

impl ImputationReport {
    pub fn total_replaced(&self) -> usize {
        self.columns.iter().map(|c| c.replaced).sum()
    }

    /// Columns where at least one value was replaced.
    pub fn imputed(&self) -> impl Iterator<Item = &ColumnImputation> {
        self.columns.iter().filter(|c| c.replaced > 0)
    }
}

/// Replace sentinels in `values` with the mean of the observed values.
///
/// # Errors
///
/// Returns [`TransformError::UndefinedMean`] when the column has sentinels but
/// no observed value to average, and [`TransformError::SentinelMean`] when the
/// observed values average to a sentinel.
pub fn impute_values(
    column: &str,
    values: &mut [Option<f64>],
    policy: SentinelPolicy,
) -> Result<ColumnImputation> {
    let sentinels = values.iter().filter(|v| policy.is_sentinel(**v)).count();
    if sentinels == 0 {
        return Ok(ColumnImputation {
            column: column.to_string(),
            replaced: 0,
            mean: None,
        });
    }

    let (sum, observed) = values
        .iter()
        .filter(|v| policy.is_observed(**v))
        .flatten()
        .fold((0.0_f64, 0usize), |(sum, n), v| (sum + v, n + 1));
    if observed == 0 {
        return Err(TransformError::UndefinedMean {
            column: column.to_string(),
        });
    }
    let mean = sum / observed as f64;
    if policy.is_sentinel(Some(mean)) {
        return Err(TransformError::SentinelMean {
            column: column.to_string(),
        });
    }

    for value in values.iter_mut() {
        if policy.is_sentinel(*value) {
            *value = Some(mean);
        }
    }

    Ok(ColumnImputation {
        column: column.to_string(),
        replaced: sentinels,
        mean: Some(mean),
    })
}

fn target_columns(table: &Table, options: &ImputeOptions) -> Result<Vec<String>> {
    let candidates = match &options.columns {
        Some(columns) => {
            for column in columns {
                match table.kind_of(column) {
                    None => {
                        return Err(TransformError::ColumnNotFound {
                            column: column.clone(),
                        });
                    }
                    Some(ColumnKind::Text) => {
                        return Err(TransformError::NotNumeric {
                            column: column.clone(),
                        });
                    }
                    Some(ColumnKind::Numeric) => {}
                }
            }
            columns.clone()
        }
        None => table.numeric_columns(),
    };
    Ok(candidates
        .into_iter()
        .filter(|column| !options.exclude.contains(column))
        .collect())
}

/// Impute every selected numeric column of `table` in place.
///
/// Either every column is imputed or, on error, the table is left unchanged.
///
/// # Errors
///
/// - [`TransformError::ColumnNotFound`] / [`TransformError::NotNumeric`] for a
///   bad explicit column
/// - [`TransformError::UndefinedMean`] when a column holds only sentinels
/// - [`TransformError::SentinelMean`] when a column's mean is a sentinel
pub fn impute_table(table: &mut Table, options: &ImputeOptions) -> Result<ImputationReport> {
    let policy = options.policy;
    let columns = target_columns(table, options)?;

    let mut updates = Vec::new();
    let mut stats = Vec::with_capacity(columns.len());
    for column in &columns {
        let mut values = table.numeric(column)?;
        let outcome = impute_values(column, &mut values, policy)?;
        if outcome.replaced > 0 {
            debug!(
                column = %column,
                replaced = outcome.replaced,
                mean = outcome.mean,
                "imputed column"
            );
            updates.push((column.clone(), values));
        }
        stats.push(outcome);
    }

    for (column, values) in updates {
        table.set_column(&column, ColumnValues::Numeric(values))?;
    }

    let mut remaining_sentinels = 0;
    for column in &columns {
        remaining_sentinels += table
            .numeric(column)?
            .into_iter()
            .filter(|v| policy.is_sentinel(*v))
            .count();
    }

    let report = ImputationReport {
        policy,
        columns: stats,
        remaining_sentinels,
    };
    info!(
        table = %table.name(),
        policy = %policy,
        columns = report.imputed().count(),
        replaced = report.total_replaced(),
        remaining = remaining_sentinels,
        "imputation complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(values: &[Option<f64>]) -> Table {
        Table::new(
            "t",
            vec![
                (
                    "country".to_string(),
                    ColumnValues::Text(vec![Some("A".into()); values.len()]),
                ),
                ("co2".to_string(), ColumnValues::Numeric(values.to_vec())),
            ],
        )
        .unwrap()
    }

    #[test]
    fn zero_policy_replaces_zeros_with_mean() {
        let mut values = vec![Some(0.0), Some(4.0), Some(6.0), Some(0.0), Some(10.0)];
        let outcome = impute_values("co2", &mut values, SentinelPolicy::Zero).unwrap();
        let mean = 20.0 / 3.0;
        assert_eq!(outcome.replaced, 2);
        assert_eq!(outcome.mean, Some(mean));
        assert_eq!(
            values,
            vec![Some(mean), Some(4.0), Some(6.0), Some(mean), Some(10.0)]
        );
    }

    #[test]
    fn zero_policy_keeps_missing_cells() {
        let mut values = vec![Some(0.0), None, Some(2.0)];
        impute_values("v", &mut values, SentinelPolicy::Zero).unwrap();
        assert_eq!(values, vec![Some(2.0), None, Some(2.0)]);
    }

    #[test]
    fn null_policy_fills_missing_and_keeps_zero() {
        let mut values = vec![None, Some(0.0), Some(3.0)];
        let outcome = impute_values("v", &mut values, SentinelPolicy::Null).unwrap();
        assert_eq!(outcome.mean, Some(1.5));
        assert_eq!(values, vec![Some(1.5), Some(0.0), Some(3.0)]);
    }

    #[test]
    fn all_sentinel_column_is_an_error() {
        let mut values = vec![Some(0.0), Some(0.0), None];
        let err = impute_values("1960", &mut values, SentinelPolicy::Zero).unwrap_err();
        assert!(matches!(err, TransformError::UndefinedMean { column } if column == "1960"));
    }

    #[test]
    fn zero_mean_under_zero_policy_is_an_error() {
        let mut values = vec![Some(-1.0), Some(1.0), Some(0.0)];
        let err = impute_values("balance", &mut values, SentinelPolicy::Zero).unwrap_err();
        assert!(matches!(err, TransformError::SentinelMean { column } if column == "balance"));
        assert_eq!(values, vec![Some(-1.0), Some(1.0), Some(0.0)]);
    }

    #[test]
    fn zero_mean_under_null_policy_is_kept() {
        let mut values = vec![Some(-1.0), Some(1.0), None];
        let outcome = impute_values("balance", &mut values, SentinelPolicy::Null).unwrap();
        assert_eq!(outcome.mean, Some(0.0));
        assert_eq!(values[2], Some(0.0));
    }

    #[test]
    fn column_without_sentinels_is_untouched() {
        let mut values = vec![Some(1.0), Some(2.0)];
        let outcome = impute_values("v", &mut values, SentinelPolicy::Zero).unwrap();
        assert_eq!(outcome.replaced, 0);
        assert_eq!(outcome.mean, None);
    }

    #[test]
    fn impute_table_skips_text_and_reports() {
        let mut table = numeric(&[Some(0.0), Some(4.0), Some(6.0), Some(0.0), Some(10.0)]);
        let report = impute_table(&mut table, &ImputeOptions::new(SentinelPolicy::Zero)).unwrap();
        assert_eq!(report.columns.len(), 1);
        assert_eq!(report.total_replaced(), 2);
        assert_eq!(report.remaining_sentinels, 0);
        assert_eq!(table.kind_of("country"), Some(ColumnKind::Text));
    }

    #[test]
    fn explicit_text_column_is_rejected() {
        let mut table = numeric(&[Some(1.0)]);
        let options =
            ImputeOptions::new(SentinelPolicy::Zero).with_columns(vec!["country".to_string()]);
        let err = impute_table(&mut table, &options).unwrap_err();
        assert!(matches!(err, TransformError::NotNumeric { .. }));

        let options =
            ImputeOptions::new(SentinelPolicy::Zero).with_columns(vec!["absent".to_string()]);
        let err = impute_table(&mut table, &options).unwrap_err();
        assert!(matches!(err, TransformError::ColumnNotFound { .. }));
    }

    #[test]
    fn excluded_column_is_left_alone() {
        let mut table = numeric(&[Some(0.0), Some(3.0)]);
        let options = ImputeOptions::new(SentinelPolicy::Zero).excluding("co2");
        let report = impute_table(&mut table, &options).unwrap();
        assert!(report.columns.is_empty());
        assert_eq!(table.numeric("co2").unwrap(), vec![Some(0.0), Some(3.0)]);
    }

    #[test]
    fn failure_leaves_table_unchanged() {
        let mut table = Table::new(
            "t",
            vec![
                ("a".to_string(), ColumnValues::Numeric(vec![Some(0.0), Some(2.0)])),
                ("b".to_string(), ColumnValues::Numeric(vec![Some(0.0), Some(0.0)])),
            ],
        )
        .unwrap();
        let result = impute_table(&mut table, &ImputeOptions::new(SentinelPolicy::Zero));
        assert!(result.is_err());
        assert_eq!(table.numeric("a").unwrap(), vec![Some(0.0), Some(2.0)]);
    }
}
