//! Grouped aggregation.
//!
//! Rows are grouped by one or more key columns (ascending key order) and each
//! [`Aggregation`] adds one output column computed per group.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use tabclean_model::{ColumnValues, Table, format_numeric};
use tabclean_transform::{group_rows, key_columns, stats};

use crate::error::{Result, require_column, require_numeric};

/// Statistic computed for one column of each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    /// Non-missing values.
    Count,
    /// Missing values.
    Missing,
    /// Rows in the group, missing or not.
    Rows,
    Mean,
    Min,
    Max,
    /// Sample standard deviation (n - 1).
    Std,
    Sum,
    Median,
    /// Distinct non-missing values.
    Nunique,
    /// `"min-max"` of a numeric column.
    Span,
    /// First non-missing value.
    First,
}

impl Stat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Missing => "missing",
            Self::Rows => "rows",
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
            Self::Std => "std",
            Self::Sum => "sum",
            Self::Median => "median",
            Self::Nunique => "nunique",
            Self::Span => "span",
            Self::First => "first",
        }
    }

    fn needs_numbers(self) -> bool {
        matches!(
            self,
            Self::Mean | Self::Min | Self::Max | Self::Std | Self::Sum | Self::Median | Self::Span
        )
    }
}

impl std::fmt::Display for Stat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One output column of a grouped summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Aggregation {
    pub column: String,
    pub stat: Stat,
    /// Output column name; defaults to `<stat>_<column>`.
    #[serde(default)]
    pub alias: Option<String>,
}

impl Aggregation {
    pub fn new(column: impl Into<String>, stat: Stat) -> Self {
        Self {
            column: column.into(),
            stat,
            alias: None,
        }
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn output_name(&self) -> String {
        self.alias
            .clone()
            .unwrap_or_else(|| format!("{}_{}", self.stat, self.column))
    }
}

fn numeric_stat(stat: Stat, values: &[Option<f64>]) -> Option<f64> {
    match stat {
        Stat::Mean => stats::mean(values),
        Stat::Min => stats::min(values),
        Stat::Max => stats::max(values),
        Stat::Std => stats::std_sample(values),
        Stat::Sum => stats::sum(values),
        Stat::Median => stats::median(values),
        _ => None,
    }
}

fn span(values: &[Option<f64>]) -> Option<String> {
    Some(format!(
        "{}-{}",
        format_numeric(stats::min(values)?),
        format_numeric(stats::max(values)?)
    ))
}

fn compute(aggregation: &Aggregation, column: &ColumnValues, rows: &[usize]) -> ColumnCell {
    let members = column.take(rows);
    let displayed: Vec<Option<String>> = match &members {
        ColumnValues::Numeric(values) => values.iter().map(|v| v.map(format_numeric)).collect(),
        ColumnValues::Text(values) => values.clone(),
    };
    let present = displayed.iter().flatten().count();
    match aggregation.stat {
        Stat::Count => ColumnCell::Number(Some(present as f64)),
        Stat::Missing => ColumnCell::Number(Some((rows.len() - present) as f64)),
        Stat::Rows => ColumnCell::Number(Some(rows.len() as f64)),
        Stat::Nunique => {
            let distinct: HashSet<&String> = displayed.iter().flatten().collect();
            ColumnCell::Number(Some(distinct.len() as f64))
        }
        Stat::First => ColumnCell::Text(displayed.into_iter().flatten().next()),
        Stat::Span => match &members {
            ColumnValues::Numeric(values) => ColumnCell::Text(span(values)),
            ColumnValues::Text(_) => ColumnCell::Text(None),
        },
        stat => match &members {
            ColumnValues::Numeric(values) => ColumnCell::Number(numeric_stat(stat, values)),
            ColumnValues::Text(_) => ColumnCell::Number(None),
        },
    }
}

enum ColumnCell {
    Number(Option<f64>),
    Text(Option<String>),
}

/// Group `table` by `group_columns` and compute each aggregation per group.
///
/// Output columns: the grouping columns, then one column per aggregation.
/// Rows with a missing key are dropped.
///
/// # Errors
///
/// - [`ReportError::ColumnNotFound`](crate::ReportError::ColumnNotFound) for unknown columns
/// - [`ReportError::NotNumeric`](crate::ReportError::NotNumeric) when a numeric
///   statistic targets a text column
pub fn aggregate(
    table: &Table,
    group_columns: &[String],
    aggregations: &[Aggregation],
) -> Result<Table> {
    for column in group_columns {
        require_column(table, column)?;
    }
    for aggregation in aggregations {
        if aggregation.stat.needs_numbers() {
            require_numeric(table, &aggregation.column, aggregation.stat.as_str())?;
        } else {
            require_column(table, &aggregation.column)?;
        }
    }

    let groups = group_rows(table, group_columns)?;
    let mut columns = key_columns(table, group_columns, &groups)?;
    for aggregation in aggregations {
        let source = table.values(&aggregation.column)?;
        let cells: Vec<ColumnCell> = groups
            .iter()
            .map(|group| compute(aggregation, &source, &group.rows))
            .collect();
        let values = if matches!(aggregation.stat, Stat::Span | Stat::First) {
            ColumnValues::Text(
                cells
                    .into_iter()
                    .map(|cell| match cell {
                        ColumnCell::Text(value) => value,
                        ColumnCell::Number(value) => value.map(format_numeric),
                    })
                    .collect(),
            )
        } else {
            ColumnValues::Numeric(
                cells
                    .into_iter()
                    .map(|cell| match cell {
                        ColumnCell::Number(value) => value,
                        ColumnCell::Text(_) => None,
                    })
                    .collect(),
            )
        };
        columns.push((aggregation.output_name(), values));
    }

    debug!(
        table = %table.name(),
        groups = groups.len(),
        aggregations = aggregations.len(),
        "aggregated table"
    );
    Ok(Table::new(format!("{}_summary", table.name()), columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;

    fn cities() -> Table {
        Table::new(
            "cities",
            vec![
                (
                    "country_name".to_string(),
                    ColumnValues::Text(vec![
                        Some("India".into()),
                        Some("Chad".into()),
                        Some("India".into()),
                        Some("India".into()),
                        None,
                    ]),
                ),
                (
                    "city_name".to_string(),
                    ColumnValues::Text(vec![
                        Some("Delhi".into()),
                        Some("Abeche".into()),
                        Some("Agra".into()),
                        None,
                        Some("Nowhere".into()),
                    ]),
                ),
                (
                    "aqi_value".to_string(),
                    ColumnValues::Numeric(vec![
                        Some(150.0),
                        Some(40.0),
                        Some(90.0),
                        Some(120.0),
                        Some(10.0),
                    ]),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn country_summary() {
        let summary = aggregate(
            &cities(),
            &["country_name".to_string()],
            &[
                Aggregation::new("city_name", Stat::Count).alias("cities_count"),
                Aggregation::new("aqi_value", Stat::Mean).alias("avg_aqi"),
                Aggregation::new("aqi_value", Stat::Min),
                Aggregation::new("aqi_value", Stat::Max),
                Aggregation::new("aqi_value", Stat::Std),
            ],
        )
        .unwrap();

        assert_eq!(
            summary.column_names(),
            vec![
                "country_name",
                "cities_count",
                "avg_aqi",
                "min_aqi_value",
                "max_aqi_value",
                "std_aqi_value"
            ]
        );
        assert_eq!(
            summary.text("country_name").unwrap(),
            vec![Some("Chad".to_string()), Some("India".to_string())]
        );
        assert_eq!(summary.numeric("cities_count").unwrap(), vec![Some(1.0), Some(2.0)]);
        assert_eq!(summary.numeric("avg_aqi").unwrap(), vec![Some(40.0), Some(120.0)]);
        assert_eq!(summary.numeric("std_aqi_value").unwrap(), vec![None, Some(30.0)]);
    }

    #[test]
    fn span_first_and_nunique() {
        let summary = aggregate(
            &cities(),
            &["country_name".to_string()],
            &[
                Aggregation::new("aqi_value", Stat::Span).alias("range"),
                Aggregation::new("city_name", Stat::First),
                Aggregation::new("city_name", Stat::Nunique),
                Aggregation::new("city_name", Stat::Missing),
                Aggregation::new("city_name", Stat::Rows),
            ],
        )
        .unwrap();
        assert_eq!(
            summary.text("range").unwrap(),
            vec![Some("40-40".to_string()), Some("90-150".to_string())]
        );
        assert_eq!(
            summary.text("first_city_name").unwrap(),
            vec![Some("Abeche".to_string()), Some("Delhi".to_string())]
        );
        assert_eq!(summary.numeric("nunique_city_name").unwrap(), vec![Some(1.0), Some(2.0)]);
        assert_eq!(summary.numeric("missing_city_name").unwrap(), vec![Some(0.0), Some(1.0)]);
        assert_eq!(summary.numeric("rows_city_name").unwrap(), vec![Some(1.0), Some(3.0)]);
    }

    #[test]
    fn numeric_stat_on_text_is_rejected() {
        let err = aggregate(
            &cities(),
            &["country_name".to_string()],
            &[Aggregation::new("city_name", Stat::Mean)],
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::NotNumeric { .. }));
    }

    #[test]
    fn stat_parses_lowercase() {
        let aggregation: Aggregation =
            toml::from_str("column = \"aqi_value\"\nstat = \"median\"").unwrap();
        assert_eq!(aggregation.stat, Stat::Median);
        assert_eq!(aggregation.output_name(), "median_aqi_value");
    }
}
