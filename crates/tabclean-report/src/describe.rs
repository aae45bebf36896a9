//! Single-column `Metric,Value` statistics tables.

use serde::{Deserialize, Serialize};

use tabclean_model::{ColumnValues, Table, format_numeric, format_rounded};
use tabclean_transform::{distinct_values, stats};

use crate::error::{Result, require_column, require_numeric};

pub const METRIC_COLUMN: &str = "Metric";
pub const VALUE_COLUMN: &str = "Value";

/// Rows of `column` whose value contains `contains` (case-sensitive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubstringTally {
    pub column: String,
    pub contains: String,
}

/// What to describe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescribeSpec {
    /// Numeric column the statistics are computed over.
    pub column: String,
    /// Column reported at the row holding the max and the min.
    #[serde(default)]
    pub label: Option<String>,
    /// Column whose distinct values are counted.
    #[serde(default)]
    pub distinct: Option<String>,
    /// Column whose values are tallied, one metric per value.
    #[serde(default)]
    pub categories: Option<String>,
    /// Substring tallies, one metric each, after the category tallies.
    #[serde(default)]
    pub tallies: Vec<SubstringTally>,
}

impl DescribeSpec {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            label: None,
            distinct: None,
            categories: None,
            tallies: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_distinct(mut self, column: impl Into<String>) -> Self {
        self.distinct = Some(column.into());
        self
    }

    #[must_use]
    pub fn with_categories(mut self, column: impl Into<String>) -> Self {
        self.categories = Some(column.into());
        self
    }

    #[must_use]
    pub fn with_tally(mut self, column: impl Into<String>, contains: impl Into<String>) -> Self {
        self.tallies.push(SubstringTally {
            column: column.into(),
            contains: contains.into(),
        });
        self
    }
}

fn number(value: Option<f64>) -> Option<String> {
    value.map(format_numeric)
}

/// Row holding the extreme value; the first one on ties.
fn extreme_row(values: &[Option<f64>], largest: bool) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (row, value) in values.iter().enumerate() {
        let Some(value) = *value else { continue };
        let better = match best {
            None => true,
            Some((_, current)) if largest => value > current,
            Some((_, current)) => value < current,
        };
        if better {
            best = Some((row, value));
        }
    }
    best.map(|(row, _)| row)
}

/// Describe one numeric column as a two-column `Metric,Value` table.
///
/// Metrics: row count, non-missing count, optional distinct count, mean
/// (rounded to two places), median, std, max, min, optional labels at the
/// max and min, optional per-category row counts and substring tallies.
pub fn describe(table: &Table, spec: &DescribeSpec) -> Result<Table> {
    let column = spec.column.as_str();
    let values = require_numeric(table, column, "describe")?;
    for extra in [&spec.label, &spec.distinct, &spec.categories]
        .into_iter()
        .flatten()
    {
        require_column(table, extra)?;
    }
    for tally in &spec.tallies {
        require_column(table, &tally.column)?;
    }

    let mut metrics: Vec<(String, Option<String>)> = vec![
        ("Rows".to_string(), Some(table.height().to_string())),
        (
            format!("Non-missing {column}"),
            Some(stats::count(&values).to_string()),
        ),
    ];
    if let Some(distinct) = &spec.distinct {
        let count = distinct_values(table, distinct)?.len();
        metrics.push((format!("Distinct {distinct}"), Some(count.to_string())));
    }
    metrics.extend([
        (
            format!("Mean {column}"),
            stats::mean(&values).map(|v| format_rounded(v, 2)),
        ),
        (format!("Median {column}"), number(stats::median(&values))),
        (format!("Std {column}"), number(stats::std_sample(&values))),
        (format!("Max {column}"), number(stats::max(&values))),
        (format!("Min {column}"), number(stats::min(&values))),
    ]);

    if let Some(label) = &spec.label {
        let labels = table.display_values(label)?;
        for (largest, name) in [(true, "max"), (false, "min")] {
            let value = extreme_row(&values, largest).and_then(|row| labels[row].clone());
            metrics.push((format!("{label} at {name} {column}"), value));
        }
    }

    if let Some(categories) = &spec.categories {
        let cells = table.display_values(categories)?;
        for category in distinct_values(table, categories)? {
            let count = cells
                .iter()
                .filter(|cell| cell.as_deref() == Some(category.as_str()))
                .count();
            metrics.push((
                format!("Rows with {categories} = {category}"),
                Some(count.to_string()),
            ));
        }
    }

    for tally in &spec.tallies {
        let count = table
            .display_values(&tally.column)?
            .iter()
            .flatten()
            .filter(|cell| cell.contains(tally.contains.as_str()))
            .count();
        metrics.push((
            format!("Rows with {} containing {}", tally.column, tally.contains),
            Some(count.to_string()),
        ));
    }

    let (names, shown): (Vec<_>, Vec<_>) = metrics
        .into_iter()
        .map(|(name, value)| (Some(name), value))
        .unzip();
    Ok(Table::new(
        format!("{}_{column}_statistics", table.name()),
        vec![
            (METRIC_COLUMN.to_string(), ColumnValues::Text(names)),
            (VALUE_COLUMN.to_string(), ColumnValues::Text(shown)),
        ],
    )?)
}
