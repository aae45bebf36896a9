//! Category frequency tables.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use tabclean_model::{ColumnValues, Table, round_to};
use tabclean_transform::distinct_values;

use crate::error::{Result, require_column};

pub const COUNT_COLUMN: &str = "count";
pub const PERCENTAGE_COLUMN: &str = "percentage";

/// One column contributing to a stacked count table, under a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategorySource {
    pub label: String,
    pub column: String,
}

/// `(value, count)` pairs ordered by count descending, then first appearance.
fn counted(table: &Table, column: &str) -> Result<Vec<(String, usize)>> {
    require_column(table, column)?;
    let order = distinct_values(table, column)?;
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in table.display_values(column)?.into_iter().flatten() {
        *counts.entry(value).or_default() += 1;
    }
    let mut pairs: Vec<(String, usize)> = order
        .into_iter()
        .map(|value| {
            let count = counts.get(&value).copied().unwrap_or_default();
            (value, count)
        })
        .collect();
    // stable: ties keep first-appearance order
    pairs.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(pairs)
}

fn percentage(count: usize, total: usize) -> Option<f64> {
    (total > 0).then(|| round_to(count as f64 / total as f64 * 100.0, 2))
}

/// Distinct non-missing values of `column` with their count and share of all rows.
///
/// Output columns: `column`, `count`, `percentage` (of the table's row count,
/// rounded to two places).
pub fn category_counts(table: &Table, column: &str) -> Result<Table> {
    let pairs = counted(table, column)?;
    let total = table.height();
    let columns = vec![
        (
            column.to_string(),
            ColumnValues::Text(pairs.iter().map(|(value, _)| Some(value.clone())).collect()),
        ),
        (
            COUNT_COLUMN.to_string(),
            ColumnValues::Numeric(pairs.iter().map(|(_, n)| Some(*n as f64)).collect()),
        ),
        (
            PERCENTAGE_COLUMN.to_string(),
            ColumnValues::Numeric(pairs.iter().map(|(_, n)| percentage(*n, total)).collect()),
        ),
    ];
    Ok(Table::new(format!("{}_{column}_counts", table.name()), columns)?)
}

/// Category counts for several columns stacked into one table.
///
/// Output columns: `label_column`, `category_column`, `count`, `percentage`.
pub fn stacked_category_counts(
    table: &Table,
    sources: &[CategorySource],
    label_column: &str,
    category_column: &str,
) -> Result<Table> {
    let total = table.height();
    let mut labels = Vec::new();
    let mut categories = Vec::new();
    let mut counts = Vec::new();
    let mut shares = Vec::new();
    for source in sources {
        for (value, n) in counted(table, &source.column)? {
            labels.push(Some(source.label.clone()));
            categories.push(Some(value));
            counts.push(Some(n as f64));
            shares.push(percentage(n, total));
        }
    }
    let columns = vec![
        (label_column.to_string(), ColumnValues::Text(labels)),
        (category_column.to_string(), ColumnValues::Text(categories)),
        (COUNT_COLUMN.to_string(), ColumnValues::Numeric(counts)),
        (PERCENTAGE_COLUMN.to_string(), ColumnValues::Numeric(shares)),
    ];
    Ok(Table::new(format!("{}_category_counts", table.name()), columns)?)
}
