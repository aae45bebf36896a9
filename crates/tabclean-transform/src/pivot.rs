//! Long-to-wide reshaping and period-over-period change columns.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use tabclean_model::{ColumnKind, ColumnValues, Table, format_numeric, parse_f64, round_to};

use crate::error::{Result, TransformError};
use crate::group::{group_rows_in_order, key_columns};
use crate::stats;

pub const CHANGE_ABSOLUTE: &str = "Change_Absolute";
pub const CHANGE_PERCENT: &str = "Change_Percent";

/// Parameters of a pivot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PivotSpec {
    /// Columns identifying an output row.
    pub index_columns: Vec<String>,
    /// Column whose distinct values become new columns.
    pub key_column: String,
    /// Column holding the cell values.
    pub value_column: String,
}

impl PivotSpec {
    pub fn new(
        index_columns: Vec<String>,
        key_column: impl Into<String>,
        value_column: impl Into<String>,
    ) -> Self {
        Self {
            index_columns,
            key_column: key_column.into(),
            value_column: value_column.into(),
        }
    }
}

fn key_names(table: &Table, column: &str) -> Result<Vec<Option<String>>> {
    Ok(match table.values(column)? {
        ColumnValues::Numeric(values) => values.into_iter().map(|v| v.map(format_numeric)).collect(),
        ColumnValues::Text(values) => values,
    })
}

/// Spread a key column into one column per distinct key.
///
/// Output rows follow the first appearance of each index combination and new
/// columns the first appearance of each key, so pivoting a melted table
/// restores the wide layout. Duplicate numeric cells are averaged; duplicate
/// text cells keep the first value. Rows with a missing index or key are
/// dropped.
///
/// # Errors
///
/// - [`TransformError::ColumnNotFound`] for an unknown column
/// - [`TransformError::DuplicateColumn`] when a key names an index column
pub fn pivot(table: &Table, spec: &PivotSpec) -> Result<Table> {
    for column in spec
        .index_columns
        .iter()
        .chain([&spec.key_column, &spec.value_column])
    {
        if !table.has_column(column) {
            return Err(TransformError::ColumnNotFound {
                column: column.clone(),
            });
        }
    }

    let keys = key_names(table, &spec.key_column)?;
    let kept: Vec<usize> = keys
        .iter()
        .enumerate()
        .filter(|(_, key)| key.is_some())
        .map(|(row, _)| row)
        .collect();
    let table = table.take_rows(&kept)?;
    let keys: Vec<String> = kept
        .iter()
        .filter_map(|&row| keys[row].clone())
        .collect();

    let groups = group_rows_in_order(&table, &spec.index_columns)?;

    let mut grouped = vec![false; table.height()];
    for group in &groups {
        for &row in &group.rows {
            grouped[row] = true;
        }
    }

    let mut new_columns: Vec<String> = Vec::new();
    let mut key_position: HashMap<&str, usize> = HashMap::new();
    for (row, key) in keys.iter().enumerate() {
        if grouped[row] {
            let key = key.as_str();
            if !key_position.contains_key(key) {
                if spec.index_columns.iter().any(|index| index == key) {
                    return Err(TransformError::DuplicateColumn {
                        column: key.to_string(),
                    });
                }
                key_position.insert(key, new_columns.len());
                new_columns.push(key.to_string());
            }
        }
    }

    let mut columns = key_columns(&table, &spec.index_columns, &groups)?;
    match table.values(&spec.value_column)? {
        ColumnValues::Numeric(values) => {
            let mut cells: Vec<Vec<Vec<Option<f64>>>> =
                vec![vec![Vec::new(); groups.len()]; new_columns.len()];
            for (position, group) in groups.iter().enumerate() {
                for &row in &group.rows {
                    cells[key_position[keys[row].as_str()]][position].push(values[row]);
                }
            }
            for (name, column) in new_columns.iter().zip(cells) {
                let averaged = column.iter().map(|members| stats::mean(members)).collect();
                columns.push((name.clone(), ColumnValues::Numeric(averaged)));
            }
        }
        ColumnValues::Text(values) => {
            let mut cells: Vec<Vec<Option<String>>> =
                vec![vec![None; groups.len()]; new_columns.len()];
            for (position, group) in groups.iter().enumerate() {
                for &row in &group.rows {
                    let slot = &mut cells[key_position[keys[row].as_str()]][position];
                    if slot.is_none() {
                        slot.clone_from(&values[row]);
                    }
                }
            }
            for (name, column) in new_columns.iter().zip(cells) {
                columns.push((name.clone(), ColumnValues::Text(column)));
            }
        }
    }

    debug!(
        table = %table.name(),
        rows_out = groups.len(),
        new_columns = new_columns.len(),
        "pivoted table"
    );
    Ok(Table::new(table.name(), columns)?)
}

/// First and last period among `columns`.
///
/// When every name is numeric (years) the smallest and largest win;
/// otherwise list order decides.
fn change_span(columns: &[String]) -> Option<(&str, &str)> {
    let numeric: Option<Vec<(f64, &str)>> = columns
        .iter()
        .map(|name| parse_f64(name).map(|v| (v, name.as_str())))
        .collect();
    match numeric {
        Some(mut named) if !named.is_empty() => {
            named.sort_by(|a, b| a.0.total_cmp(&b.0));
            Some((named[0].1, named[named.len() - 1].1))
        }
        _ => Some((columns.first()?.as_str(), columns.last()?.as_str())),
    }
}

/// Append `Change_Absolute` and `Change_Percent` between the first and last
/// of `columns`.
///
/// The percentage is rounded to two places and missing when the first value
/// is zero or either side is missing.
pub fn append_change_columns(table: &mut Table, columns: &[String]) -> Result<()> {
    let Some((first, last)) = change_span(columns) else {
        return Ok(());
    };
    for column in [first, last] {
        if table.kind_of(column) != Some(ColumnKind::Numeric) {
            return Err(match table.kind_of(column) {
                None => TransformError::ColumnNotFound {
                    column: column.to_string(),
                },
                Some(_) => TransformError::NotNumeric {
                    column: column.to_string(),
                },
            });
        }
    }
    for name in [CHANGE_ABSOLUTE, CHANGE_PERCENT] {
        if table.has_column(name) {
            return Err(TransformError::DuplicateColumn {
                column: name.to_string(),
            });
        }
    }

    let start = table.numeric(first)?;
    let end = table.numeric(last)?;
    let absolute: Vec<Option<f64>> = start
        .iter()
        .zip(&end)
        .map(|(a, b)| Some((*b)? - (*a)?))
        .collect();
    let percent: Vec<Option<f64>> = start
        .iter()
        .zip(&absolute)
        .map(|(a, diff)| match (*a, *diff) {
            (Some(a), Some(diff)) if a != 0.0 => Some(round_to(diff / a * 100.0, 2)),
            _ => None,
        })
        .collect();

    table.set_column(CHANGE_ABSOLUTE, ColumnValues::Numeric(absolute))?;
    table.set_column(CHANGE_PERCENT, ColumnValues::Numeric(percent))?;
    debug!(first, last, "appended change columns");
    Ok(())
}
