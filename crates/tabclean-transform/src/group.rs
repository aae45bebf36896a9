//! Row grouping and group-and-average.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use tracing::debug;

use tabclean_model::{ColumnKind, ColumnValues, Table, format_numeric};

use crate::error::{Result, TransformError};
use crate::stats;

/// One component of a grouping key.
///
/// Numbers order by value, text lexicographically, and numbers sort before
/// text when a key mixes both.
#[derive(Debug, Clone)]
pub enum KeyValue {
    Number(f64),
    Text(String),
}

impl KeyValue {
    pub fn number(value: f64) -> Self {
        // -0.0 and 0.0 are the same key
        Self::Number(if value == 0.0 { 0.0 } else { value })
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(_) => None,
        }
    }
}

impl std::fmt::Display for KeyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(v) => f.write_str(&format_numeric(*v)),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl Ord for KeyValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for KeyValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for KeyValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyValue {}

impl Hash for KeyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Number(v) => {
                0u8.hash(state);
                v.to_bits().hash(state);
            }
            Self::Text(s) => {
                1u8.hash(state);
                s.hash(state);
            }
        }
    }
}

/// Rows sharing one grouping key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowGroup {
    pub key: Vec<KeyValue>,
    /// Row positions in original order.
    pub rows: Vec<usize>,
}

fn key_cells(table: &Table, columns: &[String]) -> Result<Vec<Vec<Option<KeyValue>>>> {
    columns
        .iter()
        .map(|column| {
            Ok(match table.values(column)? {
                ColumnValues::Numeric(values) => {
                    values.into_iter().map(|v| v.map(KeyValue::number)).collect()
                }
                ColumnValues::Text(values) => {
                    values.into_iter().map(|v| v.map(KeyValue::Text)).collect()
                }
            })
        })
        .collect()
}

/// Group rows by `columns`, in order of first appearance.
///
/// Rows with a missing key component belong to no group.
pub fn group_rows_in_order(table: &Table, columns: &[String]) -> Result<Vec<RowGroup>> {
    let cells = key_cells(table, columns)?;
    let mut index: HashMap<Vec<KeyValue>, usize> = HashMap::new();
    let mut groups: Vec<RowGroup> = Vec::new();
    let mut dropped = 0usize;

    for row in 0..table.height() {
        let key: Option<Vec<KeyValue>> = cells.iter().map(|column| column[row].clone()).collect();
        let Some(key) = key else {
            dropped += 1;
            continue;
        };
        match index.get(&key) {
            Some(&position) => groups[position].rows.push(row),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(RowGroup {
                    key,
                    rows: vec![row],
                });
            }
        }
    }

    if dropped > 0 {
        debug!(dropped, columns = ?columns, "rows with missing group key dropped");
    }
    Ok(groups)
}

/// Group rows by `columns`, in ascending key order.
pub fn group_rows(table: &Table, columns: &[String]) -> Result<Vec<RowGroup>> {
    let mut groups = group_rows_in_order(table, columns)?;
    groups.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(groups)
}

/// Rebuild the key columns of a grouped table, one value per group.
pub fn key_columns(
    table: &Table,
    columns: &[String],
    groups: &[RowGroup],
) -> Result<Vec<(String, ColumnValues)>> {
    columns
        .iter()
        .enumerate()
        .map(|(position, column)| {
            let values = match table.kind_of(column) {
                Some(ColumnKind::Numeric) => ColumnValues::Numeric(
                    groups
                        .iter()
                        .map(|g| g.key[position].as_number())
                        .collect(),
                ),
                Some(ColumnKind::Text) => ColumnValues::Text(
                    groups
                        .iter()
                        .map(|g| Some(g.key[position].to_string()))
                        .collect(),
                ),
                None => {
                    return Err(TransformError::ColumnNotFound {
                        column: column.clone(),
                    });
                }
            };
            Ok((column.clone(), values))
        })
        .collect()
}

/// Year column first, then every other text column.
pub fn default_group_columns(table: &Table, year_column: &str) -> Vec<String> {
    std::iter::once(year_column.to_string())
        .chain(
            table
                .text_columns()
                .into_iter()
                .filter(|column| column != year_column),
        )
        .collect()
}

/// Collapse rows sharing a key into one row of numeric means.
///
/// Output holds the grouping columns followed by the remaining numeric
/// columns in table order, one row per key in ascending key order.
pub fn group_and_average(table: &Table, group_columns: &[String]) -> Result<Table> {
    for column in group_columns {
        if !table.has_column(column) {
            return Err(TransformError::ColumnNotFound {
                column: column.clone(),
            });
        }
    }
    let groups = group_rows(table, group_columns)?;
    let mut columns = key_columns(table, group_columns, &groups)?;

    for column in table.numeric_columns() {
        if group_columns.contains(&column) {
            continue;
        }
        let values = table.numeric(&column)?;
        let means = groups
            .iter()
            .map(|group| {
                let members: Vec<Option<f64>> = group.rows.iter().map(|&row| values[row]).collect();
                stats::mean(&members)
            })
            .collect();
        columns.push((column, ColumnValues::Numeric(means)));
    }

    debug!(
        table = %table.name(),
        rows_in = table.height(),
        rows_out = groups.len(),
        "grouped and averaged"
    );
    Ok(Table::new(table.name(), columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn climate() -> Table {
        Table::new(
            "climate",
            vec![
                (
                    "year".to_string(),
                    ColumnValues::Numeric(vec![
                        Some(2001.0),
                        Some(2000.0),
                        Some(2001.0),
                        None,
                        Some(2000.0),
                    ]),
                ),
                (
                    "Country".to_string(),
                    ColumnValues::Text(vec![
                        Some("B".into()),
                        Some("A".into()),
                        Some("B".into()),
                        Some("A".into()),
                        Some("B".into()),
                    ]),
                ),
                (
                    "temp".to_string(),
                    ColumnValues::Numeric(vec![Some(10.0), Some(1.0), Some(20.0), Some(5.0), None]),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn key_order_is_numeric_then_text() {
        let mut keys = vec![
            KeyValue::Text("b".into()),
            KeyValue::number(10.0),
            KeyValue::number(9.0),
            KeyValue::Text("a".into()),
        ];
        keys.sort();
        let shown: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(shown, vec!["9", "10", "a", "b"]);
        assert_eq!(KeyValue::number(-0.0), KeyValue::number(0.0));
    }

    #[test]
    fn groups_keep_first_appearance_until_sorted() {
        let table = climate();
        let columns = vec!["year".to_string()];
        let in_order = group_rows_in_order(&table, &columns).unwrap();
        assert_eq!(in_order[0].key, vec![KeyValue::number(2001.0)]);
        assert_eq!(in_order[0].rows, vec![0, 2]);

        let sorted = group_rows(&table, &columns).unwrap();
        assert_eq!(sorted[0].key, vec![KeyValue::number(2000.0)]);
        assert_eq!(sorted[0].rows, vec![1, 4]);
    }

    #[test]
    fn averages_by_year_and_text_columns() {
        let table = climate();
        let columns = default_group_columns(&table, "year");
        assert_eq!(columns, vec!["year", "Country"]);

        let grouped = group_and_average(&table, &columns).unwrap();
        assert_eq!(grouped.column_names(), vec!["year", "Country", "temp"]);
        assert_eq!(
            grouped.numeric("year").unwrap(),
            vec![Some(2000.0), Some(2000.0), Some(2001.0)]
        );
        assert_eq!(
            grouped.text("Country").unwrap(),
            vec![Some("A".to_string()), Some("B".to_string()), Some("B".to_string())]
        );
        // (2000, B) has only a missing temperature.
        assert_eq!(
            grouped.numeric("temp").unwrap(),
            vec![Some(1.0), None, Some(15.0)]
        );
    }

    #[test]
    fn text_columns_outside_key_are_not_carried() {
        let table = climate();
        let grouped = group_and_average(&table, &["year".to_string()]).unwrap();
        assert_eq!(grouped.column_names(), vec!["year", "temp"]);
        assert_eq!(grouped.numeric("temp").unwrap(), vec![Some(1.0), Some(15.0)]);
    }

    #[test]
    fn unknown_group_column_is_an_error() {
        let err = group_and_average(&climate(), &["decade".to_string()]).unwrap_err();
        assert!(matches!(err, TransformError::ColumnNotFound { .. }));
    }
}
