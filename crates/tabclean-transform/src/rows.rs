//! Row-level operations: sorting, filtering and distinct values.

use std::cmp::Ordering;

use tabclean_model::{ColumnValues, Table};

use crate::error::{Result, TransformError};
use crate::group::KeyValue;

fn column_keys(table: &Table, column: &str) -> Result<Vec<Option<KeyValue>>> {
    Ok(match table.values(column)? {
        ColumnValues::Numeric(values) => values.into_iter().map(|v| v.map(KeyValue::number)).collect(),
        ColumnValues::Text(values) => values.into_iter().map(|v| v.map(KeyValue::Text)).collect(),
    })
}

/// Missing sorts after every present value.
fn compare_missing_last(a: Option<&KeyValue>, b: Option<&KeyValue>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable ascending sort by `columns`, missing values last.
pub fn sort_rows(table: &Table, columns: &[String]) -> Result<Table> {
    let keys = columns
        .iter()
        .map(|column| column_keys(table, column))
        .collect::<Result<Vec<_>>>()?;
    let mut order: Vec<usize> = (0..table.height()).collect();
    order.sort_by(|&a, &b| {
        keys.iter()
            .map(|column| compare_missing_last(column[a].as_ref(), column[b].as_ref()))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });
    Ok(table.take_rows(&order)?)
}

/// Rows where `column` equals `value`.
///
/// Numeric cells are compared in their CSV rendering, so every value returned
/// by [`distinct_values`] selects its rows.
pub fn filter_equals(table: &Table, column: &str, value: &str) -> Result<Table> {
    let rows: Vec<usize> = column_keys(table, column)?
        .iter()
        .enumerate()
        .filter(|(_, key)| key.as_ref().is_some_and(|key| key.to_string() == value))
        .map(|(row, _)| row)
        .collect();
    Ok(table.take_rows(&rows)?)
}

/// Distinct non-missing values of a column in first-appearance order.
///
/// Numeric values are rendered the way they are written to CSV.
pub fn distinct_values(table: &Table, column: &str) -> Result<Vec<String>> {
    if !table.has_column(column) {
        return Err(TransformError::ColumnNotFound {
            column: column.to_string(),
        });
    }
    let mut seen = std::collections::HashSet::new();
    Ok(column_keys(table, column)?
        .into_iter()
        .flatten()
        .filter(|key| seen.insert(key.clone()))
        .map(|key| key.to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cities() -> Table {
        Table::new(
            "cities",
            vec![
                (
                    "country".to_string(),
                    ColumnValues::Text(vec![
                        Some("India".into()),
                        Some("Chad".into()),
                        None,
                        Some("India".into()),
                    ]),
                ),
                (
                    "aqi".to_string(),
                    ColumnValues::Numeric(vec![Some(150.0), None, Some(20.0), Some(90.0)]),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn sort_places_missing_last_and_is_stable() {
        let sorted = sort_rows(&cities(), &["country".to_string()]).unwrap();
        assert_eq!(sorted.numeric("aqi").unwrap(), vec![None, Some(150.0), Some(90.0), Some(20.0)]);

        let sorted = sort_rows(&cities(), &["aqi".to_string()]).unwrap();
        assert_eq!(sorted.numeric("aqi").unwrap(), vec![Some(20.0), Some(90.0), Some(150.0), None]);
    }

    #[test]
    fn sort_by_several_columns() {
        let sorted = sort_rows(&cities(), &["country".to_string(), "aqi".to_string()]).unwrap();
        assert_eq!(sorted.numeric("aqi").unwrap(), vec![None, Some(90.0), Some(150.0), Some(20.0)]);
    }

    #[test]
    fn filter_keeps_matching_rows() {
        let india = filter_equals(&cities(), "country", "India").unwrap();
        assert_eq!(india.height(), 2);
        assert_eq!(india.numeric("aqi").unwrap(), vec![Some(150.0), Some(90.0)]);
    }

    #[test]
    fn filter_matches_numeric_cells_by_rendering() {
        let table = cities();
        for value in distinct_values(&table, "aqi").unwrap() {
            assert_eq!(filter_equals(&table, "aqi", &value).unwrap().height(), 1);
        }
        let rows = filter_equals(&table, "aqi", "150").unwrap();
        assert_eq!(rows.text("country").unwrap(), vec![Some("India".to_string())]);
        assert_eq!(filter_equals(&table, "aqi", "150.0").unwrap().height(), 0);
    }

    #[test]
    fn filter_on_absent_column_is_an_error() {
        let err = filter_equals(&cities(), "city", "Delhi").unwrap_err();
        assert!(matches!(err, TransformError::ColumnNotFound { .. }));
    }

    #[test]
    fn distinct_values_in_first_appearance_order() {
        assert_eq!(distinct_values(&cities(), "country").unwrap(), vec!["India", "Chad"]);
        assert_eq!(distinct_values(&cities(), "aqi").unwrap(), vec!["150", "20", "90"]);
    }
}
