//! Stacking groups of related columns into long rows.
//!
//! A generalization of melt for sources where each measure spans several
//! columns, e.g. an AQI value and its category per pollutant.

use serde::{Deserialize, Serialize};
use tracing::debug;

use tabclean_model::{ColumnKind, ColumnValues, Table, format_numeric};

use crate::error::{Result, TransformError};

/// Columns stacked under one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackGroup {
    pub label: String,
    /// Source columns, positionally matching [`StackSpec::output_columns`].
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackSpec {
    pub id_columns: Vec<String>,
    /// Name of the column holding each group's label.
    pub label_name: String,
    pub output_columns: Vec<String>,
    pub groups: Vec<StackGroup>,
}

/// Concatenate one block of rows per group: id columns, the group label,
/// then the group's columns renamed to `output_columns`.
///
/// An output column is numeric when every group's source for it is numeric.
pub fn stack(table: &Table, spec: &StackSpec) -> Result<Table> {
    for group in &spec.groups {
        if group.columns.len() != spec.output_columns.len() {
            return Err(TransformError::GroupWidth {
                group: group.label.clone(),
                expected: spec.output_columns.len(),
                actual: group.columns.len(),
            });
        }
        for column in spec.id_columns.iter().chain(&group.columns) {
            if !table.has_column(column) {
                return Err(TransformError::ColumnNotFound {
                    column: column.clone(),
                });
            }
        }
    }

    let height = table.height();
    let rows: Vec<usize> = spec.groups.iter().flat_map(|_| 0..height).collect();

    let mut columns = Vec::with_capacity(spec.id_columns.len() + 1 + spec.output_columns.len());
    for id in &spec.id_columns {
        columns.push((id.clone(), table.values(id)?.take(&rows)));
    }
    let labels = spec
        .groups
        .iter()
        .flat_map(|group| std::iter::repeat_n(Some(group.label.clone()), height))
        .collect();
    columns.push((spec.label_name.clone(), ColumnValues::Text(labels)));

    for (position, output) in spec.output_columns.iter().enumerate() {
        let numeric = spec
            .groups
            .iter()
            .all(|group| table.kind_of(&group.columns[position]) == Some(ColumnKind::Numeric));
        let values = if numeric {
            let mut stacked = Vec::with_capacity(rows.len());
            for group in &spec.groups {
                stacked.extend(table.numeric(&group.columns[position])?);
            }
            ColumnValues::Numeric(stacked)
        } else {
            let mut stacked = Vec::with_capacity(rows.len());
            for group in &spec.groups {
                stacked.extend(
                    table
                        .values(&group.columns[position])
                        .map(|values| match values {
                            ColumnValues::Numeric(v) => {
                                v.into_iter().map(|v| v.map(format_numeric)).collect::<Vec<_>>()
                            }
                            ColumnValues::Text(v) => v,
                        })?,
                );
            }
            ColumnValues::Text(stacked)
        };
        columns.push((output.clone(), values));
    }

    debug!(
        table = %table.name(),
        groups = spec.groups.len(),
        rows_out = rows.len(),
        "stacked column groups"
    );
    Ok(Table::new(table.name(), columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stacks_pollutant_pairs() {
        let table = Table::new(
            "air",
            vec![
                (
                    "city_name".to_string(),
                    ColumnValues::Text(vec![Some("Delhi".into()), Some("Oslo".into())]),
                ),
                ("aqi_value".to_string(), ColumnValues::Numeric(vec![Some(187.0), Some(20.0)])),
                (
                    "aqi_category".to_string(),
                    ColumnValues::Text(vec![Some("Unhealthy".into()), Some("Good".into())]),
                ),
                ("co_aqi_value".to_string(), ColumnValues::Numeric(vec![Some(3.0), Some(1.0)])),
                (
                    "co_aqi_category".to_string(),
                    ColumnValues::Text(vec![Some("Good".into()), Some("Good".into())]),
                ),
            ],
        )
        .unwrap();
        let spec = StackSpec {
            id_columns: vec!["city_name".to_string()],
            label_name: "pollutant".to_string(),
            output_columns: vec!["aqi_value".to_string(), "aqi_category".to_string()],
            groups: vec![
                StackGroup {
                    label: "Overall AQI".to_string(),
                    columns: vec!["aqi_value".to_string(), "aqi_category".to_string()],
                },
                StackGroup {
                    label: "Carbon Monoxide".to_string(),
                    columns: vec!["co_aqi_value".to_string(), "co_aqi_category".to_string()],
                },
            ],
        };

        let long = stack(&table, &spec).unwrap();
        assert_eq!(
            long.column_names(),
            vec!["city_name", "pollutant", "aqi_value", "aqi_category"]
        );
        assert_eq!(long.height(), 4);
        assert_eq!(
            long.numeric("aqi_value").unwrap(),
            vec![Some(187.0), Some(20.0), Some(3.0), Some(1.0)]
        );
        assert_eq!(
            long.text("city_name").unwrap()[2],
            Some("Delhi".to_string())
        );
        assert_eq!(
            long.text("pollutant").unwrap()[3],
            Some("Carbon Monoxide".to_string())
        );
    }
}
