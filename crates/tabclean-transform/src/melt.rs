//! Wide-to-long reshaping.

use serde::{Deserialize, Serialize};
use tracing::debug;

use tabclean_model::{ColumnKind, ColumnValues, Table, format_numeric, parse_f64};

use crate::error::{Result, TransformError};

fn default_key_name() -> String {
    "variable".to_string()
}

fn default_value_name() -> String {
    "value".to_string()
}

/// Parameters of a melt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeltSpec {
    /// Columns repeated on every output row.
    pub id_columns: Vec<String>,
    /// Columns folded into key/value pairs. Empty means every non-id column.
    #[serde(default)]
    pub value_columns: Vec<String>,
    #[serde(default = "default_key_name")]
    pub key_name: String,
    #[serde(default = "default_value_name")]
    pub value_name: String,
    /// Prefix removed from each key (`F1992` becomes `1992`).
    #[serde(default)]
    pub strip_key_prefix: Option<String>,
    /// Store keys as numbers instead of text.
    #[serde(default)]
    pub numeric_keys: bool,
}

impl MeltSpec {
    pub fn new(id_columns: Vec<String>, value_columns: Vec<String>) -> Self {
        Self {
            id_columns,
            value_columns,
            key_name: default_key_name(),
            value_name: default_value_name(),
            strip_key_prefix: None,
            numeric_keys: false,
        }
    }

    #[must_use]
    pub fn with_names(mut self, key_name: impl Into<String>, value_name: impl Into<String>) -> Self {
        self.key_name = key_name.into();
        self.value_name = value_name.into();
        self
    }

    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.strip_key_prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn with_numeric_keys(mut self) -> Self {
        self.numeric_keys = true;
        self
    }

    fn resolve_value_columns(&self, table: &Table) -> Vec<String> {
        if self.value_columns.is_empty() {
            table
                .column_names()
                .into_iter()
                .filter(|name| !self.id_columns.iter().any(|id| id == name))
                .map(str::to_string)
                .collect()
        } else {
            self.value_columns.clone()
        }
    }

    fn key_for(&self, column: &str) -> String {
        match &self.strip_key_prefix {
            Some(prefix) => column.strip_prefix(prefix.as_str()).unwrap_or(column).to_string(),
            None => column.to_string(),
        }
    }
}

/// Fold value columns into key/value rows.
///
/// Rows are emitted value-column-major: every row for the first value
/// column, then every row for the second, and so on. Cells that are missing
/// produce no row.
///
/// # Errors
///
/// - [`TransformError::ColumnNotFound`] for an unknown id or value column
/// - [`TransformError::InvalidKey`] when `numeric_keys` is set and a key does not parse
/// - [`TransformError::DuplicateColumn`] when the key or value name clashes with an id column
pub fn melt(table: &Table, spec: &MeltSpec) -> Result<Table> {
    let value_columns = spec.resolve_value_columns(table);
    for column in spec.id_columns.iter().chain(&value_columns) {
        if !table.has_column(column) {
            return Err(TransformError::ColumnNotFound {
                column: column.clone(),
            });
        }
    }

    let all_numeric = value_columns
        .iter()
        .all(|column| table.kind_of(column) == Some(ColumnKind::Numeric));

    let mut rows: Vec<usize> = Vec::new();
    let mut text_keys: Vec<Option<String>> = Vec::new();
    let mut numeric_keys: Vec<Option<f64>> = Vec::new();
    let mut numbers: Vec<Option<f64>> = Vec::new();
    let mut texts: Vec<Option<String>> = Vec::new();

    for column in &value_columns {
        let key = spec.key_for(column);
        let numeric_key = if spec.numeric_keys {
            Some(parse_f64(&key).ok_or_else(|| TransformError::InvalidKey {
                column: column.clone(),
                key: key.clone(),
            })?)
        } else {
            None
        };

        let cells: Vec<Option<String>> = match table.values(column)? {
            ColumnValues::Numeric(values) => {
                if all_numeric {
                    for (row, value) in values.into_iter().enumerate() {
                        if let Some(value) = value {
                            rows.push(row);
                            numbers.push(Some(value));
                            text_keys.push(Some(key.clone()));
                            numeric_keys.push(numeric_key);
                        }
                    }
                    continue;
                }
                values.into_iter().map(|v| v.map(format_numeric)).collect()
            }
            ColumnValues::Text(values) => values,
        };
        for (row, cell) in cells.into_iter().enumerate() {
            if let Some(cell) = cell {
                rows.push(row);
                texts.push(Some(cell));
                text_keys.push(Some(key.clone()));
                numeric_keys.push(numeric_key);
            }
        }
    }

    let mut columns = Vec::with_capacity(spec.id_columns.len() + 2);
    for id in &spec.id_columns {
        columns.push((id.clone(), table.values(id)?.take(&rows)));
    }
    let keys = if spec.numeric_keys {
        ColumnValues::Numeric(numeric_keys)
    } else {
        ColumnValues::Text(text_keys)
    };
    columns.push((spec.key_name.clone(), keys));
    let values = if all_numeric {
        ColumnValues::Numeric(numbers)
    } else {
        ColumnValues::Text(texts)
    };
    columns.push((spec.value_name.clone(), values));

    debug!(
        table = %table.name(),
        value_columns = value_columns.len(),
        rows_out = rows.len(),
        "melted table"
    );
    Ok(Table::new(table.name(), columns)?)
}
