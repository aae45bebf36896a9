//! The [`Table`] type: a polars frame paired with an explicit column schema.
//!
//! Every column is stored either as `Float64` (numeric) or `String` (text);
//! missing cells are nulls. The schema records the kind of each column in
//! frame order so callers never have to sniff polars dtypes.

use polars::prelude::{Column, DataFrame, NamedFrom, Series};

use crate::error::{ModelError, Result};
use crate::schema::{ColumnKind, TableSchema};

/// Owned values of a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnValues {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Numeric(_) => ColumnKind::Numeric,
            Self::Text(_) => ColumnKind::Text,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(values) => values.len(),
            Self::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_missing(&self, idx: usize) -> bool {
        match self {
            Self::Numeric(values) => values.get(idx).is_none_or(Option::is_none),
            Self::Text(values) => values.get(idx).is_none_or(Option::is_none),
        }
    }

    /// Values at the given row positions, in the given order.
    pub fn take(&self, indices: &[usize]) -> Self {
        match self {
            Self::Numeric(values) => Self::Numeric(
                indices
                    .iter()
                    .map(|&idx| values.get(idx).copied().flatten())
                    .collect(),
            ),
            Self::Text(values) => Self::Text(
                indices
                    .iter()
                    .map(|&idx| values.get(idx).cloned().flatten())
                    .collect(),
            ),
        }
    }

    fn to_column(&self, name: &str) -> Column {
        match self {
            Self::Numeric(values) => Series::new(name.into(), values.as_slice()).into(),
            Self::Text(values) => Series::new(name.into(), values.as_slice()).into(),
        }
    }
}

/// A named in-memory table.
///
/// Rows have no identity beyond position. Column order is insertion order.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    frame: DataFrame,
    schema: TableSchema,
}

impl Table {
    /// Build a table from ordered columns.
    ///
    /// # Errors
    ///
    /// Returns an error if two columns share a name or the columns differ in length.
    pub fn new(name: impl Into<String>, columns: Vec<(String, ColumnValues)>) -> Result<Self> {
        let mut schema = TableSchema::new();
        let expected = columns.first().map(|(_, values)| values.len());
        let mut frame_columns: Vec<Column> = Vec::with_capacity(columns.len());
        for (column, values) in &columns {
            if schema.contains(column) {
                return Err(ModelError::DuplicateColumn {
                    column: column.clone(),
                });
            }
            if let Some(expected) = expected
                && values.len() != expected
            {
                return Err(ModelError::LengthMismatch {
                    column: column.clone(),
                    expected,
                    actual: values.len(),
                });
            }
            schema.push(column, values.kind());
            frame_columns.push(values.to_column(column));
        }
        let frame = DataFrame::new(frame_columns)?;
        Ok(Self {
            name: name.into(),
            frame,
            schema,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.schema.len()
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// The backing polars frame.
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.names()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.schema.contains(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.schema.kind_of(name)
    }

    pub fn numeric_columns(&self) -> Vec<String> {
        self.schema.names_of_kind(ColumnKind::Numeric)
    }

    pub fn text_columns(&self) -> Vec<String> {
        self.schema.names_of_kind(ColumnKind::Text)
    }

    fn require(&self, name: &str) -> Result<ColumnKind> {
        self.schema
            .kind_of(name)
            .ok_or_else(|| ModelError::ColumnNotFound {
                column: name.to_string(),
            })
    }

    /// Values of a numeric column.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is absent or holds text.
    pub fn numeric(&self, name: &str) -> Result<Vec<Option<f64>>> {
        if self.require(name)? != ColumnKind::Numeric {
            return Err(ModelError::NotNumeric {
                column: name.to_string(),
            });
        }
        let series = self.frame.column(name)?.as_materialized_series();
        Ok(series.f64()?.into_iter().collect())
    }

    /// Values of a text column.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is absent or holds numbers.
    pub fn text(&self, name: &str) -> Result<Vec<Option<String>>> {
        if self.require(name)? != ColumnKind::Text {
            return Err(ModelError::NotText {
                column: name.to_string(),
            });
        }
        let series = self.frame.column(name)?.as_materialized_series();
        Ok(series
            .str()?
            .into_iter()
            .map(|value| value.map(str::to_string))
            .collect())
    }

    /// Values of any column.
    pub fn values(&self, name: &str) -> Result<ColumnValues> {
        match self.require(name)? {
            ColumnKind::Numeric => self.numeric(name).map(ColumnValues::Numeric),
            ColumnKind::Text => self.text(name).map(ColumnValues::Text),
        }
    }

    /// All columns in table order.
    pub fn columns(&self) -> Result<Vec<(String, ColumnValues)>> {
        self.schema
            .iter()
            .map(|spec| Ok((spec.name.clone(), self.values(&spec.name)?)))
            .collect()
    }

    /// Replace a column in place, or append it if the name is new.
    ///
    /// The column keeps its position on replacement; its kind may change.
    ///
    /// # Errors
    ///
    /// Returns an error if the value count differs from the table height.
    pub fn set_column(&mut self, name: &str, values: ColumnValues) -> Result<()> {
        if self.width() > 0 && values.len() != self.height() {
            return Err(ModelError::LengthMismatch {
                column: name.to_string(),
                expected: self.height(),
                actual: values.len(),
            });
        }
        let kind = values.kind();
        self.frame.with_column(values.to_column(name))?;
        match self.schema.position(name) {
            Some(index) => self.schema.set_kind(index, kind),
            None => self.schema.push(name, kind),
        }
        Ok(())
    }

    /// Remove a column.
    pub fn drop_column(&mut self, name: &str) -> Result<()> {
        let index = self
            .schema
            .position(name)
            .ok_or_else(|| ModelError::ColumnNotFound {
                column: name.to_string(),
            })?;
        self.frame.drop_in_place(name)?;
        self.schema.remove(index);
        Ok(())
    }

    /// New table holding the given rows, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Result<Self> {
        let height = self.height();
        if let Some(&index) = indices.iter().find(|&&idx| idx >= height) {
            return Err(ModelError::RowOutOfBounds { index, height });
        }
        let columns = self
            .columns()?
            .into_iter()
            .map(|(name, values)| (name, values.take(indices)))
            .collect();
        Self::new(self.name.clone(), columns)
    }

    /// New table holding only the named columns, in the given order.
    pub fn select(&self, names: &[String]) -> Result<Self> {
        let columns = names
            .iter()
            .map(|name| Ok((name.clone(), self.values(name)?)))
            .collect::<Result<Vec<_>>>()?;
        Self::new(self.name.clone(), columns)
    }

    /// Display form of every cell of a column, numbers formatted as written to CSV.
    pub fn display_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        Ok(match self.values(name)? {
            ColumnValues::Numeric(values) => values
                .into_iter()
                .map(|v| v.map(crate::values::format_numeric))
                .collect(),
            ColumnValues::Text(values) => values,
        })
    }
}
