//! Table to CSV serialization.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use tabclean_model::{ColumnValues, Table, format_numeric, format_rounded};

use crate::error::{OutputError, Result};

/// How numeric cells are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteOptions {
    /// Round numbers to this many places (trailing zeros trimmed).
    /// `None` writes the shortest representation that round-trips.
    pub decimals: Option<u32>,
}

impl WriteOptions {
    pub fn rounded(decimals: u32) -> Self {
        Self {
            decimals: Some(decimals),
        }
    }

    pub fn format(self, value: f64) -> String {
        match self.decimals {
            Some(decimals) => format_rounded(value, decimals),
            None => format_numeric(value),
        }
    }
}

/// Cells of every column rendered as strings, missing as empty.
fn rendered_columns(table: &Table, options: WriteOptions) -> Result<Vec<Vec<String>>> {
    table
        .columns()?
        .into_iter()
        .map(|(_, values)| {
            Ok(match values {
                ColumnValues::Numeric(values) => values
                    .into_iter()
                    .map(|v| v.map(|v| options.format(v)).unwrap_or_default())
                    .collect(),
                ColumnValues::Text(values) => {
                    values.into_iter().map(Option::unwrap_or_default).collect()
                }
            })
        })
        .collect()
}

/// Write `table` as CSV to any writer. `path` is only used in error messages.
pub fn write_table_to<W: Write>(
    table: &Table,
    writer: W,
    path: &Path,
    options: WriteOptions,
) -> Result<()> {
    let csv_error = |source: csv::Error| OutputError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let columns = rendered_columns(table, options)?;
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record(table.column_names())
        .map_err(csv_error)?;
    for row in 0..table.height() {
        csv_writer
            .write_record(columns.iter().map(|column| column[row].as_str()))
            .map_err(csv_error)?;
    }
    csv_writer.flush().map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Render `table` as CSV text.
pub fn render_csv(table: &Table, options: WriteOptions) -> Result<String> {
    let mut buffer = Vec::new();
    write_table_to(table, &mut buffer, Path::new("<memory>"), options)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| OutputError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Write `table` to `path`, creating parent directories.
///
/// # Errors
///
/// - [`OutputError::CreateDir`] if the parent directory cannot be created
/// - [`OutputError::Io`] / [`OutputError::Csv`] if writing fails
pub fn write_table(table: &Table, path: &Path, options: WriteOptions) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_table_to(table, BufWriter::new(file), path, options)?;
    debug!(
        path = %path.display(),
        rows = table.height(),
        columns = table.width(),
        decimals = options.decimals,
        "wrote table"
    );
    Ok(())
}
