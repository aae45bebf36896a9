//! Top-N / bottom-N rankings and percent-of-total.

use tracing::debug;

use tabclean_model::{ColumnValues, Table};
use tabclean_transform::stats;

use crate::error::{ReportError, Result, require_column, require_numeric};

fn ranked(
    table: &Table,
    column: &str,
    n: usize,
    projection: &[String],
    descending: bool,
) -> Result<Table> {
    let stat = if descending { "top_n" } else { "bottom_n" };
    let values = require_numeric(table, column, stat)?;
    for name in projection {
        require_column(table, name)?;
    }

    let mut rows: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(row, value)| value.map(|v| (row, v)))
        .collect();
    // sort_by is stable, so equal values keep table order
    if descending {
        rows.sort_by(|a, b| b.1.total_cmp(&a.1));
    } else {
        rows.sort_by(|a, b| a.1.total_cmp(&b.1));
    }
    rows.truncate(n);
    let indices: Vec<usize> = rows.into_iter().map(|(row, _)| row).collect();

    let ranked = table.take_rows(&indices)?;
    let ranked = if projection.is_empty() {
        ranked
    } else {
        ranked.select(projection)?
    };
    debug!(table = %table.name(), column, n, rows = ranked.height(), "ranked rows");
    Ok(ranked)
}

/// Rows with the `n` largest values of `column`, largest first.
///
/// Missing values never rank. An empty `projection` keeps every column.
pub fn top_n(table: &Table, column: &str, n: usize, projection: &[String]) -> Result<Table> {
    ranked(table, column, n, projection, true)
}

/// Rows with the `n` smallest values of `column`, smallest first.
pub fn bottom_n(table: &Table, column: &str, n: usize, projection: &[String]) -> Result<Table> {
    ranked(table, column, n, projection, false)
}

/// Copy of `table` with `output` = `column / sum(column) * 100`.
///
/// # Errors
///
/// Returns [`ReportError::ZeroTotal`] when the observed values sum to zero
/// (or there are none).
pub fn percent_of_total(table: &Table, column: &str, output: &str) -> Result<Table> {
    let values = require_numeric(table, column, "percent_of_total")?;
    let total = stats::sum(&values).unwrap_or_default();
    if total == 0.0 {
        return Err(ReportError::ZeroTotal {
            column: column.to_string(),
        });
    }
    let shares = values.iter().map(|v| v.map(|v| v / total * 100.0)).collect();
    let mut result = table.clone();
    result.set_column(output, ColumnValues::Numeric(shares))?;
    Ok(result)
}
