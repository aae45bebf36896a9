//! Text value rewrites and column removal.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tabclean_model::{ColumnValues, Table};

use crate::error::{Result, TransformError};

/// One replacement applied to every cell of a text column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueRewrite {
    pub column: String,
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
    /// Treat `pattern` as a regular expression instead of a literal.
    #[serde(default)]
    pub regex: bool,
}

impl ValueRewrite {
    pub fn literal(
        column: impl Into<String>,
        pattern: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            pattern: pattern.into(),
            replacement: replacement.into(),
            regex: false,
        }
    }

    pub fn regex(
        column: impl Into<String>,
        pattern: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            regex: true,
            ..Self::literal(column, pattern, replacement)
        }
    }
}

enum Matcher {
    Literal(String),
    Pattern(Regex),
}

impl Matcher {
    fn compile(rewrite: &ValueRewrite) -> Result<Self> {
        if !rewrite.regex {
            return Ok(Self::Literal(rewrite.pattern.clone()));
        }
        Regex::new(&rewrite.pattern)
            .map(Self::Pattern)
            .map_err(|e| TransformError::InvalidPattern {
                pattern: rewrite.pattern.clone(),
                message: e.to_string(),
            })
    }

    fn apply(&self, value: &str, replacement: &str) -> String {
        match self {
            Self::Literal(pattern) if pattern.is_empty() => value.to_string(),
            Self::Literal(pattern) => value.replace(pattern.as_str(), replacement),
            Self::Pattern(regex) => regex.replace_all(value, replacement).into_owned(),
        }
    }
}

/// Apply rewrites in order. Returns the number of cells changed.
///
/// # Errors
///
/// - [`TransformError::InvalidPattern`] for a regex that does not compile
/// - [`TransformError::ColumnNotFound`] for an unknown column
/// - [`TransformError::Model`] when the column is numeric
pub fn rewrite_values(table: &mut Table, rewrites: &[ValueRewrite]) -> Result<usize> {
    let matchers = rewrites
        .iter()
        .map(Matcher::compile)
        .collect::<Result<Vec<_>>>()?;

    let mut changed = 0;
    for (rewrite, matcher) in rewrites.iter().zip(&matchers) {
        let values = table.text(&rewrite.column)?;
        let mut column_changed = 0;
        let updated: Vec<Option<String>> = values
            .into_iter()
            .map(|cell| {
                cell.map(|value| {
                    let next = matcher.apply(&value, &rewrite.replacement);
                    if next != value {
                        column_changed += 1;
                    }
                    next
                })
            })
            .collect();
        if column_changed > 0 {
            table.set_column(&rewrite.column, ColumnValues::Text(updated))?;
        }
        debug!(
            column = %rewrite.column,
            pattern = %rewrite.pattern,
            changed = column_changed,
            "applied rewrite"
        );
        changed += column_changed;
    }
    Ok(changed)
}

/// Remove the named columns that exist; unknown names are skipped.
///
/// Returns the columns actually removed.
pub fn drop_columns(table: &mut Table, columns: &[String]) -> Result<Vec<String>> {
    let mut dropped = Vec::new();
    for column in columns {
        if table.has_column(column) {
            table.drop_column(column)?;
            dropped.push(column.clone());
        } else {
            warn!(table = %table.name(), column = %column, "column to drop not present");
        }
    }
    Ok(dropped)
}
