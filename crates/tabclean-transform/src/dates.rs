//! Date-to-year normalization.
//!
//! Date cells in the climate sources come in several layouts. Each cell is
//! reduced to its calendar year; cells that cannot be read become missing.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use tabclean_model::{ColumnValues, Table, format_numeric};

use crate::error::Result;

static YEAR_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})$").expect("Invalid year regex"));

/// YYYY-MM-DD
static YEAR_FIRST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-\d{2}-\d{2}$").expect("Invalid year-first regex"));

/// DD-MM-YYYY
static YEAR_LAST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}-\d{2}-(\d{4})$").expect("Invalid year-last regex"));

/// Extract the calendar year from a date string.
///
/// Total over strings: anything unreadable yields `None`.
///
/// # Examples
///
/// ```
/// use tabclean_transform::parse_year;
///
/// assert_eq!(parse_year("2021"), Some(2021));
/// assert_eq!(parse_year("2021-03-15"), Some(2021));
/// assert_eq!(parse_year("15-03-2021"), Some(2021));
/// assert_eq!(parse_year("not-a-date"), None);
/// ```
pub fn parse_year(value: &str) -> Option<i32> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    for pattern in [&*YEAR_ONLY, &*YEAR_FIRST, &*YEAR_LAST] {
        if let Some(caps) = pattern.captures(trimmed) {
            return caps.get(1).and_then(|m| m.as_str().parse().ok());
        }
    }

    try_parse_datetime(trimmed)
        .map(|dt| dt.year())
        .or_else(|| try_parse_date(trimmed).map(|d| d.year()))
        .or_else(|| try_parse_year_month(trimmed))
}

fn try_parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
    ];
    formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

fn try_parse_date(value: &str) -> Option<NaiveDate> {
    let formats = [
        "%Y/%m/%d",
        "%d/%m/%Y",  // 15/01/2024
        "%m/%d/%Y",  // 01/15/2024
        "%d.%m.%Y",  // 15.01.2024
        "%d-%b-%Y",  // 15-Jan-2024
        "%d %b %Y",  // 15 Jan 2024
        "%d %B %Y",  // 15 January 2024
        "%b %d, %Y", // Jan 15, 2024
        "%B %d, %Y", // January 15, 2024
        "%Y%m%d",    // 20240115
    ];
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// `YYYY-MM`, `YYYY/MM`, `Jan 2024` and friends.
fn try_parse_year_month(value: &str) -> Option<i32> {
    let formats = ["%Y-%m", "%Y/%m", "%m/%Y", "%b %Y", "%B %Y"];
    let padded = format!("{value} 01");
    formats.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(&padded, &format!("{fmt} %d"))
            .ok()
            .map(|d| d.year())
    })
}

/// Columns whose lower-cased name contains `date`.
pub fn detect_date_columns(table: &Table) -> Vec<String> {
    table
        .column_names()
        .into_iter()
        .filter(|name| name.to_lowercase().contains("date"))
        .map(str::to_string)
        .collect()
}

/// Outcome of normalizing one date column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearNormalization {
    pub column: String,
    /// Cells that became a year.
    pub parsed: usize,
    /// Non-missing cells that could not be read as a date.
    pub unparsed: usize,
}

/// Replace `column` with a numeric column of calendar years.
///
/// Works on text and numeric columns alike; the column keeps its position.
pub fn normalize_year_column(table: &mut Table, column: &str) -> Result<YearNormalization> {
    let cells: Vec<Option<String>> = match table.values(column)? {
        ColumnValues::Text(values) => values,
        ColumnValues::Numeric(values) => values
            .into_iter()
            .map(|v| v.map(format_numeric))
            .collect(),
    };

    let mut parsed = 0;
    let mut unparsed = 0;
    let years: Vec<Option<f64>> = cells
        .iter()
        .map(|cell| {
            let cell = cell.as_deref()?;
            let year = parse_year(cell);
            if year.is_some() {
                parsed += 1;
            } else {
                unparsed += 1;
            }
            year.map(f64::from)
        })
        .collect();

    table.set_column(column, ColumnValues::Numeric(years))?;
    debug!(column, parsed, unparsed, "normalized date column to year");
    Ok(YearNormalization {
        column: column.to_string(),
        parsed,
        unparsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_layouts() {
        assert_eq!(parse_year("1850"), Some(1850));
        assert_eq!(parse_year(" 1750-01-01 "), Some(1750));
        assert_eq!(parse_year("01-12-1999"), Some(1999));
    }

    #[test]
    fn generic_layouts() {
        assert_eq!(parse_year("2013/09/01"), Some(2013));
        assert_eq!(parse_year("2013-09"), Some(2013));
        assert_eq!(parse_year("2013-09-01T12:00:00"), Some(2013));
        assert_eq!(parse_year("2013-09-01 12:00:00"), Some(2013));
        assert_eq!(parse_year("25/12/2013"), Some(2013));
        assert_eq!(parse_year("12/25/2013"), Some(2013));
        assert_eq!(parse_year("1 Sep 2013"), Some(2013));
        assert_eq!(parse_year("Sep 1, 2013"), Some(2013));
        assert_eq!(parse_year("September 1, 2013"), Some(2013));
    }

    #[test]
    fn unreadable_values_are_missing() {
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("   "), None);
        assert_eq!(parse_year("not-a-date"), None);
        assert_eq!(parse_year("2013-13-45T99"), None);
    }

    #[test]
    fn detects_date_columns_by_name() {
        let table = Table::new(
            "t",
            vec![
                ("Date".to_string(), ColumnValues::Text(vec![None])),
                ("record_date_utc".to_string(), ColumnValues::Text(vec![None])),
                ("dt".to_string(), ColumnValues::Text(vec![None])),
            ],
        )
        .unwrap();
        assert_eq!(detect_date_columns(&table), vec!["Date", "record_date_utc"]);
    }

    #[test]
    fn normalizes_text_column_in_place() {
        let mut table = Table::new(
            "t",
            vec![
                (
                    "date".to_string(),
                    ColumnValues::Text(vec![
                        Some("2001-05-01".into()),
                        Some("garbage".into()),
                        None,
                    ]),
                ),
                (
                    "temp".to_string(),
                    ColumnValues::Numeric(vec![Some(1.0), Some(2.0), Some(3.0)]),
                ),
            ],
        )
        .unwrap();
        let outcome = normalize_year_column(&mut table, "date").unwrap();
        assert_eq!(outcome.parsed, 1);
        assert_eq!(outcome.unparsed, 1);
        assert_eq!(table.column_names(), vec!["date", "temp"]);
        assert_eq!(table.numeric("date").unwrap(), vec![Some(2001.0), None, None]);
    }
}
