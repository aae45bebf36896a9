//! CSV file reading into typed tables.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, warn};

use tabclean_model::{ColumnKind, ColumnValues, Table, is_null_token, parse_f64};

use crate::error::{IngestError, Result};
use crate::infer::infer_kind;
use crate::options::LoadOptions;

/// Trim a header cell, drop any BOM and collapse inner whitespace (tabs included).
pub fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_cell(raw: &str, null_tokens: &[String]) -> Option<String> {
    let cleaned = raw.trim().trim_matches('\u{feff}');
    if is_null_token(cleaned, null_tokens) {
        None
    } else {
        Some(cleaned.to_string())
    }
}

fn open_error(path: &Path, source: std::io::Error) -> IngestError {
    if source.kind() == std::io::ErrorKind::NotFound {
        IngestError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else {
        IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn parse_error(path: &Path, err: &csv::Error) -> IngestError {
    IngestError::CsvParse {
        path: path.to_path_buf(),
        line: err.position().map(csv::Position::line),
        message: err.to_string(),
    }
}

/// Reads a CSV file into a [`Table`] named after the file stem.
///
/// # Errors
///
/// - [`IngestError::FileNotFound`] when the path does not exist
/// - [`IngestError::CsvParse`] for malformed records or inconsistent field counts
/// - [`IngestError::InvalidValue`] when a declared numeric column holds text
pub fn read_table(path: &Path, options: &LoadOptions) -> Result<Table> {
    let file = File::open(path).map_err(|e| open_error(path, e))?;
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("table");
    read_table_from_reader(name, file, path, options)
}

/// Reads CSV text from any reader. `source` is only used in error messages.
pub fn read_table_from_reader<R: Read>(
    name: &str,
    input: R,
    source: &Path,
    options: &LoadOptions,
) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(input);

    let Headers {
        mut names,
        trailing_blank,
    } = read_headers(&mut reader, source)?;
    let width = names.len();

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); width];
    let mut lines: Vec<u64> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| parse_error(source, &e))?;
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        lines.push(record.position().map_or(0, csv::Position::line));
        for (column, raw) in cells.iter_mut().zip(record.iter()) {
            column.push(normalize_cell(raw, &options.null_tokens));
        }
    }

    if trailing_blank {
        drop_trailing_blank(&mut names, &mut cells, source)?;
    }
    let headers = names;

    for declared in options.schema.keys() {
        if !headers.iter().any(|header| header == declared) {
            warn!(
                source = %source.display(),
                column = %declared,
                "declared column not present in file"
            );
        }
    }

    let mut columns = Vec::with_capacity(width);
    for (header, raw) in headers.into_iter().zip(cells) {
        let declared = options.schema.get(&header).copied();
        let kind = declared.unwrap_or_else(|| infer_kind(&raw));
        let values = match kind {
            ColumnKind::Text => ColumnValues::Text(raw),
            ColumnKind::Numeric => {
                ColumnValues::Numeric(to_numeric(&header, raw, &lines, source)?)
            }
        };
        debug!(
            column = %header,
            kind = %kind,
            declared = declared.is_some(),
            "column loaded"
        );
        columns.push((header, values));
    }

    let table = Table::new(name, columns)?;
    debug!(
        source = %source.display(),
        rows = table.height(),
        columns = table.width(),
        "table loaded"
    );
    Ok(table)
}

struct Headers {
    names: Vec<String>,
    /// The last header is blank. Its column is dropped when every cell is empty.
    trailing_blank: bool,
}

fn read_headers<R: Read>(reader: &mut csv::Reader<R>, source: &Path) -> Result<Headers> {
    let record: StringRecord = reader
        .headers()
        .map_err(|e| parse_error(source, &e))?
        .clone();
    if record.is_empty() || record.iter().all(|cell| cell.trim().is_empty()) {
        return Err(IngestError::EmptyCsv {
            path: source.to_path_buf(),
        });
    }
    let last = record.len() - 1;
    let mut trailing_blank = false;
    let mut seen = BTreeSet::new();
    let mut names = Vec::with_capacity(record.len());
    for (position, raw) in record.iter().enumerate() {
        let header = normalize_header(raw);
        if header.is_empty() {
            if position != last {
                return Err(IngestError::EmptyColumnName {
                    path: source.to_path_buf(),
                    position: position + 1,
                });
            }
            trailing_blank = true;
        } else if !seen.insert(header.clone()) {
            return Err(IngestError::DuplicateColumn {
                path: source.to_path_buf(),
                column: header,
            });
        }
        names.push(header);
    }
    Ok(Headers {
        names,
        trailing_blank,
    })
}

/// Rows ending in a delimiter leave an unnamed, empty last column.
fn drop_trailing_blank(
    names: &mut Vec<String>,
    cells: &mut Vec<Vec<Option<String>>>,
    source: &Path,
) -> Result<()> {
    let position = names.len();
    let holds_values = cells
        .last()
        .is_some_and(|column| column.iter().any(Option::is_some));
    if holds_values {
        return Err(IngestError::EmptyColumnName {
            path: source.to_path_buf(),
            position,
        });
    }
    names.pop();
    cells.pop();
    debug!(source = %source.display(), position, "dropped empty unnamed trailing column");
    Ok(())
}

fn to_numeric(
    column: &str,
    raw: Vec<Option<String>>,
    lines: &[u64],
    source: &Path,
) -> Result<Vec<Option<f64>>> {
    raw.into_iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            None => Ok(None),
            Some(value) => match parse_f64(&value) {
                Some(number) => Ok(Some(number)),
                None => Err(IngestError::InvalidValue {
                    path: source.to_path_buf(),
                    column: column.to_string(),
                    line: lines.get(row).copied().unwrap_or_default(),
                    value,
                }),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn load(text: &str, options: &LoadOptions) -> Result<Table> {
        read_table_from_reader("t", text.as_bytes(), &PathBuf::from("t.csv"), options)
    }

    #[test]
    fn normalize_header_collapses_tabs() {
        assert_eq!(normalize_header("\u{feff} aqi\tvalue "), "aqi value");
        assert_eq!(normalize_header("  country_name\t"), "country_name");
    }

    #[test]
    fn infers_numeric_and_text_columns() {
        let table = load("name,co2\nA,0\nB,4\n", &LoadOptions::default()).unwrap();
        assert_eq!(table.kind_of("name"), Some(ColumnKind::Text));
        assert_eq!(table.numeric("co2").unwrap(), vec![Some(0.0), Some(4.0)]);
    }

    #[test]
    fn null_tokens_become_missing() {
        let table = load("v,w\n1,a\nNA,b\nNaN,c\n,d\n3,e\n", &LoadOptions::default()).unwrap();
        assert_eq!(
            table.numeric("v").unwrap(),
            vec![Some(1.0), None, None, None, Some(3.0)]
        );
    }

    #[test]
    fn declared_text_column_is_not_inferred() {
        let options = LoadOptions::default().with_column("code", ColumnKind::Text);
        let table = load("code\n001\n002\n", &options).unwrap();
        assert_eq!(
            table.text("code").unwrap(),
            vec![Some("001".to_string()), Some("002".to_string())]
        );
    }

    #[test]
    fn declared_numeric_column_rejects_text() {
        let options = LoadOptions::default().with_column("v", ColumnKind::Numeric);
        let err = load("v\n1\nabc\n", &options).unwrap_err();
        match err {
            IngestError::InvalidValue { column, line, value, .. } => {
                assert_eq!(column, "v");
                assert_eq!(line, 3);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn inconsistent_field_count_is_a_parse_error() {
        let err = load("a,b\n1,2\n3\n", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, IngestError::CsvParse { .. }));
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = load("", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, IngestError::EmptyCsv { .. }));
    }

    #[test]
    fn duplicate_headers_are_rejected() {
        let err = load("a, a\n1,2\n", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, IngestError::DuplicateColumn { .. }));
    }

    #[test]
    fn blank_inner_header_is_rejected() {
        let err = load("a,,c\n1,2,3\n", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, IngestError::EmptyColumnName { position: 2, .. }));
    }

    #[test]
    fn blank_trailing_header_with_values_is_rejected() {
        let err = load("a,b,\n1,2,\n3,4,x\n", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, IngestError::EmptyColumnName { position: 3, .. }));
    }

    #[test]
    fn blank_trailing_header_over_empty_cells_is_dropped() {
        let table = load("a,b,\n1,x,\n2,y,\n", &LoadOptions::default()).unwrap();
        assert_eq!(table.column_names(), vec!["a", "b"]);
        assert_eq!(table.height(), 2);
    }

    #[test]
    fn blank_rows_are_skipped() {
        let table = load("a,b\n1,x\n,\n2,y\n", &LoadOptions::default()).unwrap();
        assert_eq!(table.height(), 2);
    }
}
