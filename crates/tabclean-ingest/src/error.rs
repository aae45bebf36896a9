//! Error types for CSV ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a table.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// CSV file not found.
    #[error("CSV file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === CSV Parsing Errors ===
    /// Malformed record or inconsistent field count.
    #[error("failed to parse CSV {path}{}: {message}", line_suffix(.line))]
    CsvParse {
        path: PathBuf,
        line: Option<u64>,
        message: String,
    },

    /// CSV file has no header row.
    #[error("CSV file is empty: {path}")]
    EmptyCsv { path: PathBuf },

    /// A header cell is blank.
    #[error("blank column name at position {position} in {path}")]
    EmptyColumnName { path: PathBuf, position: usize },

    /// Two header cells normalize to the same name.
    #[error("duplicate column '{column}' in {path}")]
    DuplicateColumn { path: PathBuf, column: String },

    // === Schema Errors ===
    /// A value in a declared numeric column does not parse.
    #[error("column '{column}' is declared numeric but line {line} holds '{value}' in {path}")]
    InvalidValue {
        path: PathBuf,
        column: String,
        line: u64,
        value: String,
    },

    /// Building the table failed.
    #[error(transparent)]
    Model(#[from] tabclean_model::ModelError),
}

fn line_suffix(line: &Option<u64>) -> String {
    line.map(|l| format!(" at line {l}")).unwrap_or_default()
}

impl IngestError {
    /// True for errors caused by the file's contents rather than its absence.
    pub fn is_format_error(&self) -> bool {
        !matches!(self, Self::FileNotFound { .. } | Self::FileRead { .. })
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
