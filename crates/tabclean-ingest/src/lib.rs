//! CSV ingestion for tabclean.
//!
//! Reads a delimited file into a [`Table`](tabclean_model::Table). Column kinds
//! come from a declared schema when one is given and are inferred otherwise:
//! a column is numeric only if every non-missing cell parses as a number.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use tabclean_ingest::{LoadOptions, read_table};
//! use tabclean_model::ColumnKind;
//!
//! let options = LoadOptions::default().with_column("Country Code", ColumnKind::Text);
//! let table = read_table(Path::new("co2/CO2 Emission Per Country.csv"), &options)?;
//! ```

mod error;
mod infer;
mod options;
mod reader;

pub use error::{IngestError, Result};
pub use infer::{ColumnHint, infer_kind};
pub use options::LoadOptions;
pub use reader::{normalize_header, read_table, read_table_from_reader};
