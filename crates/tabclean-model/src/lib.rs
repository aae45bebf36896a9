//! Data model for tabclean.
//!
//! A [`Table`] is an ordered set of named numeric or text columns backed by a
//! polars `DataFrame`. A [`SentinelPolicy`] says which cells count as missing
//! when imputing numeric columns.

pub mod error;
pub mod policy;
pub mod schema;
pub mod table;
pub mod values;

pub use error::{ModelError, Result};
pub use policy::SentinelPolicy;
pub use schema::{ColumnKind, ColumnSpec, TableSchema};
pub use table::{ColumnValues, Table};
pub use values::{
    DEFAULT_NULL_TOKENS, format_numeric, format_rounded, is_null_token, parse_f64, round_to,
};
