//! Table transformations for tabclean.
//!
//! - **impute**: sentinel-to-mean imputation with per-column statistics
//! - **dates**: date cells reduced to calendar years
//! - **group**: grouping keys and group-and-average
//! - **melt** / **pivot**: wide/long reshaping and change columns
//! - **rows**: stable sorting, filtering and distinct values
//! - **stack**: several column groups stacked into long rows
//! - **rewrite**: literal/regex value rewrites and column removal
//! - **stats**: column statistics shared with the report crate

pub mod dates;
pub mod error;
pub mod group;
pub mod impute;
pub mod melt;
pub mod pivot;
pub mod rewrite;
pub mod rows;
pub mod stack;
pub mod stats;

pub use dates::{YearNormalization, detect_date_columns, normalize_year_column, parse_year};
pub use error::{Result, TransformError};
pub use group::{
    KeyValue, RowGroup, default_group_columns, group_and_average, group_rows, group_rows_in_order,
    key_columns,
};
pub use impute::{ColumnImputation, ImputationReport, ImputeOptions, impute_table, impute_values};
pub use melt::{MeltSpec, melt};
pub use pivot::{CHANGE_ABSOLUTE, CHANGE_PERCENT, PivotSpec, append_change_columns, pivot};
pub use rewrite::{ValueRewrite, drop_columns, rewrite_values};
pub use rows::{distinct_values, filter_equals, sort_rows};
pub use stack::{StackGroup, StackSpec, stack};
