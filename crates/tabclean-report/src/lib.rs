//! Derived summary tables for tabclean.
//!
//! Every function here reads an already-cleaned [`Table`](tabclean_model::Table)
//! and returns a new one; inputs are never mutated.

pub mod aggregate;
pub mod counts;
pub mod describe;
pub mod error;
pub mod rank;

pub use aggregate::{Aggregation, Stat, aggregate};
pub use counts::{
    COUNT_COLUMN, CategorySource, PERCENTAGE_COLUMN, category_counts, stacked_category_counts,
};
pub use describe::{DescribeSpec, METRIC_COLUMN, SubstringTally, VALUE_COLUMN, describe};
pub use error::{ReportError, Result};
pub use rank::{bottom_n, percent_of_total, top_n};
