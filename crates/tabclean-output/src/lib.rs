//! CSV output for tabclean.
//!
//! Tables are written with their column order intact and missing cells left
//! empty. Numbers use the shortest round-trip form unless a rounding policy
//! asks for a fixed number of decimal places.

mod error;
mod paths;
mod writer;

pub use error::{OutputError, Result};
pub use paths::{derive_output_path, replace_stem_marker, slugify};
pub use writer::{WriteOptions, ensure_parent_dir, render_csv, write_table, write_table_to};
