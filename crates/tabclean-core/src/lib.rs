//! Batch configuration and the dataset pipeline for tabclean.
//!
//! - **config**: TOML batch files, one `[[dataset]]` per input
//! - **pipeline**: the pure per-dataset stage sequence
//! - **batch**: loading, writing and per-dataset failure isolation
//! - **profile**: column kinds and missing-value counts

pub mod batch;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod profile;

pub use batch::{BatchReport, DatasetReport, DatasetStatus, process_dataset, run_batch};
pub use config::{
    BatchConfig, DatasetConfig, DateColumns, DateDetection, PivotConfig, SplitConfig,
    SummaryConfig, SummaryKind, load_config,
};
pub use error::{ConfigError, PipelineError};
pub use pipeline::{DatasetOutput, DerivedTable, run_dataset};
pub use profile::{ColumnProfile, profile_table};
