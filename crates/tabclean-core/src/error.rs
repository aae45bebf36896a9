//! Error types for configuration and the dataset pipeline.

use std::path::PathBuf;

use tabclean_report::ReportError;
use tabclean_transform::TransformError;
use thiserror::Error;

/// Errors in the batch configuration. These abort the whole run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("config {path} lists no datasets")]
    NoDatasets { path: PathBuf },

    #[error("invalid dataset '{dataset}': {message}")]
    Invalid { dataset: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(dataset: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            dataset: dataset.to_string(),
            message: message.into(),
        }
    }
}

/// Errors raised while running one dataset through the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("summary '{output}': {source}")]
    Summary {
        output: PathBuf,
        #[source]
        source: ReportError,
    },
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
