//! Batch runner: load, process and write every configured dataset.
//!
//! A failing dataset is logged and recorded; the remaining datasets still run.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{error, info, info_span, warn};

use tabclean_ingest::read_table;
use tabclean_model::Table;
use tabclean_output::{WriteOptions, ensure_parent_dir, write_table};
use tabclean_transform::ImputationReport;

use crate::config::{BatchConfig, DatasetConfig};
use crate::pipeline::run_dataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetStatus {
    Succeeded,
    Failed,
}

/// Outcome of one dataset.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetReport {
    pub name: String,
    pub input: PathBuf,
    pub status: DatasetStatus,
    pub rows_in: Option<usize>,
    pub rows_out: Option<usize>,
    /// Files written, main output first. Empty when a write failed.
    pub outputs: Vec<PathBuf>,
    pub imputation: Option<ImputationReport>,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl DatasetReport {
    fn new(config: &DatasetConfig) -> Self {
        Self {
            name: config.name.clone(),
            input: config.input.clone(),
            status: DatasetStatus::Failed,
            rows_in: None,
            rows_out: None,
            outputs: Vec::new(),
            imputation: None,
            error: None,
            duration_ms: 0,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == DatasetStatus::Succeeded
    }
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub datasets: Vec<DatasetReport>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.datasets.iter().filter(|d| d.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.datasets.len() - self.succeeded()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        ensure_parent_dir(path)?;
        let file =
            File::create(path).with_context(|| format!("create report {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("write report {}", path.display()))?;
        Ok(())
    }
}

fn process(config: &DatasetConfig, report: &mut DatasetReport) -> Result<()> {
    let table = read_table(&config.input, &config.load_options())
        .with_context(|| format!("load {}", config.input.display()))?;
    report.rows_in = Some(table.height());

    let output = run_dataset(table, config).with_context(|| format!("process {}", config.name))?;
    report.rows_out = Some(output.table.height());
    report.imputation = output.imputation;

    let mut targets = vec![(output.table, config.output_path(), config.write_options())];
    targets.extend(
        output
            .derived
            .into_iter()
            .map(|derived| (derived.table, derived.path, derived.options)),
    );
    write_outputs(&targets, &mut report.outputs)
}

/// Write every output, main table first. If one write fails, the files this
/// dataset already wrote are removed along with the failed one.
fn write_outputs(
    targets: &[(Table, PathBuf, WriteOptions)],
    written: &mut Vec<PathBuf>,
) -> Result<()> {
    for (table, path, options) in targets {
        if let Err(err) = write_table(table, path, *options) {
            written.push(path.clone());
            remove_outputs(written);
            written.clear();
            return Err(err).with_context(|| format!("write {}", path.display()));
        }
        written.push(path.clone());
    }
    Ok(())
}

fn remove_outputs(paths: &[PathBuf]) {
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => warn!(path = %path.display(), "removed output of failed dataset"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %path.display(), "could not remove output: {err}"),
        }
    }
}

/// Load, process and write a single dataset, recording the outcome.
pub fn process_dataset(config: &DatasetConfig) -> DatasetReport {
    let span = info_span!("dataset", name = %config.name);
    let _guard = span.enter();
    let start = Instant::now();

    let mut report = DatasetReport::new(config);
    match process(config, &mut report) {
        Ok(()) => {
            report.status = DatasetStatus::Succeeded;
            info!(
                rows_in = report.rows_in,
                rows_out = report.rows_out,
                outputs = report.outputs.len(),
                "dataset complete"
            );
        }
        Err(err) => {
            error!("dataset failed: {err:#}");
            report.error = Some(format!("{err:#}"));
        }
    }
    report.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    report
}

/// Run every dataset in order. Never fails as a whole; check
/// [`BatchReport::has_failures`].
pub fn run_batch(config: &BatchConfig) -> BatchReport {
    let start = Instant::now();
    let datasets: Vec<DatasetReport> = config.datasets.iter().map(process_dataset).collect();
    let report = BatchReport { datasets };
    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        duration_ms = start.elapsed().as_millis(),
        "batch complete"
    );
    report
}
