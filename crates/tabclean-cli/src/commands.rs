use anyhow::{Context, Result};
use tracing::info;

use tabclean_core::{
    BatchReport, ColumnProfile, DatasetConfig, DatasetReport, PivotConfig, load_config,
    process_dataset, profile_table, run_batch,
};
use tabclean_ingest::{LoadOptions, read_table};
use tabclean_transform::MeltSpec;

use crate::cli::{ImputeArgs, MeltArgs, OutputArgs, PivotArgs, ProfileArgs, RunArgs};

pub fn run_config(args: &RunArgs) -> Result<BatchReport> {
    let config = load_config(&args.config)
        .with_context(|| format!("load config {}", args.config.display()))?;
    let report = run_batch(&config);
    if let Some(path) = &args.report {
        report.write_json(path)?;
        info!(path = %path.display(), "wrote batch report");
    }
    Ok(report)
}

/// A single-file dataset named after the input file.
fn single_file(input: &std::path::Path, output: &OutputArgs, suffix: &str) -> DatasetConfig {
    let name = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    let mut config = DatasetConfig::new(name, input);
    config.output.clone_from(&output.output);
    config.output_suffix = suffix.to_string();
    config.decimals = output.decimals;
    config
}

pub fn run_impute(args: &ImputeArgs) -> DatasetReport {
    let mut config = single_file(&args.input, &args.output, "_clean");
    config.sentinel = args.sentinel.into();
    if !args.columns.is_empty() {
        config.impute_columns = Some(args.columns.clone());
    }
    process_dataset(&config)
}

pub fn run_melt(args: &MeltArgs) -> DatasetReport {
    let mut config = single_file(&args.input, &args.output, "_long");
    config.impute = false;
    let mut spec =
        MeltSpec::new(args.id.clone(), args.value.clone()).with_names(&args.key, &args.value_name);
    if let Some(prefix) = &args.strip_prefix {
        spec = spec.with_key_prefix(prefix);
    }
    if args.numeric_keys {
        spec = spec.with_numeric_keys();
    }
    config.melt = Some(spec);
    process_dataset(&config)
}

pub fn run_pivot(args: &PivotArgs) -> DatasetReport {
    let mut config = single_file(&args.input, &args.output, "_wide");
    config.impute = false;
    config.pivot = Some(PivotConfig {
        index: args.index.clone(),
        key: args.key.clone(),
        value: args.value.clone(),
        change: args.change,
    });
    process_dataset(&config)
}

pub fn run_profile(args: &ProfileArgs) -> Result<Vec<ColumnProfile>> {
    let table = read_table(&args.input, &LoadOptions::default())
        .with_context(|| format!("load {}", args.input.display()))?;
    info!(
        rows = table.height(),
        columns = table.width(),
        "loaded table"
    );
    Ok(profile_table(&table)?)
}
