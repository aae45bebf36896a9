//! Dataset pipeline with explicit stages.
//!
//! The stages run in this order:
//! 1. **Prepare**: drop configured columns, apply value rewrites
//! 2. **Dates**: normalize date columns to calendar years
//! 3. **Impute**: replace sentinels with column means (year columns excluded)
//! 4. **Group**: average numeric columns per year and text column
//! 5. **Reshape**: melt, or pivot with optional change columns
//! 6. **Sort**
//! 7. **Derive**: per-value splits and summary tables
//!
//! [`run_dataset`] does no I/O; reading and writing live in [`crate::batch`].

use std::path::PathBuf;

use tracing::{debug, info, info_span, warn};

use tabclean_model::Table;
use tabclean_output::{WriteOptions, slugify};
use tabclean_report::{
    ReportError, aggregate, bottom_n, category_counts, describe, percent_of_total,
    stacked_category_counts, top_n,
};
use tabclean_transform::{
    CHANGE_ABSOLUTE, CHANGE_PERCENT, ImputationReport, ImputeOptions, YearNormalization,
    append_change_columns, default_group_columns, distinct_values, drop_columns,
    filter_equals, group_and_average, impute_table, melt, normalize_year_column, pivot,
    rewrite_values, sort_rows, stack,
};

use crate::config::{DatasetConfig, PivotConfig, SplitConfig, SummaryConfig, SummaryKind};
use crate::error::{PipelineError, Result};

/// A table produced alongside the main output.
#[derive(Debug, Clone)]
pub struct DerivedTable {
    pub table: Table,
    pub path: PathBuf,
    pub options: WriteOptions,
}

/// Everything one dataset produces.
#[derive(Debug, Clone)]
pub struct DatasetOutput {
    pub table: Table,
    /// `None` when imputation is disabled.
    pub imputation: Option<ImputationReport>,
    pub years: Vec<YearNormalization>,
    pub derived: Vec<DerivedTable>,
}

// ============================================================================
// Stages
// ============================================================================

fn prepare(table: &mut Table, config: &DatasetConfig) -> Result<()> {
    let dropped = drop_columns(table, &config.drop_columns)?;
    let rewritten = rewrite_values(table, &config.rewrites)?;
    debug!(dropped = dropped.len(), rewritten, "prepared table");
    Ok(())
}

fn normalize_dates(table: &mut Table, config: &DatasetConfig) -> Result<Vec<YearNormalization>> {
    let columns = config
        .date_columns
        .as_ref()
        .map(|dates| dates.resolve(table))
        .unwrap_or_default();
    let mut years = Vec::with_capacity(columns.len());
    for column in &columns {
        years.push(normalize_year_column(table, column)?);
    }
    Ok(years)
}

fn impute(
    table: &mut Table,
    config: &DatasetConfig,
    years: &[YearNormalization],
) -> Result<Option<ImputationReport>> {
    if !config.impute {
        return Ok(None);
    }
    let mut options = ImputeOptions::new(config.sentinel);
    if let Some(columns) = &config.impute_columns {
        options = options.with_columns(columns.clone());
    }
    for year in years {
        options = options.excluding(year.column.clone());
    }
    Ok(Some(impute_table(table, &options)?))
}

fn group_by_year(table: Table, years: &[YearNormalization]) -> Result<Table> {
    let Some(year) = years.first() else {
        warn!("group_by_year is set but no date column was normalized");
        return Ok(table);
    };
    let columns = default_group_columns(&table, &year.column);
    let grouped = group_and_average(&table, &columns)?;
    info!(
        rows_in = table.height(),
        rows_out = grouped.height(),
        by = ?columns,
        "grouped by year"
    );
    Ok(grouped)
}

fn pivot_with_change(table: &Table, config: &PivotConfig) -> Result<Table> {
    let mut wide = pivot(table, &config.spec())?;
    if config.change {
        let keys: Vec<String> = wide
            .column_names()
            .into_iter()
            .filter(|name| !config.index.iter().any(|index| index == name))
            .map(str::to_string)
            .collect();
        append_change_columns(&mut wide, &keys)?;
        debug!(
            columns = keys.len(),
            "appended {CHANGE_ABSOLUTE} and {CHANGE_PERCENT}"
        );
    }
    Ok(wide)
}

fn reshape(table: Table, config: &DatasetConfig) -> Result<Table> {
    if let Some(spec) = &config.melt {
        return Ok(melt(&table, spec)?);
    }
    if let Some(pivot) = &config.pivot {
        return pivot_with_change(&table, pivot);
    }
    Ok(table)
}

fn split(table: &Table, config: &DatasetConfig, split: &SplitConfig) -> Result<Vec<DerivedTable>> {
    let dir = config.split_dir();
    let options = config.write_options();
    let mut derived = Vec::new();
    for value in distinct_values(table, &split.column)? {
        let stem = format!("{}{}", slugify(&value), split.suffix);
        let subset = filter_equals(table, &split.column, &value)?.with_name(stem.as_str());
        let file = format!("{stem}.csv");
        if let Some(pivot) = split.pivot.as_ref().filter(|_| split.pivots(&value)) {
            let wide = pivot_with_change(&subset, pivot)?.with_name(format!("pivot_{stem}"));
            derived.push(DerivedTable {
                table: subset,
                path: dir.join(&file),
                options,
            });
            derived.push(DerivedTable {
                table: wide,
                path: dir.join(format!("pivot_{file}")),
                options,
            });
        } else {
            derived.push(DerivedTable {
                table: subset,
                path: dir.join(&file),
                options,
            });
        }
    }
    info!(column = %split.column, files = derived.len(), "split table");
    Ok(derived)
}

fn summarize(table: &Table, summary: &SummaryConfig) -> Result<DerivedTable> {
    let wrap = |source: ReportError| PipelineError::Summary {
        output: summary.output.clone(),
        source,
    };
    let derived = match &summary.kind {
        SummaryKind::CategoryCounts { column } => category_counts(table, column).map_err(wrap)?,
        SummaryKind::StackedCategoryCounts {
            sources,
            label_column,
            category_column,
        } => stacked_category_counts(table, sources, label_column, category_column)
            .map_err(wrap)?,
        SummaryKind::Aggregate {
            group_by,
            aggregations,
        } => aggregate(table, group_by, aggregations).map_err(wrap)?,
        SummaryKind::TopN { column, n, columns } => {
            top_n(table, column, *n, columns).map_err(wrap)?
        }
        SummaryKind::BottomN { column, n, columns } => {
            bottom_n(table, column, *n, columns).map_err(wrap)?
        }
        SummaryKind::PercentOfTotal {
            column,
            output_column,
        } => percent_of_total(table, column, output_column).map_err(wrap)?,
        SummaryKind::Describe(spec) => describe(table, spec).map_err(wrap)?,
        SummaryKind::Stack(spec) => stack(table, spec)?,
    };
    let derived = if summary.sort_by.is_empty() {
        derived
    } else {
        sort_rows(&derived, &summary.sort_by)?
    };
    debug!(
        kind = summary.kind.as_str(),
        output = %summary.output.display(),
        rows = derived.height(),
        "computed summary"
    );
    Ok(DerivedTable {
        table: derived,
        path: summary.output.clone(),
        options: summary.write_options(),
    })
}

// ============================================================================
// Entry point
// ============================================================================

/// Run one loaded table through every configured stage.
///
/// # Errors
///
/// Any stage error aborts this dataset; see [`PipelineError`].
pub fn run_dataset(table: Table, config: &DatasetConfig) -> Result<DatasetOutput> {
    let span = info_span!("pipeline", dataset = %config.name);
    let _guard = span.enter();

    let mut table = table;
    prepare(&mut table, config)?;
    let years = normalize_dates(&mut table, config)?;
    let imputation = impute(&mut table, config, &years)?;

    if config.group_by_year {
        table = group_by_year(table, &years)?;
    }
    table = reshape(table, config)?;
    if !config.sort_by.is_empty() {
        table = sort_rows(&table, &config.sort_by)?;
    }

    let mut derived = match &config.split {
        Some(split_config) => split(&table, config, split_config)?,
        None => Vec::new(),
    };
    for summary in &config.summaries {
        derived.push(summarize(&table, summary)?);
    }

    Ok(DatasetOutput {
        table,
        imputation,
        years,
        derived,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabclean_model::{ColumnValues, SentinelPolicy};

    fn co2() -> Table {
        Table::new(
            "co2",
            vec![
                (
                    "country".to_string(),
                    ColumnValues::Text(vec![
                        Some("A".into()),
                        Some("B".into()),
                        Some("C".into()),
                        Some("D".into()),
                        Some("E".into()),
                    ]),
                ),
                (
                    "co2".to_string(),
                    ColumnValues::Numeric(vec![
                        Some(0.0),
                        Some(4.0),
                        Some(6.0),
                        Some(0.0),
                        Some(10.0),
                    ]),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn zero_sentinels_are_replaced_by_mean() {
        let mut config = DatasetConfig::new("co2", "co2.csv");
        config.sentinel = SentinelPolicy::Zero;
        let output = run_dataset(co2(), &config).unwrap();

        let values = output.table.numeric("co2").unwrap();
        let mean = 20.0 / 3.0;
        assert_eq!(
            values,
            vec![Some(mean), Some(4.0), Some(6.0), Some(mean), Some(10.0)]
        );
        let report = output.imputation.unwrap();
        assert_eq!(report.total_replaced(), 2);
        assert_eq!(report.remaining_sentinels, 0);
    }

    #[test]
    fn impute_can_be_disabled() {
        let mut config = DatasetConfig::new("co2", "co2.csv");
        config.sentinel = SentinelPolicy::Zero;
        config.impute = false;
        let output = run_dataset(co2(), &config).unwrap();
        assert!(output.imputation.is_none());
        assert_eq!(output.table.numeric("co2").unwrap()[0], Some(0.0));
    }

    #[test]
    fn all_sentinel_column_fails_dataset() {
        let table = Table::new(
            "t",
            vec![("x".to_string(), ColumnValues::Numeric(vec![Some(0.0), Some(0.0)]))],
        )
        .unwrap();
        let mut config = DatasetConfig::new("t", "t.csv");
        config.sentinel = SentinelPolicy::Zero;
        let err = run_dataset(table, &config).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Transform(tabclean_transform::TransformError::UndefinedMean { .. })
        ));
    }

    #[test]
    fn split_on_numeric_column_writes_one_file_per_year() {
        let table = Table::new(
            "forest",
            vec![
                (
                    "Year".to_string(),
                    ColumnValues::Numeric(vec![Some(1992.0), Some(1993.0), Some(1992.0)]),
                ),
                (
                    "Value".to_string(),
                    ColumnValues::Numeric(vec![Some(1200.0), Some(1300.0), Some(800.0)]),
                ),
            ],
        )
        .unwrap();
        let mut config = DatasetConfig::new("forest", "forest.csv");
        config.impute = false;
        config.split = Some(SplitConfig {
            column: "Year".to_string(),
            suffix: "_data".to_string(),
            output_dir: None,
            pivot: None,
            pivot_when: Vec::new(),
        });
        let output = run_dataset(table, &config).unwrap();

        let files: Vec<(String, usize)> = output
            .derived
            .iter()
            .map(|derived| {
                let name = derived
                    .path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                (name, derived.table.height())
            })
            .collect();
        assert_eq!(
            files,
            vec![
                ("1992_data.csv".to_string(), 2),
                ("1993_data.csv".to_string(), 1),
            ]
        );
    }

    #[test]
    fn zero_mean_fails_dataset_under_zero_policy() {
        let table = Table::new(
            "balance",
            vec![(
                "net".to_string(),
                ColumnValues::Numeric(vec![Some(-2.0), Some(0.0), Some(2.0)]),
            )],
        )
        .unwrap();
        let mut config = DatasetConfig::new("balance", "balance.csv");
        config.sentinel = SentinelPolicy::Zero;
        let err = run_dataset(table, &config).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Transform(tabclean_transform::TransformError::SentinelMean { .. })
        ));
    }
}
