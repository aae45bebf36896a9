//! Batch configuration.
//!
//! A batch is a TOML file with one `[[dataset]]` table per input file:
//!
//! ```toml
//! [[dataset]]
//! name = "CO2 Emission Per Capita"
//! input = "co2/CO2 Emission Per Country.csv"
//! sentinel = "zero"
//! output_suffix = "_preprocess"
//! decimals = 6
//! ```
//!
//! Relative paths are resolved against the directory holding the config file.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use tabclean_ingest::LoadOptions;
use tabclean_model::{ColumnKind, SentinelPolicy, Table};
use tabclean_output::{WriteOptions, derive_output_path, replace_stem_marker};
use tabclean_report::{Aggregation, CategorySource, DescribeSpec};
use tabclean_transform::{MeltSpec, PivotSpec, StackSpec, ValueRewrite, detect_date_columns};

use crate::error::ConfigError;

/// All datasets of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    #[serde(default, rename = "dataset")]
    pub datasets: Vec<DatasetConfig>,
}

fn default_true() -> bool {
    true
}

fn default_output_suffix() -> String {
    "_clean".to_string()
}

/// One input file and what to do with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    pub name: String,
    pub input: PathBuf,
    /// Explicit output file. Overrides `output_suffix` and `output_dir`.
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,
    /// Marker in the input stem replaced by `output_suffix` (`_Cleaned`).
    #[serde(default)]
    pub replace_marker: Option<String>,
    /// Directory for derived outputs; defaults to the input's directory.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub sentinel: SentinelPolicy,
    #[serde(default = "default_true")]
    pub impute: bool,
    /// Columns to impute; every numeric column when absent.
    #[serde(default)]
    pub impute_columns: Option<Vec<String>>,
    /// Cell values read as missing; the reader's defaults when absent.
    #[serde(default)]
    pub null_values: Option<Vec<String>>,
    #[serde(default)]
    pub schema: BTreeMap<String, ColumnKind>,
    #[serde(default)]
    pub drop_columns: Vec<String>,
    #[serde(default)]
    pub rewrites: Vec<ValueRewrite>,
    #[serde(default)]
    pub date_columns: Option<DateColumns>,
    /// Average numeric columns per normalized year and text column.
    #[serde(default)]
    pub group_by_year: bool,
    #[serde(default)]
    pub decimals: Option<u32>,
    #[serde(default)]
    pub melt: Option<MeltSpec>,
    #[serde(default)]
    pub pivot: Option<PivotConfig>,
    #[serde(default)]
    pub sort_by: Vec<String>,
    #[serde(default)]
    pub split: Option<SplitConfig>,
    #[serde(default)]
    pub summaries: Vec<SummaryConfig>,
}

/// `date_columns = "auto"` or an explicit list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateColumns {
    Detect(DateDetection),
    Named(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateDetection {
    /// Every column whose name contains "date".
    Auto,
}

impl DateColumns {
    pub fn resolve(&self, table: &Table) -> Vec<String> {
        match self {
            Self::Detect(DateDetection::Auto) => detect_date_columns(table),
            Self::Named(columns) => columns.clone(),
        }
    }
}

/// Long-to-wide pivot, optionally followed by change columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PivotConfig {
    pub index: Vec<String>,
    pub key: String,
    pub value: String,
    /// Append `Change_Absolute` and `Change_Percent`.
    #[serde(default)]
    pub change: bool,
}

impl PivotConfig {
    pub fn spec(&self) -> PivotSpec {
        PivotSpec::new(self.index.clone(), self.key.clone(), self.value.clone())
    }
}

fn default_split_suffix() -> String {
    "_data".to_string()
}

/// One output file per distinct value of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplitConfig {
    pub column: String,
    /// Appended to the slug of each value to form the file stem.
    #[serde(default = "default_split_suffix")]
    pub suffix: String,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Also write a `pivot_`-prefixed wide table per value.
    #[serde(default)]
    pub pivot: Option<PivotConfig>,
    /// Only pivot values containing one of these words (case-insensitive).
    /// Every value is pivoted when empty.
    #[serde(default)]
    pub pivot_when: Vec<String>,
}

impl SplitConfig {
    pub fn pivots(&self, value: &str) -> bool {
        let lowered = value.to_lowercase();
        self.pivot_when.is_empty()
            || self
                .pivot_when
                .iter()
                .any(|word| lowered.contains(&word.to_lowercase()))
    }
}

/// A derived table written next to the main output.
///
/// Parsed in two halves: the output keys below, then the remaining keys as a
/// [`SummaryKind`]. Both halves reject keys they do not know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "toml::Table")]
pub struct SummaryConfig {
    pub output: PathBuf,
    #[serde(default)]
    pub decimals: Option<u32>,
    #[serde(default)]
    pub sort_by: Vec<String>,
    #[serde(flatten)]
    pub kind: SummaryKind,
}

/// Output keys shared by every summary kind.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SummaryTarget {
    output: PathBuf,
    #[serde(default)]
    decimals: Option<u32>,
    #[serde(default)]
    sort_by: Vec<String>,
}

const SUMMARY_TARGET_KEYS: [&str; 3] = ["output", "decimals", "sort_by"];

impl TryFrom<toml::Table> for SummaryConfig {
    type Error = toml::de::Error;

    fn try_from(mut table: toml::Table) -> Result<Self, Self::Error> {
        let mut target = toml::Table::new();
        for key in SUMMARY_TARGET_KEYS {
            if let Some(value) = table.remove(key) {
                target.insert(key.to_string(), value);
            }
        }
        let target: SummaryTarget = toml::Value::Table(target).try_into()?;
        let kind: SummaryKind = toml::Value::Table(table).try_into()?;
        Ok(Self {
            output: target.output,
            decimals: target.decimals,
            sort_by: target.sort_by,
            kind,
        })
    }
}

impl SummaryConfig {
    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            decimals: self.decimals,
        }
    }
}

fn default_label_column() -> String {
    "column".to_string()
}

fn default_category_column() -> String {
    "category".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum SummaryKind {
    CategoryCounts {
        column: String,
    },
    StackedCategoryCounts {
        sources: Vec<CategorySource>,
        #[serde(default = "default_label_column")]
        label_column: String,
        #[serde(default = "default_category_column")]
        category_column: String,
    },
    Aggregate {
        group_by: Vec<String>,
        aggregations: Vec<Aggregation>,
    },
    TopN {
        column: String,
        n: usize,
        #[serde(default)]
        columns: Vec<String>,
    },
    BottomN {
        column: String,
        n: usize,
        #[serde(default)]
        columns: Vec<String>,
    },
    PercentOfTotal {
        column: String,
        output_column: String,
    },
    Describe(DescribeSpec),
    Stack(StackSpec),
}

impl SummaryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CategoryCounts { .. } => "category_counts",
            Self::StackedCategoryCounts { .. } => "stacked_category_counts",
            Self::Aggregate { .. } => "aggregate",
            Self::TopN { .. } => "top_n",
            Self::BottomN { .. } => "bottom_n",
            Self::PercentOfTotal { .. } => "percent_of_total",
            Self::Describe(_) => "describe",
            Self::Stack(_) => "stack",
        }
    }
}

impl DatasetConfig {
    /// A dataset with every option at its default.
    pub fn new(name: impl Into<String>, input: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
            output: None,
            output_suffix: default_output_suffix(),
            replace_marker: None,
            output_dir: None,
            sentinel: SentinelPolicy::default(),
            impute: true,
            impute_columns: None,
            null_values: None,
            schema: BTreeMap::new(),
            drop_columns: Vec::new(),
            rewrites: Vec::new(),
            date_columns: None,
            group_by_year: false,
            decimals: None,
            melt: None,
            pivot: None,
            sort_by: Vec::new(),
            split: None,
            summaries: Vec::new(),
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        let options = LoadOptions::new().with_schema(self.schema.clone());
        match &self.null_values {
            Some(tokens) => options.with_null_tokens(tokens.clone()),
            None => options,
        }
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            decimals: self.decimals,
        }
    }

    /// Where the main table is written.
    pub fn output_path(&self) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }
        let dir = self.output_dir.as_deref();
        match &self.replace_marker {
            Some(marker) => replace_stem_marker(&self.input, marker, &self.output_suffix, dir),
            None => derive_output_path(&self.input, &self.output_suffix, dir),
        }
    }

    /// Directory for split files: the split's own, else next to the main output.
    pub fn split_dir(&self) -> PathBuf {
        self.split
            .as_ref()
            .and_then(|split| split.output_dir.clone())
            .or_else(|| self.output_path().parent().map(Path::to_path_buf))
            .unwrap_or_default()
    }

    fn resolve_paths(&mut self, base: &Path) {
        self.input = base.join(&self.input);
        for path in [&mut self.output, &mut self.output_dir]
            .into_iter()
            .flatten()
        {
            *path = base.join(&*path);
        }
        if let Some(dir) = self.split.as_mut().and_then(|split| split.output_dir.as_mut()) {
            *dir = base.join(&*dir);
        }
        let summary_dir = self
            .output_path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        for summary in &mut self.summaries {
            summary.output = summary_dir.join(&summary.output);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::invalid(&self.name, "name must not be blank"));
        }
        if self.melt.is_some() && self.pivot.is_some() {
            return Err(ConfigError::invalid(
                &self.name,
                "melt and pivot cannot both be set",
            ));
        }
        if self.impute_columns.as_ref().is_some_and(Vec::is_empty) {
            return Err(ConfigError::invalid(
                &self.name,
                "impute_columns is empty; omit it to impute every numeric column",
            ));
        }
        let mut outputs = BTreeSet::new();
        outputs.insert(self.output_path());
        for summary in &self.summaries {
            if !outputs.insert(summary.output.clone()) {
                return Err(ConfigError::invalid(
                    &self.name,
                    format!("output {} is written twice", summary.output.display()),
                ));
            }
        }
        if self.output.is_none() && self.output_suffix.is_empty() && self.output_dir.is_none() {
            return Err(ConfigError::invalid(
                &self.name,
                "empty output_suffix would overwrite the input",
            ));
        }
        Ok(())
    }
}

impl BatchConfig {
    /// Parse a config from TOML text, resolving paths against `base`.
    ///
    /// `origin` names the source in errors.
    pub fn from_toml_str(content: &str, base: &Path, origin: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        if config.datasets.is_empty() {
            return Err(ConfigError::NoDatasets {
                path: origin.to_path_buf(),
            });
        }
        let mut names = BTreeSet::new();
        for dataset in &mut config.datasets {
            dataset.resolve_paths(base);
            dataset.validate()?;
            if !names.insert(dataset.name.clone()) {
                return Err(ConfigError::invalid(&dataset.name, "duplicate dataset name"));
            }
        }
        Ok(config)
    }
}

/// Read and validate a batch config file.
///
/// # Errors
///
/// - [`ConfigError::Read`] / [`ConfigError::Parse`] for unreadable or malformed files
/// - [`ConfigError::NoDatasets`] when no `[[dataset]]` is listed
/// - [`ConfigError::Invalid`] for contradictory dataset options
pub fn load_config(path: &Path) -> Result<BatchConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let config = BatchConfig::from_toml_str(&content, base, path)?;
    info!(
        path = %path.display(),
        datasets = config.datasets.len(),
        "loaded batch config"
    );
    Ok(config)
}
