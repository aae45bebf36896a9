//! CLI argument definitions for tabclean.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;

use tabclean_model::SentinelPolicy;

#[derive(Parser)]
#[command(
    name = "tabclean",
    version,
    about = "Impute, reshape and summarize tabular CSV datasets",
    long_about = "Impute sentinel values with column means, normalize dates to years,\n\
                  melt or pivot tables and derive summary tables.\n\n\
                  Batches are described by a TOML file with one [[dataset]] per input."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for humans, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run every dataset of a batch configuration.
    Run(RunArgs),

    /// Impute one CSV file.
    Impute(ImputeArgs),

    /// Reshape one CSV file from wide to long.
    Melt(MeltArgs),

    /// Reshape one CSV file from long to wide.
    Pivot(PivotArgs),

    /// Print each column's kind, missing count, zero count and mean.
    Profile(ProfileArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Batch configuration (TOML).
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Also write the batch report as JSON.
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,
}

/// Output location shared by the single-file commands.
#[derive(Args)]
pub struct OutputArgs {
    /// Output file (default: next to the input with a suffix).
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Round numbers to this many decimal places.
    #[arg(long = "decimals", value_name = "N")]
    pub decimals: Option<u32>,
}

#[derive(Args)]
pub struct ImputeArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,

    /// How missing values are encoded.
    #[arg(long = "sentinel", value_enum, default_value = "null")]
    pub sentinel: SentinelArg,

    /// Impute only these columns.
    #[arg(long = "column", value_name = "COL", num_args = 1..)]
    pub columns: Vec<String>,
}

#[derive(Args)]
pub struct MeltArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Identifier columns repeated on every row.
    #[arg(long = "id", value_name = "COL", num_args = 1.., required = true)]
    pub id: Vec<String>,

    /// Value columns to fold (default: every non-id column).
    #[arg(long = "value", value_name = "COL", num_args = 1..)]
    pub value: Vec<String>,

    /// Name of the new key column.
    #[arg(long = "key", value_name = "NAME", default_value = "variable")]
    pub key: String,

    /// Name of the new value column.
    #[arg(long = "value-name", value_name = "NAME", default_value = "value")]
    pub value_name: String,

    /// Prefix stripped from every key (F1992 becomes 1992).
    #[arg(long = "strip-prefix", value_name = "PREFIX")]
    pub strip_prefix: Option<String>,

    /// Store keys as numbers.
    #[arg(long = "numeric-keys")]
    pub numeric_keys: bool,
}

#[derive(Args)]
pub struct PivotArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Columns identifying an output row.
    #[arg(long = "index", value_name = "COL", num_args = 1.., required = true)]
    pub index: Vec<String>,

    /// Column whose values become new columns.
    #[arg(long = "key", value_name = "COL")]
    pub key: String,

    /// Column holding the cell values.
    #[arg(long = "value", value_name = "COL")]
    pub value: String,

    /// Append Change_Absolute and Change_Percent columns.
    #[arg(long = "change")]
    pub change: bool,
}

#[derive(Args)]
pub struct ProfileArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SentinelArg {
    /// Blank cells and null tokens.
    Null,
    /// The value 0.
    Zero,
}

impl From<SentinelArg> for SentinelPolicy {
    fn from(arg: SentinelArg) -> Self {
        match arg {
            SentinelArg::Null => Self::Null,
            SentinelArg::Zero => Self::Zero,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_impute_with_sentinel() {
        let cli = Cli::try_parse_from([
            "tabclean",
            "impute",
            "co2.csv",
            "--sentinel",
            "zero",
            "--decimals",
            "6",
        ])
        .unwrap();
        let Command::Impute(args) = cli.command else {
            panic!("expected impute");
        };
        assert!(matches!(args.sentinel, SentinelArg::Zero));
        assert_eq!(args.output.decimals, Some(6));
        assert!(args.columns.is_empty());
    }

    #[test]
    fn melt_requires_id_columns() {
        assert!(Cli::try_parse_from(["tabclean", "melt", "forest.csv"]).is_err());
        let cli = Cli::try_parse_from([
            "tabclean",
            "melt",
            "forest.csv",
            "--id",
            "Country",
            "ISO3",
            "--key",
            "Year",
            "--numeric-keys",
        ])
        .unwrap();
        let Command::Melt(args) = cli.command else {
            panic!("expected melt");
        };
        assert_eq!(args.id, vec!["Country", "ISO3"]);
        assert_eq!(args.value_name, "value");
        assert!(args.numeric_keys);
    }

    #[test]
    fn global_log_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "tabclean",
            "run",
            "batch.toml",
            "--log-format",
            "json",
            "--report",
            "out/report.json",
        ])
        .unwrap();
        assert!(matches!(cli.log_format, LogFormatArg::Json));
        assert!(matches!(cli.command, Command::Run(_)));
    }
}
