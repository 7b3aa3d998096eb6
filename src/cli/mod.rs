//! Command-line parsing for the CVU dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the pipeline/aggregation code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{BadRowPolicy, GroupKey};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "cvu", version, about = "Thermal-Plant Variable Cost Dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the dataset overview, summary statistics, ranking, and spread.
    Summary(QueryArgs),
    /// Print the top-plants ranking only (useful for scripting).
    Top(QueryArgs),
    /// Launch the interactive dashboard.
    ///
    /// This uses the same underlying pipeline as `cvu summary`, but renders
    /// the four chart views in a terminal UI using Ratatui.
    Tui(QueryArgs),
    /// Write a deterministic synthetic dataset (for demos and tests).
    Sample(SampleArgs),
}

/// Common options for querying a dataset.
#[derive(Debug, Parser, Clone)]
pub struct QueryArgs {
    /// Input CSV. Falls back to the CVU_DATA environment variable (.env).
    pub csv: Option<PathBuf>,

    /// Filter to one subsystem (e.g. N, NE, S, SE).
    #[arg(short = 's', long)]
    pub subsystem: Option<String>,

    /// Filter to one month (YYYY-MM).
    #[arg(short = 'm', long)]
    pub month: Option<String>,

    /// Filter to one plant (also selects the time-series view's plant).
    #[arg(short = 'p', long)]
    pub plant: Option<String>,

    /// Grouping key for the cost-spread table.
    #[arg(long, value_enum, default_value_t = GroupKey::Subsystem)]
    pub group_by: GroupKey,

    /// Show the top-N plants by average cost.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// What to do with rows that fail to parse.
    #[arg(long, value_enum, default_value_t = BadRowPolicy::Skip)]
    pub on_bad_rows: BadRowPolicy,

    /// Export the filtered rows to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the summary statistics and ranking to JSON.
    #[arg(long = "export-stats")]
    pub export_stats: Option<PathBuf>,
}

/// Options for the synthetic dataset writer.
#[derive(Debug, Parser)]
pub struct SampleArgs {
    /// Output CSV path.
    pub out: PathBuf,

    /// Number of rows to generate.
    #[arg(short = 'n', long, default_value_t = 520)]
    pub count: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
