//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads and transforms the dataset
//! - runs aggregations and prints reports
//! - writes optional exports
//! - hands off to the TUI

use std::path::PathBuf;

use clap::Parser;

use crate::cli::{Command, QueryArgs, SampleArgs};
use crate::domain::{LoadConfig, QueryParams};
use crate::error::AppError;
use crate::query;
use crate::report;

pub mod pipeline;

/// Entry point for the `cvu` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` may define CVU_DATA (the default dataset path).
    dotenvy::dotenv().ok();

    // We want `cvu` and `cvu data.csv` to behave like `cvu tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing. This preserves a clean clap structure
    // while retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Summary(args) => handle_query(args, OutputMode::Full),
        Command::Top(args) => handle_query(args, OutputMode::RankOnly),
        Command::Tui(args) => handle_tui(args),
        Command::Sample(args) => handle_sample(args),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    RankOnly,
}

fn handle_query(args: QueryArgs, mode: OutputMode) -> Result<(), AppError> {
    let config = load_config_from_args(&args)?;
    let params = query_params_from_args(&args)?;
    let data = pipeline::load_dashboard(&config)?;

    let filtered = pipeline::apply_filters(&data.table.records, &params);
    let stats = query::summary_stats(&filtered);
    let top = query::average_cost_by_plant(&filtered, params.top_n);

    match mode {
        OutputMode::Full => {
            println!("{}", report::format_run_summary(&data, &params, filtered.len()));
            println!("{}", report::format_stats_table(&stats));
            println!("{}", report::format_top_plants(&top));
            println!(
                "{}",
                report::format_group_spread(
                    &query::group_spread(&filtered, params.group_by),
                    params.group_by
                )
            );
        }
        OutputMode::RankOnly => {
            println!("{}", report::format_top_plants(&top));
        }
    }

    // Optional exports.
    if let Some(path) = &args.export {
        report::export::write_results_csv(path, &data.table.extra_columns, &filtered)?;
    }
    if let Some(path) = &args.export_stats {
        let export = report::export::StatsExport::build(&data, &params);
        report::export::write_stats_json(path, &export)?;
    }

    Ok(())
}

fn handle_tui(args: QueryArgs) -> Result<(), AppError> {
    let config = load_config_from_args(&args)?;
    let params = query_params_from_args(&args)?;
    crate::tui::run(config, params)
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let rows = crate::data::sample::write_sample_csv(&args.out, args.count, args.seed)?;
    println!("Wrote {rows} rows to '{}'.", args.out.display());
    Ok(())
}

fn load_config_from_args(args: &QueryArgs) -> Result<LoadConfig, AppError> {
    let csv_path = match &args.csv {
        Some(path) => path.clone(),
        None => std::env::var("CVU_DATA").map(PathBuf::from).map_err(|_| {
            AppError::config("No CSV path given and CVU_DATA is not set (flag or .env).")
        })?,
    };
    Ok(LoadConfig {
        csv_path,
        bad_rows: args.on_bad_rows,
    })
}

fn query_params_from_args(args: &QueryArgs) -> Result<QueryParams, AppError> {
    if args.top == 0 {
        return Err(AppError::config("`--top` must be > 0."));
    }
    Ok(QueryParams {
        subsystem: args.subsystem.clone(),
        month: args.month.clone(),
        plant: args.plant.clone(),
        group_by: args.group_by,
        top_n: args.top,
    })
}

/// Rewrite argv so `cvu` defaults to `cvu tui`.
///
/// Rules:
/// - `cvu`                     -> `cvu tui`
/// - `cvu data.csv ...`        -> `cvu tui data.csv ...`
/// - `cvu -m 2024-01 ...`      -> `cvu tui -m 2024-01 ...`
/// - `cvu --help/--version/-h` -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "summary" | "top" | "tui" | "sample");
    if is_subcommand {
        return argv;
    }

    // Anything else (a flag or a CSV path) is treated as "tui arguments".
    argv.insert(1, "tui".to_string());
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_tui() {
        assert_eq!(rewrite_args(argv(&["cvu"])), argv(&["cvu", "tui"]));
    }

    #[test]
    fn path_and_flags_are_routed_to_tui() {
        assert_eq!(
            rewrite_args(argv(&["cvu", "data.csv"])),
            argv(&["cvu", "tui", "data.csv"])
        );
        assert_eq!(
            rewrite_args(argv(&["cvu", "-m", "2024-01"])),
            argv(&["cvu", "tui", "-m", "2024-01"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        assert_eq!(
            rewrite_args(argv(&["cvu", "summary", "data.csv"])),
            argv(&["cvu", "summary", "data.csv"])
        );
        assert_eq!(rewrite_args(argv(&["cvu", "--help"])), argv(&["cvu", "--help"]));
    }
}
