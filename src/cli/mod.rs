//! Command-line parsing for the recession indicator dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the data/metrics code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{DEFAULT_START_YEAR, DEFAULT_TRAILING_WINDOW, SeriesName};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "rw", version, about = "Unconventional recession indicators (FRED-based)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch, compute and print the dashboard, optionally exporting tables.
    Report(ReportArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same underlying pipeline as `rw report`, but renders results
    /// in a terminal UI using Ratatui.
    Tui(ReportArgs),
    /// Plot a previously exported dashboard JSON.
    Plot(PlotArgs),
}

/// Common options for the report and the TUI.
#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    /// First year of observations (January 1st).
    #[arg(short = 'y', long, default_value_t = DEFAULT_START_YEAR,
          value_parser = clap::value_parser!(i32).range(2000..=2100))]
    pub start_year: i32,

    /// Series to fetch (repeatable). Defaults to all of them.
    #[arg(short = 's', long = "series", value_enum)]
    pub series: Vec<SeriesName>,

    /// Use deterministic offline data instead of FRED (no API key needed).
    #[arg(long)]
    pub offline: bool,

    /// Seed of the offline data.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Trailing window (months) for the lipstick index alert.
    #[arg(long, default_value_t = DEFAULT_TRAILING_WINDOW)]
    pub window: usize,

    /// Cache freshness window in hours.
    #[arg(long, default_value_t = 24)]
    pub cache_hours: u64,

    /// Number of aligned rows to print.
    #[arg(long, default_value_t = 12)]
    pub tail: usize,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export aligned and normalized tables to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the full dashboard to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,

    /// Verbose logging (debug level).
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Options for plotting a saved dashboard.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Dashboard JSON file produced by `rw report --export-json`.
    #[arg(long, value_name = "JSON")]
    pub from: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_report_flags() {
        let cli = Cli::parse_from([
            "rw", "report", "-y", "2012", "-s", "lipstick", "-s", "total-retail", "--offline", "--no-plot",
        ]);
        let Command::Report(args) = cli.command else {
            panic!("expected report");
        };
        assert_eq!(args.start_year, 2012);
        assert_eq!(args.series, vec![SeriesName::LipstickProxy, SeriesName::TotalRetail]);
        assert!(args.offline);
        assert!(args.no_plot);
        assert_eq!(args.window, DEFAULT_TRAILING_WINDOW);
    }

    #[test]
    fn rejects_out_of_range_year() {
        assert!(Cli::try_parse_from(["rw", "report", "-y", "1999"]).is_err());
    }
}
