//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - checks the API credential
//! - fetches series (cached) and runs the metrics pipeline
//! - prints reports/plots
//! - writes optional exports

use std::time::Duration;

use clap::Parser;

use crate::cli::{Command, PlotArgs, ReportArgs};
use crate::data::SeriesCache;
use crate::domain::{DashboardConfig, SeriesName};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `rw` binary.
pub fn run() -> Result<(), AppError> {
    // We want `rw` and `rw -y 2010` to behave like `rw tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Report(args) => {
            crate::logging::init(crate::logging::default_level(args.verbose));
            handle_report(args)
        }
        Command::Tui(args) => {
            // Log lines would tear through the alternate screen; warnings are
            // shown in the status line instead.
            crate::logging::init(if args.verbose { "debug" } else { "off" });
            crate::tui::run(config_from_args(&args))
        }
        Command::Plot(args) => {
            crate::logging::init(crate::logging::default_level(false));
            handle_plot(args)
        }
    }
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let dash = crate::io::read_dashboard_json(&args.from)?;
    let plot = crate::plot::render_ascii_plot(&dash.normalized, &dash.recessions, args.width, args.height);
    println!("{plot}");
    Ok(())
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    let config = config_from_args(&args);
    let source = pipeline::source_from_config(&config)?;
    let mut cache = SeriesCache::new(config.cache_ttl);
    let dash = pipeline::run_dashboard(source.as_ref(), &mut cache, &config)?;

    println!("{}", crate::report::format_summary(&dash));
    println!("{}", crate::report::format_cards(&dash));

    if config.plot {
        let plot = crate::plot::render_ascii_plot(&dash.normalized, &dash.recessions, config.plot_width, config.plot_height);
        println!("{plot}");
    }

    println!("{}", crate::report::format_table(&dash.aligned.tail(config.tail_rows)));

    if let Some(path) = &config.export_csv {
        crate::io::write_tables_csv(path, &dash.aligned, &dash.normalized)?;
        tracing::info!(path = %path.display(), "wrote CSV export");
    }
    if let Some(path) = &config.export_json {
        crate::io::write_dashboard_json(path, &dash)?;
        tracing::info!(path = %path.display(), "wrote JSON export");
    }

    Ok(())
}

pub fn config_from_args(args: &ReportArgs) -> DashboardConfig {
    let series = if args.series.is_empty() {
        SeriesName::ALL.to_vec()
    } else {
        args.series.clone()
    };

    DashboardConfig {
        start_year: args.start_year,
        series,
        cache_ttl: Duration::from_secs(args.cache_hours.saturating_mul(3600)),
        trailing_window: args.window,
        offline: args.offline,
        seed: args.seed,
        tail_rows: args.tail,
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_csv: args.export.clone(),
        export_json: args.export_json.clone(),
    }
}

/// Rewrite argv so `rw` defaults to `rw tui`.
///
/// Rules:
/// - `rw`                      -> `rw tui`
/// - `rw -y 2010 ...`          -> `rw tui -y 2010 ...`
/// - `rw --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "report" | "tui" | "plot");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}
