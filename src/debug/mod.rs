//! Debug bundle writer for inspecting fetched series and computed signals.

use std::fmt::Write as _;
use std::fs::{create_dir_all, write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::app::pipeline::Dashboard;
use crate::domain::DashboardConfig;
use crate::error::{AppError, EXIT_CONFIG};
use crate::report::fmt_opt;

const DEBUG_DIR: &str = "debug";
const TAIL_ROWS: usize = 24;

/// Write a markdown bundle under `./debug` and return its path.
pub fn write_debug_bundle(dash: &Dashboard, config: &DashboardConfig) -> Result<PathBuf, AppError> {
    write_debug_bundle_in(Path::new(DEBUG_DIR), dash, config)
}

pub fn write_debug_bundle_in(dir: &Path, dash: &Dashboard, config: &DashboardConfig) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("rw_debug_{}_{ts}.md", config.start_year));

    write(&path, render_bundle(dash, config))
        .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to write debug file: {e}")))?;
    Ok(path)
}

fn render_bundle(dash: &Dashboard, config: &DashboardConfig) -> String {
    // Writing into a String cannot fail.
    let mut out = String::new();

    let _ = writeln!(out, "# rw debug bundle");
    let _ = writeln!(out, "- generated: {}", Local::now().to_rfc3339());
    let _ = writeln!(out, "- source: {}", dash.source);
    let _ = writeln!(out, "- start_date: {}", dash.start_date);
    let _ = writeln!(out, "- rows: {}", dash.aligned.len());
    let _ = writeln!(out, "- cache_ttl_secs: {}", config.cache_ttl.as_secs());
    let _ = writeln!(
        out,
        "- trailing: window={} mean={} status={}",
        dash.trailing_window,
        fmt_opt(dash.trailing_mean, 4),
        dash.trailing_status.label()
    );
    let degenerate: Vec<String> = dash.normalized.degenerate.iter().map(|k| k.slug().to_string()).collect();
    let _ = writeln!(out, "- degenerate: [{}]", degenerate.join(", "));

    let _ = writeln!(out, "\n## Series\n");
    let _ = writeln!(out, "| column | defined | min | max | last |");
    let _ = writeln!(out, "| - | - | - | - | - |");
    for col in &dash.aligned.columns {
        let defined = col.defined().count();
        let min = col.defined().fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v))));
        let max = col.defined().fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));
        let _ = writeln!(
            out,
            "| {} | {defined} | {} | {} | {} |",
            col.key.slug(),
            fmt_opt(min, 4),
            fmt_opt(max, 4),
            fmt_opt(col.last(), 4)
        );
    }

    if !dash.skipped.is_empty() {
        let _ = writeln!(out, "\n## Skipped\n");
        for s in &dash.skipped {
            let _ = writeln!(out, "- {} ({}): {}", s.name.slug(), s.name.series_id(), s.reason);
        }
    }

    let _ = writeln!(out, "\n## Cards\n");
    for card in &dash.cards {
        let _ = writeln!(out, "- {}", crate::report::format_card(card));
    }

    if !dash.recessions.is_empty() {
        let _ = writeln!(out, "\n## Recessions\n");
        for p in &dash.recessions {
            let _ = writeln!(out, "- {} .. {}", p.start, p.end);
        }
    }

    let _ = writeln!(out, "\n## Aligned tail\n");
    let _ = writeln!(out, "```");
    let _ = writeln!(out, "{}", crate::report::format_table(&dash.aligned.tail(TAIL_ROWS)));
    let _ = writeln!(out, "```");

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::run_dashboard;
    use crate::data::{SeriesCache, SyntheticSource};

    #[test]
    fn bundle_lists_columns_and_cards() {
        let config = DashboardConfig {
            offline: true,
            ..DashboardConfig::default()
        };
        let source = SyntheticSource::new(config.seed);
        let mut cache = SeriesCache::new(config.cache_ttl);
        let dash = run_dashboard(&source, &mut cache, &config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = write_debug_bundle_in(dir.path(), &dash, &config).unwrap();
        let text = std::fs::read_to_string(path).unwrap();

        assert!(text.starts_with("# rw debug bundle"));
        assert!(text.contains("- source: offline"));
        assert!(text.contains("| lipstick_index |"));
        assert!(text.contains("## Cards"));
        assert!(text.contains("## Recessions"));
    }
}
