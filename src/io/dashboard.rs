//! Read/write dashboard JSON files.
//!
//! Dashboard JSON is the "portable" representation of a run:
//! - aligned and normalized tables
//! - status cards and recession periods
//! - skipped series
//!
//! It can be re-plotted later with `rw plot --from <file>` without refetching.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::app::pipeline::Dashboard;
use crate::error::{AppError, EXIT_CONFIG};

const TOOL: &str = "rw";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardFile {
    pub tool: String,
    pub dashboard: Dashboard,
}

/// Write a dashboard JSON file.
pub fn write_dashboard_json(path: &Path, dashboard: &Dashboard) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to create dashboard JSON '{}': {e}", path.display())))?;

    let doc = DashboardFile {
        tool: TOOL.to_string(),
        dashboard: dashboard.clone(),
    };
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, &doc)
        .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to write dashboard JSON: {e}")))?;
    out.flush()
        .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to write dashboard JSON: {e}")))
}

/// Read a dashboard JSON file.
pub fn read_dashboard_json(path: &Path) -> Result<Dashboard, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to open dashboard JSON '{}': {e}", path.display())))?;
    let doc: DashboardFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(EXIT_CONFIG, format!("Invalid dashboard JSON: {e}")))?;
    if doc.tool != TOOL {
        return Err(AppError::new(
            EXIT_CONFIG,
            format!("Dashboard JSON was written by '{}', expected '{TOOL}'.", doc.tool),
        ));
    }
    Ok(doc.dashboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::run_dashboard;
    use crate::data::{SeriesCache, SyntheticSource};
    use crate::domain::DashboardConfig;

    #[test]
    fn saved_dashboard_reloads() {
        let config = DashboardConfig {
            offline: true,
            start_year: 2018,
            ..DashboardConfig::default()
        };
        let source = SyntheticSource::new(config.seed);
        let mut cache = SeriesCache::new(config.cache_ttl);
        let dash = run_dashboard(&source, &mut cache, &config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dash.json");
        write_dashboard_json(&path, &dash).unwrap();
        let back = read_dashboard_json(&path).unwrap();

        assert_eq!(back.aligned.dates, dash.aligned.dates);
        assert_eq!(back.normalized.columns.len(), dash.normalized.columns.len());
        assert_eq!(back.recessions, dash.recessions);
        assert_eq!(back.cards.len(), dash.cards.len());
    }

    fn offline_dashboard(start_year: i32) -> Dashboard {
        let config = DashboardConfig {
            offline: true,
            start_year,
            ..DashboardConfig::default()
        };
        let source = SyntheticSource::new(config.seed);
        let mut cache = SeriesCache::new(config.cache_ttl);
        run_dashboard(&source, &mut cache, &config).unwrap()
    }

    #[test]
    fn rejects_files_from_other_tools() {
        let doc = DashboardFile {
            tool: "rv".to_string(),
            dashboard: offline_dashboard(2024),
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.json");
        std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

        let err = read_dashboard_json(&path).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_CONFIG);
        assert!(err.message().contains("written by 'rv'"), "{err}");
    }

    #[test]
    fn rejects_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, r#"{"tool": "rw", "dashboard": {}}"#).unwrap();
        let err = read_dashboard_json(&path).unwrap_err();
        assert!(err.message().starts_with("Invalid dashboard JSON"), "{err}");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn write_failure_is_reported() {
        let dash = offline_dashboard(2024);
        let err = write_dashboard_json(Path::new("/dev/full"), &dash).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_CONFIG);
    }
}
