//! Shared dashboard pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! fetch (cached) -> align -> lipstick index -> normalize + stress score -> signals
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::data::{FetchOutcome, FredClient, SeriesCache, SeriesSource, SyntheticSource};
use crate::domain::{
    AlignedTable, Column, ColumnKey, DashboardConfig, DerivedColumn, NormalizedTable, Polarity,
    RecessionPeriod, SeriesName, SkippedSeries, Status, StatusCard,
};
use crate::error::{AppError, PipelineError};
use crate::metrics;

/// Series without which the lipstick index cannot be computed.
pub const REQUIRED_SERIES: [SeriesName; 2] = [SeriesName::LipstickProxy, SeriesName::TotalRetail];

/// Scale of the lipstick index (percent of total retail).
pub const INDEX_SCALE: f64 = 100.0;

/// Status cards shown when their column is available.
const CARDS: [(ColumnKey, Polarity); 3] = [
    (ColumnKey::Derived(DerivedColumn::LipstickIndex), Polarity::RisingIsCaution),
    (ColumnKey::Series(SeriesName::MenswearProxy), Polarity::FallingIsCaution),
    (ColumnKey::Series(SeriesName::Unemployment), Polarity::RisingIsCaution),
];

/// All computed outputs of a single dashboard run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub source: String,
    pub start_date: NaiveDate,
    /// Aligned series plus the lipstick index.
    pub aligned: AlignedTable,
    /// Normalized companion of `aligned`, plus the stress score.
    pub normalized: NormalizedTable,
    pub cards: Vec<StatusCard>,
    pub trailing_window: usize,
    pub trailing_mean: Option<f64>,
    pub trailing_status: Status,
    pub recessions: Vec<RecessionPeriod>,
    pub skipped: Vec<SkippedSeries>,
}

impl Dashboard {
    pub fn index(&self) -> Option<&Column> {
        self.aligned.column(DerivedColumn::LipstickIndex)
    }

    pub fn latest_index(&self) -> Option<f64> {
        self.index().and_then(Column::last)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.aligned.dates.last().copied()
    }
}

/// Build the source selected by the configuration.
///
/// For FRED this is where a missing API key stops the run, before any
/// pipeline work happens.
pub fn source_from_config(config: &DashboardConfig) -> Result<Box<dyn SeriesSource>, AppError> {
    if config.offline {
        return Ok(Box::new(SyntheticSource::new(config.seed)));
    }
    Ok(Box::new(FredClient::from_env()?))
}

/// Fetch (through `cache`) and compute the dashboard.
pub fn run_dashboard(
    source: &dyn SeriesSource,
    cache: &mut SeriesCache,
    config: &DashboardConfig,
) -> Result<Dashboard, AppError> {
    let start = config.start_date();
    let outcome = cache.get_or_fetch(source, &config.series, start);
    let mut dashboard = compute_dashboard(&outcome, start, config)?;
    dashboard.source = source.label().to_string();
    Ok(dashboard)
}

/// Compute the dashboard from already-fetched series.
pub fn compute_dashboard(
    outcome: &FetchOutcome,
    start: NaiveDate,
    config: &DashboardConfig,
) -> Result<Dashboard, PipelineError> {
    let missing: Vec<SeriesName> = REQUIRED_SERIES
        .into_iter()
        .filter(|name| !outcome.series.contains_key(name))
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::MissingRequiredSeries(missing));
    }

    let aligned = metrics::align(&outcome.series, start)?;
    let aligned = metrics::derive_ratio_index(
        &aligned,
        SeriesName::LipstickProxy,
        SeriesName::TotalRetail,
        INDEX_SCALE,
        DerivedColumn::LipstickIndex,
    )?;

    let normalized = metrics::with_stress_score(metrics::normalize(&aligned));
    for key in &normalized.degenerate {
        warn!(column = %key, "column has no variance in range; normalized to constant");
    }

    let cards = CARDS
        .iter()
        .filter(|(key, _)| aligned.has_column(*key))
        .map(|(key, polarity)| metrics::status_card(&aligned, *key, *polarity))
        .collect::<Result<Vec<_>, _>>()?;

    let trailing_mean = metrics::trailing_mean(&aligned, DerivedColumn::LipstickIndex, config.trailing_window);
    let latest = aligned.column(DerivedColumn::LipstickIndex).and_then(Column::last);
    let trailing_status = metrics::trailing_alert(latest, trailing_mean);

    let recessions = metrics::recession_periods(&aligned);

    info!(
        rows = aligned.len(),
        columns = aligned.columns.len(),
        skipped = outcome.skipped.len(),
        "dashboard computed"
    );

    Ok(Dashboard {
        source: String::new(),
        start_date: start,
        aligned,
        normalized,
        cards,
        trailing_window: config.trailing_window,
        trailing_mean,
        trailing_status,
        recessions,
        skipped: outcome.skipped.clone(),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::data::testing::FakeSource;
    use crate::domain::{ObservationSeries, Trend};
    use crate::error::EXIT_DATA;

    fn d(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, m, 1).unwrap()
    }

    fn scenario_source() -> FakeSource {
        FakeSource::new(vec![
            ObservationSeries::from_values(
                SeriesName::Unemployment,
                [(d(1), 5.0), (d(2), 5.2), (d(3), 5.1)],
            ),
            ObservationSeries::from_values(
                SeriesName::LipstickProxy,
                [(d(1), 100.0), (d(2), 90.0), (d(3), 80.0)],
            ),
            ObservationSeries::from_values(
                SeriesName::TotalRetail,
                [(d(1), 1000.0), (d(2), 1000.0), (d(3), 800.0)],
            ),
        ])
    }

    fn config() -> DashboardConfig {
        DashboardConfig {
            start_year: 2020,
            series: vec![SeriesName::Unemployment, SeriesName::LipstickProxy, SeriesName::TotalRetail],
            trailing_window: 3,
            ..DashboardConfig::default()
        }
    }

    #[test]
    fn scenario_index_rises() {
        let src = scenario_source();
        let mut cache = SeriesCache::new(Duration::from_secs(60));
        let dash = run_dashboard(&src, &mut cache, &config()).unwrap();

        assert_eq!(dash.source, "fake");
        assert_eq!(dash.index().unwrap().values, vec![Some(10.0), Some(9.0), Some(10.0)]);

        let card = &dash.cards[0];
        assert_eq!(card.column, ColumnKey::Derived(DerivedColumn::LipstickIndex));
        assert_eq!(card.delta.current, Some(10.0));
        assert_eq!(card.delta.previous, Some(9.0));
        assert_eq!(card.delta.delta(), Some(1.0));
        assert_eq!(card.trend, Trend::Rising);
        assert_eq!(card.status, Status::Caution);

        // Unemployment 5.2 -> 5.1 is falling: normal.
        let unemployment = dash
            .cards
            .iter()
            .find(|c| c.column == ColumnKey::Series(SeriesName::Unemployment))
            .unwrap();
        assert_eq!(unemployment.status, Status::Normal);

        // Mean of [10, 9, 10] is below the latest 10.
        assert_eq!(dash.trailing_status, Status::Caution);
    }

    #[test]
    fn normalized_table_includes_stress_score() {
        let outcome = crate::data::fetch_all(&scenario_source(), &config().series, d(1));
        let dash = compute_dashboard(&outcome, d(1), &config()).unwrap();
        let stress = dash.normalized.column(DerivedColumn::StressScore).unwrap();
        assert_eq!(stress.values.len(), 3);
        for v in dash.normalized.columns.iter().flat_map(|c| c.values.iter().flatten()) {
            assert!((0.0..=1.0).contains(v));
        }
    }

    #[test]
    fn skipped_optional_series_still_computes() {
        let src = scenario_source().failing(SeriesName::Unemployment);
        let mut cache = SeriesCache::new(Duration::from_secs(60));
        let dash = run_dashboard(&src, &mut cache, &config()).unwrap();

        assert_eq!(dash.skipped.len(), 1);
        assert_eq!(dash.skipped[0].name, SeriesName::Unemployment);
        assert!(!dash.aligned.has_column(SeriesName::Unemployment));
        assert_eq!(dash.cards.len(), 1);
    }

    #[test]
    fn missing_required_series_is_reported() {
        let src = scenario_source().failing(SeriesName::TotalRetail);
        let outcome = crate::data::fetch_all(&src, &config().series, d(1));
        let err = compute_dashboard(&outcome, d(1), &config()).unwrap_err();
        assert_eq!(err, PipelineError::MissingRequiredSeries(vec![SeriesName::TotalRetail]));
    }

    #[test]
    fn insufficient_rows_surface_as_data_error() {
        let src = FakeSource::new(vec![
            ObservationSeries::from_values(SeriesName::LipstickProxy, [(d(1), 100.0)]),
            ObservationSeries::from_values(SeriesName::TotalRetail, [(d(1), 1000.0)]),
        ]);
        let mut cache = SeriesCache::new(Duration::from_secs(60));
        let err = run_dashboard(&src, &mut cache, &config()).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_DATA);
    }

    #[test]
    fn offline_source_builds_a_full_dashboard() {
        let config = DashboardConfig {
            offline: true,
            start_year: 2006,
            ..DashboardConfig::default()
        };
        let source = source_from_config(&config).unwrap();
        let mut cache = SeriesCache::new(config.cache_ttl);
        let dash = run_dashboard(source.as_ref(), &mut cache, &config).unwrap();

        assert_eq!(dash.source, "offline");
        assert!(dash.aligned.len() > 100);
        assert_eq!(dash.cards.len(), 3);
        assert!(!dash.recessions.is_empty());
        assert!(dash.trailing_mean.is_some());
    }
}
