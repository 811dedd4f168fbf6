//! Upstream series sources.
//!
//! - `fred`: the FRED HTTP API
//! - `synthetic`: deterministic offline data
//! - `cache`: time-bounded memoization of whole fetches
//!
//! Every series is fetched independently. A failing series is logged, recorded
//! in `FetchOutcome::skipped` and does not stop the others.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::domain::{ObservationSeries, SeriesMap, SeriesName, SkippedSeries};
use crate::error::AppError;

pub mod cache;
pub mod fred;
pub mod synthetic;

pub use cache::SeriesCache;
pub use fred::FredClient;
pub use synthetic::SyntheticSource;

/// Something that can return an observation series for a name and start date.
pub trait SeriesSource {
    /// Short name for logs and headers.
    fn label(&self) -> &str;

    /// Fetch `name` with observations on or after `start`.
    fn fetch(&self, name: SeriesName, start: NaiveDate) -> Result<ObservationSeries, AppError>;
}

/// Result of fetching a set of series: the ones that arrived and the ones that did not.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub series: SeriesMap,
    pub skipped: Vec<SkippedSeries>,
}

impl FetchOutcome {
    pub fn names(&self) -> BTreeSet<SeriesName> {
        self.series.keys().copied().collect()
    }
}

/// Fetch each of `names` independently, collecting partial success.
pub fn fetch_all<S: SeriesSource + ?Sized>(source: &S, names: &[SeriesName], start: NaiveDate) -> FetchOutcome {
    let mut outcome = FetchOutcome::default();
    let unique: BTreeSet<SeriesName> = names.iter().copied().collect();

    for name in unique {
        let reason = match source.fetch(name, start) {
            Ok(series) if series.observed_count() > 0 => {
                info!(
                    source = source.label(),
                    series_id = name.series_id(),
                    points = series.points.len(),
                    "fetched series"
                );
                outcome.series.insert(name, series);
                continue;
            }
            Ok(_) => "no observations returned".to_string(),
            Err(err) => err.to_string(),
        };

        warn!(
            source = source.label(),
            series_id = name.series_id(),
            %reason,
            "skipping series"
        );
        outcome.skipped.push(SkippedSeries { name, reason });
    }

    outcome
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory source for tests.

    use std::cell::Cell;
    use std::collections::BTreeMap;

    use super::*;
    use crate::error::EXIT_UPSTREAM;

    pub struct FakeSource {
        pub series: BTreeMap<SeriesName, ObservationSeries>,
        pub failing: BTreeSet<SeriesName>,
        pub calls: Cell<usize>,
    }

    impl FakeSource {
        pub fn new(series: Vec<ObservationSeries>) -> Self {
            Self {
                series: series.into_iter().map(|s| (s.name, s)).collect(),
                failing: BTreeSet::new(),
                calls: Cell::new(0),
            }
        }

        pub fn failing(mut self, name: SeriesName) -> Self {
            self.failing.insert(name);
            self
        }
    }

    impl SeriesSource for FakeSource {
        fn label(&self) -> &str {
            "fake"
        }

        fn fetch(&self, name: SeriesName, start: NaiveDate) -> Result<ObservationSeries, AppError> {
            self.calls.set(self.calls.get() + 1);
            if self.failing.contains(&name) {
                return Err(AppError::new(EXIT_UPSTREAM, format!("{} unavailable", name.series_id())));
            }
            let series = self
                .series
                .get(&name)
                .cloned()
                .unwrap_or_else(|| ObservationSeries::new(name, Vec::new()));
            let points = series.points.into_iter().filter(|(d, _)| *d >= start).collect();
            Ok(ObservationSeries::new(name, points))
        }
    }
}
