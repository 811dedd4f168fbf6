//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the upstream series vocabulary (`SeriesName`) and raw `ObservationSeries`
//! - tables produced by the metrics pipeline (`AlignedTable`, `NormalizedTable`)
//! - status-card outputs (`LatestDelta`, `StatusCard`, `RecessionPeriod`)
//! - run configuration (`DashboardConfig`)

pub mod types;

pub use types::*;
