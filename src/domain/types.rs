//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory by the metrics pipeline
//! - exported to JSON/CSV
//! - rendered by the report, plot and TUI front-ends

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The fixed vocabulary of upstream series the dashboard knows how to use.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SeriesName {
    /// Civilian unemployment rate (percent).
    Unemployment,
    /// Health & personal care store sales, the "lipstick" proxy.
    #[value(name = "lipstick")]
    LipstickProxy,
    /// Men's clothing store sales, the "menswear" proxy.
    #[value(name = "menswear")]
    MenswearProxy,
    /// Advance retail sales excluding food services.
    #[value(name = "total-retail")]
    TotalRetail,
    /// NBER recession indicator (1 = in recession, 0 otherwise).
    Recession,
}

impl SeriesName {
    pub const ALL: [SeriesName; 5] = [
        SeriesName::Unemployment,
        SeriesName::LipstickProxy,
        SeriesName::MenswearProxy,
        SeriesName::TotalRetail,
        SeriesName::Recession,
    ];

    /// FRED series identifier.
    pub fn series_id(self) -> &'static str {
        match self {
            SeriesName::Unemployment => "UNRATE",
            SeriesName::LipstickProxy => "MRTSSM44611USS",
            SeriesName::MenswearProxy => "MRTSSM44811USS",
            SeriesName::TotalRetail => "RSXFS",
            SeriesName::Recession => "USREC",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SeriesName::Unemployment => "Unemployment",
            SeriesName::LipstickProxy => "Lipstick proxy",
            SeriesName::MenswearProxy => "Menswear proxy",
            SeriesName::TotalRetail => "Total retail",
            SeriesName::Recession => "Recession",
        }
    }

    /// Column label used in tables and exports.
    pub fn slug(self) -> &'static str {
        match self {
            SeriesName::Unemployment => "unemployment",
            SeriesName::LipstickProxy => "lipstick_proxy",
            SeriesName::MenswearProxy => "menswear_proxy",
            SeriesName::TotalRetail => "total_retail",
            SeriesName::Recession => "recession",
        }
    }
}

/// Columns computed from other columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedColumn {
    /// `100 * lipstick proxy / total retail`.
    LipstickIndex,
    /// Mean of the normalized stress components, in `[0, 1]`.
    StressScore,
}

impl DerivedColumn {
    pub fn display_name(self) -> &'static str {
        match self {
            DerivedColumn::LipstickIndex => "Lipstick index",
            DerivedColumn::StressScore => "Stress score",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            DerivedColumn::LipstickIndex => "lipstick_index",
            DerivedColumn::StressScore => "stress_score",
        }
    }
}

/// Identifies a column of a table: either a raw series or a derived metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKey {
    Series(SeriesName),
    Derived(DerivedColumn),
}

impl ColumnKey {
    pub fn display_name(self) -> &'static str {
        match self {
            ColumnKey::Series(s) => s.display_name(),
            ColumnKey::Derived(d) => d.display_name(),
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            ColumnKey::Series(s) => s.slug(),
            ColumnKey::Derived(d) => d.slug(),
        }
    }
}

impl From<SeriesName> for ColumnKey {
    fn from(value: SeriesName) -> Self {
        ColumnKey::Series(value)
    }
}

impl From<DerivedColumn> for ColumnKey {
    fn from(value: DerivedColumn) -> Self {
        ColumnKey::Derived(value)
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// A named, date-indexed sequence of observations.
///
/// Dates are strictly increasing. A `None` value is a missing observation
/// (FRED reports these as `"."`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationSeries {
    pub name: SeriesName,
    pub points: Vec<(NaiveDate, Option<f64>)>,
}

impl ObservationSeries {
    /// Build a series, sorting by date. Later duplicates of a date win.
    pub fn new(name: SeriesName, mut points: Vec<(NaiveDate, Option<f64>)>) -> Self {
        // Stable sort keeps input order among equal dates, so the last one is kept.
        points.sort_by_key(|(d, _)| *d);
        let mut out: Vec<(NaiveDate, Option<f64>)> = Vec::with_capacity(points.len());
        for (date, value) in points {
            match out.last_mut() {
                Some(last) if last.0 == date => last.1 = value,
                _ => out.push((date, value)),
            }
        }
        Self { name, points: out }
    }

    /// Convenience constructor for fully observed series.
    pub fn from_values(name: SeriesName, points: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
        Self::new(name, points.into_iter().map(|(d, v)| (d, Some(v))).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points carrying an actual value.
    pub fn observed_count(&self) -> usize {
        self.points.iter().filter(|(_, v)| v.is_some()).count()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|(d, _)| *d)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|(d, _)| *d)
    }
}

/// Input of the pipeline: one series per name.
pub type SeriesMap = BTreeMap<SeriesName, ObservationSeries>;

/// One column of a table. `None` is the explicit undefined marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub key: ColumnKey,
    pub values: Vec<Option<f64>>,
}

impl Column {
    pub fn new(key: impl Into<ColumnKey>, values: Vec<Option<f64>>) -> Self {
        Self {
            key: key.into(),
            values,
        }
    }

    /// Defined, finite values only.
    pub fn defined(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(|v| *v).filter(|v| v.is_finite())
    }

    pub fn last(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }
}

/// Series merged onto one ascending date axis.
///
/// Every `Series` column holds a value in every row; derived columns may carry
/// undefined markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedTable {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<Column>,
}

impl AlignedTable {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column(&self, key: impl Into<ColumnKey>) -> Option<&Column> {
        let key = key.into();
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn has_column(&self, key: impl Into<ColumnKey>) -> bool {
        self.column(key).is_some()
    }

    /// The series columns turned back into pipeline input.
    pub fn to_series_map(&self) -> SeriesMap {
        let mut out = SeriesMap::new();
        for col in &self.columns {
            if let ColumnKey::Series(name) = col.key {
                let points = self.dates.iter().copied().zip(col.values.iter().copied()).collect();
                out.insert(name, ObservationSeries::new(name, points));
            }
        }
        out
    }

    /// Keep only the last `n` rows.
    pub fn tail(&self, n: usize) -> AlignedTable {
        let start = self.len().saturating_sub(n);
        AlignedTable {
            dates: self.dates[start..].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.key, c.values[start..].to_vec()))
                .collect(),
        }
    }
}

/// Min–max normalized companion of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTable {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<Column>,
    /// Columns whose min equalled their max (mapped to the degenerate constant).
    pub degenerate: Vec<ColumnKey>,
}

impl NormalizedTable {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column(&self, key: impl Into<ColumnKey>) -> Option<&Column> {
        let key = key.into();
        self.columns.iter().find(|c| c.key == key)
    }
}

/// Direction of the most recent move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Flat,
    Undefined,
}

impl Trend {
    pub fn arrow(self) -> &'static str {
        match self {
            Trend::Rising => "↑",
            Trend::Falling => "↓",
            Trend::Flat => "→",
            Trend::Undefined => "?",
        }
    }
}

/// Which direction of movement is read as a warning sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    RisingIsCaution,
    FallingIsCaution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Caution,
    Normal,
    Unknown,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Caution => "CAUTION",
            Status::Normal => "normal",
            Status::Unknown => "n/a",
        }
    }
}

/// Last two values of a column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatestDelta {
    pub current: Option<f64>,
    pub previous: Option<f64>,
}

impl LatestDelta {
    pub fn delta(&self) -> Option<f64> {
        match (self.current, self.previous) {
            (Some(c), Some(p)) if (c - p).is_finite() => Some(c - p),
            _ => None,
        }
    }

    pub fn trend(&self) -> Trend {
        match self.delta() {
            Some(d) if d > 0.0 => Trend::Rising,
            Some(d) if d < 0.0 => Trend::Falling,
            Some(_) => Trend::Flat,
            None => Trend::Undefined,
        }
    }
}

/// A labeled latest value with its classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCard {
    pub column: ColumnKey,
    pub date: NaiveDate,
    pub delta: LatestDelta,
    pub trend: Trend,
    pub polarity: Polarity,
    pub status: Status,
}

/// Inclusive range of consecutive recession months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecessionPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A series that could not be used, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSeries {
    pub name: SeriesName,
    pub reason: String,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Observations start on January 1st of this year.
    pub start_year: i32,
    /// Requested upstream series.
    pub series: Vec<SeriesName>,
    /// Freshness window of cached upstream fetches.
    pub cache_ttl: Duration,
    /// Window (rows) of the trailing-mean alert on the lipstick index.
    pub trailing_window: usize,

    /// Use the deterministic offline source instead of FRED.
    pub offline: bool,
    pub seed: u64,

    pub tail_rows: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

pub const DEFAULT_START_YEAR: i32 = 2008;
pub const DEFAULT_TRAILING_WINDOW: usize = 12;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

impl DashboardConfig {
    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.start_year, 1, 1).unwrap_or(NaiveDate::MIN)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            start_year: DEFAULT_START_YEAR,
            series: SeriesName::ALL.to_vec(),
            cache_ttl: DEFAULT_CACHE_TTL,
            trailing_window: DEFAULT_TRAILING_WINDOW,
            offline: false,
            seed: 42,
            tail_rows: 12,
            plot: true,
            plot_width: 100,
            plot_height: 20,
            export_csv: None,
            export_json: None,
        }
    }
}
