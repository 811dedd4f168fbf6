//! Merge series onto one date axis.
//!
//! Steps:
//! 1. union of all observation dates (ascending)
//! 2. forward-fill each series over that axis
//! 3. drop leading rows until every series has a value

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{AlignedTable, Column, SeriesMap};
use crate::error::PipelineError;

/// Minimum number of aligned rows the downstream metrics need.
pub const MIN_ROWS: usize = 2;

/// Align `series` on the union of their dates from `start` onwards.
pub fn align(series: &SeriesMap, start: NaiveDate) -> Result<AlignedTable, PipelineError> {
    if series.is_empty() {
        return Err(PipelineError::NoSeries);
    }

    let dates: Vec<NaiveDate> = series
        .values()
        .flat_map(|s| s.points.iter().map(|(d, _)| *d))
        .filter(|d| *d >= start)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let columns: Vec<Column> = series
        .iter()
        .map(|(name, s)| Column::new(*name, forward_fill(&s.points, &dates, start)))
        .collect();

    // Once a row is complete, forward-fill keeps every later row complete too.
    let keep_from = (0..dates.len())
        .find(|&i| columns.iter().all(|c| c.values[i].is_some()))
        .unwrap_or(dates.len());

    if keep_from > 0 {
        debug!(dropped = keep_from, "dropped leading rows with incomplete series");
    }

    let table = AlignedTable {
        dates: dates[keep_from..].to_vec(),
        columns: columns
            .into_iter()
            .map(|c| Column::new(c.key, c.values[keep_from..].to_vec()))
            .collect(),
    };

    if table.len() < MIN_ROWS {
        return Err(PipelineError::InsufficientData { rows: table.len() });
    }
    Ok(table)
}

/// Carry the last known value of `points` across `dates`.
fn forward_fill(points: &[(NaiveDate, Option<f64>)], dates: &[NaiveDate], start: NaiveDate) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(dates.len());
    let mut last: Option<f64> = None;
    let mut iter = points.iter().filter(|(d, _)| *d >= start).peekable();

    for date in dates {
        while let Some(&&(d, v)) = iter.peek() {
            if d > *date {
                break;
            }
            if let Some(v) = v.filter(|v| v.is_finite()) {
                last = Some(v);
            }
            iter.next();
        }
        out.push(last);
    }

    out
}
