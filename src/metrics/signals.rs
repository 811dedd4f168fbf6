//! Latest-move signals: deltas, status classification, trailing-mean alert and
//! recession periods.

use crate::domain::{
    AlignedTable, ColumnKey, LatestDelta, Polarity, RecessionPeriod, SeriesName, Status, StatusCard,
    Trend,
};
use crate::error::PipelineError;
use crate::metrics::align::MIN_ROWS;

/// Last and second-to-last value of `column`.
pub fn latest_delta(table: &AlignedTable, column: impl Into<ColumnKey>) -> Result<LatestDelta, PipelineError> {
    let key = column.into();
    if table.len() < MIN_ROWS {
        return Err(PipelineError::InsufficientData { rows: table.len() });
    }
    let col = table.column(key).ok_or(PipelineError::MissingColumn(key))?;
    let n = col.values.len();
    Ok(LatestDelta {
        current: col.values[n - 1].filter(|v| v.is_finite()),
        previous: col.values[n - 2].filter(|v| v.is_finite()),
    })
}

/// Read a trend as a caution or normal signal.
pub fn classify(trend: Trend, polarity: Polarity) -> Status {
    match (trend, polarity) {
        (Trend::Undefined, _) => Status::Unknown,
        (Trend::Rising, Polarity::RisingIsCaution) => Status::Caution,
        (Trend::Falling, Polarity::FallingIsCaution) => Status::Caution,
        _ => Status::Normal,
    }
}

/// Latest delta of `column` packaged as a status card.
pub fn status_card(
    table: &AlignedTable,
    column: impl Into<ColumnKey>,
    polarity: Polarity,
) -> Result<StatusCard, PipelineError> {
    let key = column.into();
    let delta = latest_delta(table, key)?;
    let trend = delta.trend();
    let date = *table
        .dates
        .last()
        .ok_or(PipelineError::InsufficientData { rows: 0 })?;
    Ok(StatusCard {
        column: key,
        date,
        delta,
        trend,
        polarity,
        status: classify(trend, polarity),
    })
}

/// Mean of the last `window` values of `column`.
///
/// `None` unless the table holds at least `window` rows and all of them are
/// defined.
pub fn trailing_mean(table: &AlignedTable, column: impl Into<ColumnKey>, window: usize) -> Option<f64> {
    if window == 0 {
        return None;
    }
    let col = table.column(column)?;
    if col.values.len() < window {
        return None;
    }
    let tail = &col.values[col.values.len() - window..];
    let mut sum = 0.0;
    for v in tail {
        let v = v.filter(|v| v.is_finite())?;
        sum += v;
    }
    Some(sum / window as f64)
}

/// Latest value strictly above its trailing mean reads as a caution signal.
pub fn trailing_alert(latest: Option<f64>, mean: Option<f64>) -> Status {
    match (latest, mean) {
        (Some(l), Some(m)) if l > m => Status::Caution,
        (Some(_), Some(_)) => Status::Normal,
        _ => Status::Unknown,
    }
}

/// Maximal runs of rows where the recession indicator equals 1.
pub fn recession_periods(table: &AlignedTable) -> Vec<RecessionPeriod> {
    let Some(col) = table.column(SeriesName::Recession) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut open: Option<RecessionPeriod> = None;
    for (date, value) in table.dates.iter().zip(&col.values) {
        let in_recession = matches!(value, Some(v) if *v == 1.0);
        if !in_recession {
            out.extend(open.take());
            continue;
        }
        match open.as_mut() {
            Some(period) => period.end = *date,
            None => {
                open = Some(RecessionPeriod {
                    start: *date,
                    end: *date,
                })
            }
        }
    }
    out.extend(open);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::{Column, DerivedColumn};

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn table(columns: Vec<Column>) -> AlignedTable {
        let n = columns[0].values.len();
        AlignedTable {
            dates: (0..n as u32).map(|i| d(2008 + (i / 12) as i32, i % 12 + 1)).collect(),
            columns,
        }
    }

    #[test]
    fn latest_delta_of_rising_index() {
        let t = table(vec![Column::new(
            DerivedColumn::LipstickIndex,
            vec![Some(10.0), Some(9.0), Some(10.0)],
        )]);
        let delta = latest_delta(&t, DerivedColumn::LipstickIndex).unwrap();
        assert_eq!(delta.current, Some(10.0));
        assert_eq!(delta.previous, Some(9.0));
        assert_eq!(delta.delta(), Some(1.0));
        assert_eq!(delta.trend(), Trend::Rising);
        assert_eq!(classify(delta.trend(), Polarity::RisingIsCaution), Status::Caution);
    }

    #[test]
    fn latest_delta_needs_two_rows() {
        let t = table(vec![Column::new(SeriesName::Unemployment, vec![Some(5.0)])]);
        assert_eq!(
            latest_delta(&t, SeriesName::Unemployment),
            Err(PipelineError::InsufficientData { rows: 1 })
        );
    }

    #[test]
    fn undefined_latest_value_is_unknown_status() {
        let t = table(vec![Column::new(DerivedColumn::LipstickIndex, vec![Some(10.0), None])]);
        let card = status_card(&t, DerivedColumn::LipstickIndex, Polarity::RisingIsCaution).unwrap();
        assert_eq!(card.trend, Trend::Undefined);
        assert_eq!(card.status, Status::Unknown);
    }

    #[test]
    fn falling_category_is_caution() {
        assert_eq!(classify(Trend::Falling, Polarity::FallingIsCaution), Status::Caution);
        assert_eq!(classify(Trend::Rising, Polarity::FallingIsCaution), Status::Normal);
        assert_eq!(classify(Trend::Flat, Polarity::RisingIsCaution), Status::Normal);
    }

    #[test]
    fn trailing_mean_needs_full_defined_window() {
        let t = table(vec![Column::new(
            DerivedColumn::LipstickIndex,
            vec![Some(1.0), Some(2.0), Some(3.0), Some(6.0)],
        )]);
        assert_eq!(trailing_mean(&t, DerivedColumn::LipstickIndex, 3), Some(11.0 / 3.0));
        assert_eq!(trailing_mean(&t, DerivedColumn::LipstickIndex, 5), None);

        let gappy = table(vec![Column::new(DerivedColumn::LipstickIndex, vec![Some(1.0), None, Some(3.0)])]);
        assert_eq!(trailing_mean(&gappy, DerivedColumn::LipstickIndex, 2), None);
        assert_eq!(trailing_mean(&gappy, DerivedColumn::LipstickIndex, 1), Some(3.0));
    }

    #[test]
    fn trailing_alert_compares_latest_to_mean() {
        assert_eq!(trailing_alert(Some(3.0), Some(2.0)), Status::Caution);
        assert_eq!(trailing_alert(Some(2.0), Some(2.0)), Status::Normal);
        assert_eq!(trailing_alert(None, Some(2.0)), Status::Unknown);
    }

    #[test]
    fn finds_recession_runs() {
        let t = table(vec![Column::new(
            SeriesName::Recession,
            vec![Some(0.0), Some(1.0), Some(1.0), Some(0.0), Some(1.0)],
        )]);
        let periods = recession_periods(&t);
        assert_eq!(
            periods,
            vec![
                RecessionPeriod { start: d(2008, 2), end: d(2008, 3) },
                RecessionPeriod { start: d(2008, 5), end: d(2008, 5) },
            ]
        );
    }

    #[test]
    fn no_recession_column_means_no_periods() {
        let t = table(vec![Column::new(SeriesName::Unemployment, vec![Some(5.0), Some(6.0)])]);
        assert!(recession_periods(&t).is_empty());
    }
}
