//! Composite stress score over normalized columns.
//!
//! Components (each already in `[0, 1]`):
//! - lipstick index (higher = more stress)
//! - unemployment (higher = more stress)
//! - menswear proxy, inverted (lower sales = more stress)
//!
//! The score of a row is the mean of whichever components are defined there.

use crate::domain::{Column, ColumnKey, DerivedColumn, NormalizedTable, SeriesName};

const COMPONENTS: [(ColumnKey, bool); 3] = [
    (ColumnKey::Derived(DerivedColumn::LipstickIndex), false),
    (ColumnKey::Series(SeriesName::Unemployment), false),
    (ColumnKey::Series(SeriesName::MenswearProxy), true),
];

/// Compute the stress score column for `normalized`.
pub fn stress_score(normalized: &NormalizedTable) -> Column {
    let parts: Vec<(&Column, bool)> = COMPONENTS
        .iter()
        .filter_map(|(key, inverted)| normalized.column(*key).map(|c| (c, *inverted)))
        .collect();

    let values = (0..normalized.len())
        .map(|row| {
            let mut sum = 0.0;
            let mut n = 0usize;
            for (col, inverted) in &parts {
                if let Some(v) = col.values[row].filter(|v| v.is_finite()) {
                    sum += if *inverted { 1.0 - v } else { v };
                    n += 1;
                }
            }
            (n > 0).then(|| sum / n as f64)
        })
        .collect();

    Column::new(DerivedColumn::StressScore, values)
}

/// Append (or replace) the stress score column.
pub fn with_stress_score(mut normalized: NormalizedTable) -> NormalizedTable {
    let col = stress_score(&normalized);
    normalized.columns.retain(|c| c.key != col.key);
    normalized.columns.push(col);
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn normalized(columns: Vec<Column>) -> NormalizedTable {
        let n = columns[0].values.len();
        NormalizedTable {
            dates: (1..=n as u32).map(|m| NaiveDate::from_ymd_opt(2020, m, 1).unwrap()).collect(),
            columns,
            degenerate: Vec::new(),
        }
    }

    #[test]
    fn averages_components_with_menswear_inverted() {
        let t = normalized(vec![
            Column::new(DerivedColumn::LipstickIndex, vec![Some(1.0), Some(0.0)]),
            Column::new(SeriesName::Unemployment, vec![Some(0.5), Some(0.0)]),
            Column::new(SeriesName::MenswearProxy, vec![Some(0.0), Some(1.0)]),
        ]);
        let score = stress_score(&t);
        assert_eq!(score.values, vec![Some(2.5 / 3.0), Some(0.0)]);
    }

    #[test]
    fn skips_undefined_and_missing_components() {
        let t = normalized(vec![
            Column::new(DerivedColumn::LipstickIndex, vec![None, Some(0.25), None]),
            Column::new(SeriesName::Unemployment, vec![Some(0.75), Some(0.75), None]),
        ]);
        let score = stress_score(&t);
        assert_eq!(score.values, vec![Some(0.75), Some(0.5), None]);
        for v in score.values.iter().flatten() {
            assert!((0.0..=1.0).contains(v));
        }
    }

    #[test]
    fn appends_once() {
        let t = normalized(vec![Column::new(SeriesName::Unemployment, vec![Some(0.0), Some(1.0)])]);
        let t = with_stress_score(with_stress_score(t));
        assert_eq!(t.columns.len(), 2);
        assert!(t.column(DerivedColumn::StressScore).is_some());
    }
}
