//! Min–max normalization.
//!
//! Each column is rescaled independently over the rows currently loaded, so
//! series with very different units can share one `[0, 1]` chart axis.
//!
//! Degenerate columns (min == max) have no meaningful position inside their
//! range. Every defined cell of such a column becomes `DEGENERATE_FILL` and
//! the column key is listed in `NormalizedTable::degenerate`. Undefined cells
//! never take part in the min/max and stay undefined.

use crate::domain::{AlignedTable, Column, NormalizedTable};

/// Value assigned to every defined cell of a zero-variance column.
pub const DEGENERATE_FILL: f64 = 0.0;

/// Normalize every column of `table`.
pub fn normalize(table: &AlignedTable) -> NormalizedTable {
    let mut degenerate = Vec::new();
    let columns = table
        .columns
        .iter()
        .map(|col| {
            let (out, is_degenerate) = normalize_column(col);
            if is_degenerate {
                degenerate.push(col.key);
            }
            out
        })
        .collect();

    NormalizedTable {
        dates: table.dates.clone(),
        columns,
        degenerate,
    }
}

/// Normalize one column. The flag is set when the column had zero variance.
pub fn normalize_column(col: &Column) -> (Column, bool) {
    let Some((min, max)) = range(col) else {
        return (Column::new(col.key, vec![None; col.values.len()]), false);
    };

    let is_degenerate = max == min;
    // max - min overflows for values near f64::MAX; halving keeps it finite.
    let halve = !(max - min).is_finite();
    let values = col
        .values
        .iter()
        .map(|v| {
            let v = v.filter(|v| v.is_finite())?;
            if is_degenerate {
                Some(DEGENERATE_FILL)
            } else if halve {
                Some((v / 2.0 - min / 2.0) / (max / 2.0 - min / 2.0))
            } else {
                Some((v - min) / (max - min))
            }
        })
        .collect();

    (Column::new(col.key, values), is_degenerate)
}

fn range(col: &Column) -> Option<(f64, f64)> {
    col.defined().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}
