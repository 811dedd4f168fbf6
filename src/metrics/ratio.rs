//! Derived ratio columns.

use crate::domain::{AlignedTable, Column, ColumnKey, DerivedColumn};
use crate::error::PipelineError;

/// Append `output = scale * numerator / denominator` to a copy of `table`.
///
/// Rows with a zero or absent denominator, an absent numerator, or a
/// non-finite quotient get the undefined marker (`None`). An existing column
/// with the same key is replaced.
pub fn derive_ratio_index(
    table: &AlignedTable,
    numerator: impl Into<ColumnKey>,
    denominator: impl Into<ColumnKey>,
    scale: f64,
    output: DerivedColumn,
) -> Result<AlignedTable, PipelineError> {
    let numerator = numerator.into();
    let denominator = denominator.into();
    let num = table.column(numerator).ok_or(PipelineError::MissingColumn(numerator))?;
    let den = table.column(denominator).ok_or(PipelineError::MissingColumn(denominator))?;

    let values = num
        .values
        .iter()
        .zip(&den.values)
        .map(|(n, d)| ratio(*n, *d, scale))
        .collect();

    let mut out = table.clone();
    let key = ColumnKey::Derived(output);
    out.columns.retain(|c| c.key != key);
    out.columns.push(Column::new(key, values));
    Ok(out)
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>, scale: f64) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if d == 0.0 {
        return None;
    }
    let v = scale * n / d;
    v.is_finite().then_some(v)
}
