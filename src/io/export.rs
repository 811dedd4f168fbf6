//! Export aligned and normalized tables to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.
//! Undefined cells are written as empty fields.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::{AlignedTable, NormalizedTable};
use crate::error::{AppError, EXIT_CONFIG};

/// Write `aligned` and `normalized` side by side, one row per date.
pub fn write_tables_csv(path: &Path, aligned: &AlignedTable, normalized: &NormalizedTable) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    write_tables(&mut out, aligned, normalized)
        .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to write export CSV: {e}")))?;
    out.flush()
        .map_err(|e| AppError::new(EXIT_CONFIG, format!("Failed to write export CSV: {e}")))
}

fn write_tables<W: Write>(out: &mut W, aligned: &AlignedTable, normalized: &NormalizedTable) -> std::io::Result<()> {
    let mut header = vec!["date".to_string()];
    header.extend(aligned.columns.iter().map(|c| c.key.slug().to_string()));
    header.extend(normalized.columns.iter().map(|c| format!("{}_norm", c.key.slug())));
    writeln!(out, "{}", header.join(","))?;

    for (row, date) in aligned.dates.iter().enumerate() {
        let mut fields = vec![date.to_string()];
        for col in aligned.columns.iter().chain(&normalized.columns) {
            fields.push(
                col.values
                    .get(row)
                    .copied()
                    .flatten()
                    .map(|v| format!("{v:.6}"))
                    .unwrap_or_default(),
            );
        }
        writeln!(out, "{}", fields.join(","))?;
    }

    Ok(())
}
