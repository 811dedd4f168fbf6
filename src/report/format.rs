//! Formatted terminal output: run summary, status cards and the aligned table.
//!
//! We keep formatting code in one place so:
//! - the metrics code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::app::pipeline::Dashboard;
use crate::domain::{AlignedTable, StatusCard};

/// Format the run summary (source, range, columns, warnings).
pub fn format_summary(dash: &Dashboard) -> String {
    let mut out = String::new();

    out.push_str("=== rw - Unconventional Recession Indicators ===\n");
    out.push_str(&format!("Source: {}\n", dash.source));
    out.push_str(&format!(
        "Range: {} .. {} ({} rows)\n",
        dash.aligned.dates.first().map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
        dash.end_date().map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
        dash.aligned.len(),
    ));

    let columns: Vec<&str> = dash.aligned.columns.iter().map(|c| c.key.slug()).collect();
    out.push_str(&format!("Columns: {}\n", columns.join(", ")));

    if !dash.recessions.is_empty() {
        let periods: Vec<String> = dash
            .recessions
            .iter()
            .map(|p| format!("{}..{}", p.start.format("%Y-%m"), p.end.format("%Y-%m")))
            .collect();
        out.push_str(&format!("Recessions: {}\n", periods.join(", ")));
    }

    for key in &dash.normalized.degenerate {
        out.push_str(&format!("  (flat) {} has no variance in range; normalized to 0\n", key.slug()));
    }
    for s in &dash.skipped {
        out.push_str(&format!("  (skipped {}) {}\n", s.name.series_id(), s.reason));
    }

    out
}

/// Format the status cards and the trailing-mean alert.
pub fn format_cards(dash: &Dashboard) -> String {
    let mut out = String::new();
    out.push_str("Status:\n");
    for card in &dash.cards {
        out.push_str(&format_card(card));
        out.push('\n');
    }

    let latest = dash.latest_index();
    out.push_str(&format!(
        "{:<16} latest {} vs {}-month mean {} -> {}\n",
        "Index vs mean",
        fmt_opt(latest, 2),
        dash.trailing_window,
        fmt_opt(dash.trailing_mean, 2),
        dash.trailing_status.label(),
    ));

    out
}

/// One status card line.
pub fn format_card(card: &StatusCard) -> String {
    format!(
        "{:<16} {:>12} {} {:>10}  {}",
        card.column.display_name(),
        fmt_opt(card.delta.current, 2),
        card.trend.arrow(),
        fmt_signed(card.delta.delta()),
        card.status.label(),
    )
    .trim_end()
    .to_string()
}

/// Format a table (typically the tail of the aligned table).
pub fn format_table(table: &AlignedTable) -> String {
    let mut out = String::new();

    let mut header = format!("{:<10}", "date");
    let mut rule = format!("{:-<10}", "");
    for col in &table.columns {
        header.push_str(&format!(" {:>14}", truncate(col.key.slug(), 14)));
        rule.push_str(&format!(" {:-<14}", ""));
    }
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');

    for (row, date) in table.dates.iter().enumerate() {
        let mut line = format!("{:<10}", date.format("%Y-%m-%d"));
        for col in &table.columns {
            line.push_str(&format!(" {:>14}", fmt_opt(col.values[row], 2)));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

pub fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{v:.decimals$}"),
        _ => "-".to_string(),
    }
}

fn fmt_signed(v: Option<f64>) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{v:+.2}"),
        _ => "-".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::{Column, DerivedColumn, LatestDelta, Polarity, SeriesName, Status, Trend};

    #[test]
    fn card_line_shows_value_trend_and_status() {
        let card = StatusCard {
            column: DerivedColumn::LipstickIndex.into(),
            date: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
            delta: LatestDelta { current: Some(10.0), previous: Some(9.0) },
            trend: Trend::Rising,
            polarity: Polarity::RisingIsCaution,
            status: Status::Caution,
        };
        assert_eq!(format_card(&card), "Lipstick index          10.00 ↑      +1.00  CAUTION");
    }

    #[test]
    fn table_golden_snapshot() {
        let table = AlignedTable {
            dates: vec![
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(),
            ],
            columns: vec![
                Column::new(SeriesName::Unemployment, vec![Some(5.0), Some(5.25)]),
                Column::new(DerivedColumn::LipstickIndex, vec![Some(10.0), None]),
            ],
        };
        let expected = concat!(
            "date         unemployment lipstick_index\n",
            "---------- -------------- --------------\n",
            "2020-01-01           5.00          10.00\n",
            "2020-02-01           5.25              -\n",
        );
        assert_eq!(format_table(&table), expected);
    }

    #[test]
    fn truncates_long_labels() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
