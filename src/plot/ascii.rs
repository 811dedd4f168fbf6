//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! The chart shows the normalized table on a fixed `[0, 1]` axis. Each series is
//! drawn as a line of its own marker; series drawn first win where lines cross.
//! The axis row under the grid marks recession months with `#`.

use crate::domain::{ColumnKey, DerivedColumn, NormalizedTable, RecessionPeriod, SeriesName};

/// Plotted columns and their markers, in drawing priority order.
pub const PLOT_SERIES: [(ColumnKey, char); 4] = [
    (ColumnKey::Derived(DerivedColumn::LipstickIndex), 'L'),
    (ColumnKey::Series(SeriesName::MenswearProxy), 'M'),
    (ColumnKey::Series(SeriesName::Unemployment), 'U'),
    (ColumnKey::Derived(DerivedColumn::StressScore), 'S'),
];

/// Render the normalized table.
pub fn render_ascii_plot(
    table: &NormalizedTable,
    recessions: &[RecessionPeriod],
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let mut out = String::new();
    let range = match (table.dates.first(), table.dates.last()) {
        (Some(a), Some(b)) => format!("{} .. {}", a.format("%Y-%m"), b.format("%Y-%m")),
        _ => "-".to_string(),
    };
    let legend: Vec<String> = PLOT_SERIES
        .iter()
        .filter(|(key, _)| table.column(*key).is_some())
        .map(|(key, ch)| format!("{ch}={}", key.slug()))
        .collect();
    out.push_str(&format!("Plot: {range} | normalized [0, 1] | {}\n", legend.join(" ")));

    if table.len() < 2 || legend.is_empty() {
        out.push_str("(not enough data to plot)\n");
        return out;
    }

    let mut grid = vec![vec![' '; width]; height];
    for (key, ch) in PLOT_SERIES {
        if let Some(col) = table.column(key) {
            draw_series(&mut grid, &col.values, ch);
        }
    }

    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    let axis: String = (0..width)
        .map(|x| {
            let row = map_row_back(x, table.len(), width);
            let date = table.dates[row];
            if recessions.iter().any(|p| date >= p.start && date <= p.end) {
                '#'
            } else {
                '-'
            }
        })
        .collect();
    out.push_str(&axis);
    out.push('\n');

    out
}

fn draw_series(grid: &mut [Vec<char>], values: &[Option<f64>], ch: char) {
    let height = grid.len();
    let width = grid[0].len();
    let n = values.len();

    let mut prev: Option<(usize, usize)> = None;
    for (i, v) in values.iter().enumerate() {
        let Some(v) = v.filter(|v| v.is_finite()) else {
            // Undefined cells break the line.
            prev = None;
            continue;
        };
        let x = map_x(i, n, width);
        let y = map_y(v, height);
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, y, ch),
            None => {
                if grid[y][x] == ' ' {
                    grid[y][x] = ch;
                }
            }
        }
        prev = Some((x, y));
    }
}

fn map_x(i: usize, n: usize, width: usize) -> usize {
    if n < 2 {
        return 0;
    }
    let u = i as f64 / (n as f64 - 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

/// Nearest table row for a grid column.
fn map_row_back(x: usize, n: usize, width: usize) -> usize {
    let u = x as f64 / (width as f64 - 1.0);
    ((u * (n as f64 - 1.0)).round() as usize).min(n - 1)
}

fn map_y(v: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = v.clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
