//! Ratatui-based terminal UI.
//!
//! The TUI provides a settings panel for choosing the start year and trailing
//! window, then renders the normalized indicators with recession shading and
//! the latest-change status cards.

use std::io;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use plotters::style::RGBColor;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Terminal,
};

use crate::app::pipeline::{run_dashboard, source_from_config, Dashboard};
use crate::data::{SeriesCache, SeriesSource};
use crate::domain::{ColumnKey, DashboardConfig, DerivedColumn, SeriesName, Status};
use crate::error::{AppError, EXIT_UPSTREAM};

mod plotters_chart;

use plotters_chart::{ChartLine, IndicatorChart};

const MIN_START_YEAR: i32 = 2000;
const MIN_WINDOW: usize = 1;
const MAX_WINDOW: usize = 60;

/// Start the TUI.
pub fn run(config: DashboardConfig) -> Result<(), AppError> {
    // A missing API key is fatal before the terminal is touched.
    let source = source_from_config(&config)?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(EXIT_UPSTREAM, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config, source);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(EXIT_UPSTREAM, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(EXIT_UPSTREAM, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    config: DashboardConfig,
    source: Box<dyn SeriesSource>,
    cache: SeriesCache,
    dashboard: Option<Dashboard>,
    selected_field: usize,
    show_stress: bool,
    status: String,
}

impl App {
    fn new(config: DashboardConfig, source: Box<dyn SeriesSource>) -> Self {
        let cache = SeriesCache::new(config.cache_ttl);
        let mut app = Self {
            config,
            source,
            cache,
            dashboard: None,
            selected_field: 0,
            show_stress: false,
            status: String::new(),
        };
        app.recompute();
        app
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(EXIT_UPSTREAM, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(EXIT_UPSTREAM, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(EXIT_UPSTREAM, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                self.selected_field = self.selected_field.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_field < 1 {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Char('r') => {
                self.cache.invalidate();
                self.recompute();
            }
            KeyCode::Char('s') => {
                self.show_stress = !self.show_stress;
                self.status = format!("stress overlay: {}", if self.show_stress { "on" } else { "off" });
            }
            KeyCode::Char('d') => {
                if let Some(dash) = &self.dashboard {
                    match crate::debug::write_debug_bundle(dash, &self.config) {
                        Ok(path) => {
                            self.status = format!("Wrote debug bundle: {}", path.display());
                        }
                        Err(err) => {
                            self.status = format!("Debug write failed: {err}");
                        }
                    }
                } else {
                    self.status = "No dashboard available.".to_string();
                }
            }
            _ => {}
        }
        false
    }

    fn adjust_field(&mut self, delta: i32) {
        match self.selected_field {
            0 => {
                let year = clamp_year(self.config.start_year + delta, chrono::Local::now().year());
                if year == self.config.start_year {
                    return;
                }
                self.config.start_year = year;
            }
            1 => {
                let window = if delta >= 0 {
                    self.config.trailing_window.saturating_add(1)
                } else {
                    self.config.trailing_window.saturating_sub(1)
                };
                self.config.trailing_window = window.clamp(MIN_WINDOW, MAX_WINDOW);
            }
            _ => return,
        }
        self.recompute();
    }

    /// Re-run the pipeline. Data problems leave the UI in a "cannot compute" state.
    fn recompute(&mut self) {
        match run_dashboard(self.source.as_ref(), &mut self.cache, &self.config) {
            Ok(dash) => {
                self.status = if dash.skipped.is_empty() {
                    format!("{} data through {}", dash.source, fmt_date(dash.end_date()))
                } else {
                    let names: Vec<&str> = dash.skipped.iter().map(|s| s.name.display_name()).collect();
                    format!("skipped: {}", names.join(", "))
                };
                self.dashboard = Some(dash);
            }
            Err(err) => {
                self.status = format!("cannot compute: {}", err.message());
                self.dashboard = None;
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("rw", Style::default().fg(Color::Cyan)),
            Span::raw(": unconventional recession indicators"),
        ]));

        let detail = match &self.dashboard {
            Some(dash) => format!(
                "source: {} | {} .. {} | lipstick index: {} | {}-month mean: {} ({})",
                dash.source,
                dash.start_date,
                fmt_date(dash.end_date()),
                crate::report::fmt_opt(dash.latest_index(), 3),
                dash.trailing_window,
                crate::report::fmt_opt(dash.trailing_mean, 3),
                dash.trailing_status.label(),
            ),
            None => format!("start: {}-01-01 | no dashboard", self.config.start_year),
        };
        lines.push(Line::from(Span::styled(detail, Style::default().fg(Color::Gray))));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(44)])
            .split(area);

        self.draw_chart(frame, columns[0]);

        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(5)])
            .split(columns[1]);

        self.draw_cards(frame, side[0]);
        self.draw_settings(frame, side[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Indicators (normalized)").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(dash) = &self.dashboard else {
            let msg = Paragraph::new("Cannot compute the dashboard for these settings.")
                .style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let (lines, shade_x, x_bounds) = chart_series(dash, self.show_stress);
        let y_bounds = [0.0, 1.0];

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(inner);
        frame.render_widget(Paragraph::new(legend(dash, self.show_stress)), chunks[0]);

        let (chart_rect, insets) = chart_layout(chunks[1]);
        let widget = IndicatorChart {
            lines: &lines,
            shade_x: &shade_x,
            x_bounds,
            y_bounds,
            x_label: "year",
            y_label: "normalized",
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, chunks[1], chart_rect, insets, x_bounds, y_bounds);
        }
    }

    fn draw_cards(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut items = Vec::new();
        if let Some(dash) = &self.dashboard {
            for card in &dash.cards {
                let color = match card.status {
                    Status::Caution => Color::Red,
                    Status::Normal => Color::Green,
                    Status::Unknown => Color::Gray,
                };
                items.push(ListItem::new(Line::from(vec![
                    Span::raw(format!("{} ", card.column.display_name())),
                    Span::raw(format!(
                        "{} {} ",
                        crate::report::fmt_opt(card.delta.current, 2),
                        card.trend.arrow()
                    )),
                    Span::styled(card.status.label(), Style::default().fg(color)),
                ])));
            }
            for skipped in &dash.skipped {
                items.push(ListItem::new(Span::styled(
                    format!("skipped {}: {}", skipped.name.display_name(), skipped.reason),
                    Style::default().fg(Color::Yellow),
                )));
            }
        }

        let list = List::new(items).block(Block::default().title("Latest changes").borders(Borders::ALL));
        frame.render_widget(list, area);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items = vec![
            ListItem::new(format!("Start year: {}", self.config.start_year)),
            ListItem::new(format!("Trailing window: {} months", self.config.trailing_window)),
        ];

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  r refetch  s stress  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn clamp_year(year: i32, current_year: i32) -> i32 {
    year.clamp(MIN_START_YEAR, current_year.max(MIN_START_YEAR))
}

fn fmt_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Month start as a fractional year.
fn date_x(date: NaiveDate) -> f64 {
    date.year() as f64 + date.month0() as f64 / 12.0
}

fn line_color(key: ColumnKey) -> RGBColor {
    match key {
        ColumnKey::Derived(DerivedColumn::LipstickIndex) => RGBColor(255, 75, 75),
        ColumnKey::Derived(DerivedColumn::StressScore) => RGBColor(240, 200, 60),
        ColumnKey::Series(SeriesName::MenswearProxy) => RGBColor(0, 104, 201),
        _ => RGBColor(180, 180, 180),
    }
}

/// Keys drawn on the chart, in order. Columns missing from `dash` are left out.
fn chart_keys(dash: &Dashboard, show_stress: bool) -> Vec<ColumnKey> {
    let mut keys = vec![
        ColumnKey::Derived(DerivedColumn::LipstickIndex),
        ColumnKey::Series(SeriesName::MenswearProxy),
        ColumnKey::Series(SeriesName::Unemployment),
    ];
    if show_stress {
        keys.push(ColumnKey::Derived(DerivedColumn::StressScore));
    }
    keys.retain(|key| dash.normalized.column(*key).is_some());
    keys
}

fn legend(dash: &Dashboard, show_stress: bool) -> Line<'static> {
    let mut spans = Vec::new();
    for key in chart_keys(dash, show_stress) {
        let RGBColor(r, g, b) = line_color(key);
        spans.push(Span::styled("━ ", Style::default().fg(Color::Rgb(r, g, b))));
        spans.push(Span::raw(format!("{}  ", key.display_name())));
    }
    spans.push(Span::styled(
        "█ recession",
        Style::default().fg(Color::Rgb(90, 20, 20)).add_modifier(Modifier::BOLD),
    ));
    Line::from(spans)
}

/// Build chart lines, recession shading positions and x bounds.
///
/// Undefined cells break nothing: they are simply left out of the line.
fn chart_series(dash: &Dashboard, show_stress: bool) -> (Vec<ChartLine>, Vec<f64>, [f64; 2]) {
    let xs: Vec<f64> = dash.normalized.dates.iter().map(|d| date_x(*d)).collect();

    let lines = chart_keys(dash, show_stress)
        .into_iter()
        .filter_map(|key| dash.normalized.column(key).map(|col| (key, col)))
        .map(|(key, col)| ChartLine {
            points: xs
                .iter()
                .zip(&col.values)
                .filter_map(|(x, v)| v.map(|v| (*x, v)))
                .collect(),
            color: line_color(key),
        })
        .collect();

    let shade_x = dash
        .recessions
        .iter()
        .flat_map(|p| {
            dash.normalized
                .dates
                .iter()
                .filter(move |d| **d >= p.start && **d <= p.end)
                .map(|d| date_x(*d))
        })
        .collect();

    let x_bounds = match (xs.first(), xs.last()) {
        (Some(a), Some(b)) if b > a => [*a, *b],
        (Some(a), _) => [*a, *a + 1.0],
        _ => [0.0, 1.0],
    };

    (lines, shade_x, x_bounds)
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 6,
        right: 2,
        top: 0,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = format!("{:.0}", x_val.floor());
        let label_len = label.len() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format!("{:.2}", y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("year")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SyntheticSource;

    #[test]
    fn year_is_clamped_to_supported_range() {
        assert_eq!(clamp_year(1999, 2026), 2000);
        assert_eq!(clamp_year(2027, 2026), 2026);
        assert_eq!(clamp_year(2015, 2026), 2015);
    }

    #[test]
    fn months_map_to_fractional_years() {
        let d = NaiveDate::from_ymd_opt(2020, 7, 1).unwrap();
        assert!((date_x(d) - 2020.5).abs() < 1e-12);
    }

    #[test]
    fn chart_series_follow_the_stress_toggle() {
        let config = DashboardConfig {
            offline: true,
            ..DashboardConfig::default()
        };
        let source = SyntheticSource::new(config.seed);
        let mut cache = SeriesCache::new(config.cache_ttl);
        let dash = run_dashboard(&source, &mut cache, &config).unwrap();

        let (lines, shade_x, [x0, x1]) = chart_series(&dash, false);
        assert_eq!(lines.len(), 3);
        assert!(x1 > x0);
        assert!(!shade_x.is_empty());
        assert!(shade_x.iter().all(|x| (x0..=x1).contains(x)));

        let (lines, _, _) = chart_series(&dash, true);
        assert_eq!(lines.len(), 4);
        for line in &lines {
            assert!(line.points.iter().all(|(_, y)| (0.0..=1.0).contains(y)));
        }
    }

    #[test]
    fn legend_lists_only_drawn_lines() {
        let config = DashboardConfig {
            offline: true,
            series: vec![SeriesName::LipstickProxy, SeriesName::TotalRetail, SeriesName::Unemployment],
            ..DashboardConfig::default()
        };
        let source = SyntheticSource::new(config.seed);
        let mut cache = SeriesCache::new(config.cache_ttl);
        let dash = run_dashboard(&source, &mut cache, &config).unwrap();

        let (lines, _, _) = chart_series(&dash, false);
        assert_eq!(lines.len(), 2);

        let text: String = legend(&dash, false).spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains(DerivedColumn::LipstickIndex.display_name()));
        assert!(text.contains(SeriesName::Unemployment.display_name()));
        assert!(!text.contains(SeriesName::MenswearProxy.display_name()));
    }

    #[test]
    fn data_errors_leave_the_app_running() {
        let config = DashboardConfig {
            offline: true,
            series: vec![SeriesName::Unemployment],
            ..DashboardConfig::default()
        };
        let app = App::new(config.clone(), Box::new(SyntheticSource::new(config.seed)));
        assert!(app.dashboard.is_none());
        assert!(app.status.starts_with("cannot compute"));
    }
}
