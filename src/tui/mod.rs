//! Ratatui-based terminal dashboard.
//!
//! The TUI renders four chart views (distribution, time series, spread, top
//! plants) plus a summary-statistics panel, re-filterable from the keyboard:
//! subsystem, month, plant, group-by key, and top-N. Every interaction
//! recomputes from the canonical table via `query`; the TUI owns only widget
//! state.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Tabs},
};

use crate::app::pipeline::{self, DashboardData};
use crate::domain::{CostRecord, LoadConfig, QueryParams};
use crate::error::AppError;
use crate::query;
use crate::report;

mod charts;

use charts::{HistogramChart, PlantBarChart, TimeSeriesChart};

/// Top-N bounds exposed by the `+`/`-` keys.
const TOP_N_MIN: usize = 5;
const TOP_N_MAX: usize = 20;
const TOP_N_STEP: usize = 5;

/// Start the TUI.
pub fn run(config: LoadConfig, params: QueryParams) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::term(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config, params)?;
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::term(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::term(format!("Failed to enter alternate screen: {e}")));
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

/// The four chart views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Distribution,
    TimeSeries,
    Spread,
    TopPlants,
}

impl View {
    const ALL: [View; 4] = [
        View::Distribution,
        View::TimeSeries,
        View::Spread,
        View::TopPlants,
    ];

    fn title(self) -> &'static str {
        match self {
            View::Distribution => "Distribution",
            View::TimeSeries => "Time Series",
            View::Spread => "Spread",
            View::TopPlants => "Top Plants",
        }
    }

    fn index(self) -> usize {
        match self {
            View::Distribution => 0,
            View::TimeSeries => 1,
            View::Spread => 2,
            View::TopPlants => 3,
        }
    }

    fn next(self) -> View {
        View::ALL[(self.index() + 1) % View::ALL.len()]
    }
}

struct App {
    config: LoadConfig,
    data: DashboardData,
    params: QueryParams,
    view: View,
    status: String,
}

impl App {
    fn new(config: LoadConfig, mut params: QueryParams) -> Result<Self, AppError> {
        let data = pipeline::load_dashboard(&config)?;

        // Default the month filter to the latest available month.
        if params.month.is_none() {
            params.month = data.months.last().cloned();
        }

        let status = format!(
            "Loaded {} rows from '{}' ({} skipped).",
            data.rows_used,
            config.csv_path.display(),
            data.row_errors.len()
        );

        Ok(Self {
            config,
            data,
            params,
            view: View::Distribution,
            status,
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::term(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::term(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::term(format!("Event read error: {e}")))? {
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

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('1') => self.view = View::Distribution,
            KeyCode::Char('2') => self.view = View::TimeSeries,
            KeyCode::Char('3') => self.view = View::Spread,
            KeyCode::Char('4') => self.view = View::TopPlants,
            KeyCode::Tab => self.view = self.view.next(),
            KeyCode::Char('s') => {
                self.params.subsystem = cycle_option(&self.data.subsystems, &self.params.subsystem, 1);
                self.status = format!(
                    "subsystem: {}",
                    self.params.subsystem.as_deref().unwrap_or("all")
                );
            }
            KeyCode::Char('S') => {
                self.params.subsystem = cycle_option(&self.data.subsystems, &self.params.subsystem, -1);
                self.status = format!(
                    "subsystem: {}",
                    self.params.subsystem.as_deref().unwrap_or("all")
                );
            }
            KeyCode::Char('m') => {
                self.params.month = cycle_option(&self.data.months, &self.params.month, 1);
                self.status = format!("month: {}", self.params.month.as_deref().unwrap_or("all"));
            }
            KeyCode::Char('M') => {
                self.params.month = cycle_option(&self.data.months, &self.params.month, -1);
                self.status = format!("month: {}", self.params.month.as_deref().unwrap_or("all"));
            }
            KeyCode::Char('p') => {
                self.params.plant = cycle_option(&self.data.plants, &self.params.plant, 1);
                self.status = format!("plant: {}", self.params.plant.as_deref().unwrap_or("all"));
            }
            KeyCode::Char('P') => {
                self.params.plant = cycle_option(&self.data.plants, &self.params.plant, -1);
                self.status = format!("plant: {}", self.params.plant.as_deref().unwrap_or("all"));
            }
            KeyCode::Char('g') => {
                self.params.group_by = self.params.group_by.toggled();
                self.status = format!("group by: {}", self.params.group_by.display_name());
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.params.top_n = (self.params.top_n + TOP_N_STEP).min(TOP_N_MAX);
                self.status = format!("top: {}", self.params.top_n);
            }
            KeyCode::Char('-') => {
                self.params.top_n = self.params.top_n.saturating_sub(TOP_N_STEP).max(TOP_N_MIN);
                self.status = format!("top: {}", self.params.top_n);
            }
            KeyCode::Char('e') => match report::export::write_stats_bundle(&self.data, &self.params) {
                Ok(path) => {
                    self.status = format!("Wrote stats export: {}", path.display());
                }
                Err(err) => {
                    self.status = format!("Stats export failed: {err}");
                }
            },
            KeyCode::Char('r') => match pipeline::load_dashboard(&self.config) {
                Ok(data) => {
                    self.status = format!(
                        "Reloaded {} rows ({} skipped).",
                        data.rows_used,
                        data.row_errors.len()
                    );
                    self.data = data;
                }
                Err(err) => {
                    self.status = format!("Reload failed: {err}");
                }
            },
            _ => {}
        }

        false
    }

    /// Rows behind the stats panel, the distribution, and the ranking.
    fn month_subsystem_filtered(&self) -> Vec<CostRecord> {
        let filtered =
            query::filter_by_month(&self.data.table.records, self.params.month.as_deref());
        query::filter_by_subsystem(&filtered, self.params.subsystem.as_deref())
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("cvu", Style::default().fg(Color::Cyan)),
            Span::raw(" — thermal plant unit variable costs"),
            Span::styled(
                format!("  [{}]", self.data.source.display()),
                Style::default().fg(Color::DarkGray),
            ),
        ]));

        lines.push(Line::from(Span::styled(
            format!(
                "subsystem: {} | month: {} | plant: {} | group: {} | top: {} | rows: {}",
                self.params.subsystem.as_deref().unwrap_or("all"),
                self.params.month.as_deref().unwrap_or("all"),
                self.params.plant.as_deref().unwrap_or("all"),
                self.params.group_by.display_name(),
                self.params.top_n,
                self.data.rows_used,
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(30), Constraint::Min(0)])
            .split(area);

        self.draw_stats_panel(frame, chunks[0]);
        self.draw_chart_panel(frame, chunks[1]);
    }

    fn draw_stats_panel(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let filtered = self.month_subsystem_filtered();
        let stats = query::summary_stats(&filtered);

        let rows = vec![
            Row::new(["count".to_string(), stats.count.to_string()]),
            Row::new(["mean".to_string(), report::fmt_stat(stats.mean)]),
            Row::new(["median".to_string(), report::fmt_stat(stats.median)]),
            Row::new(["min".to_string(), report::fmt_stat(stats.min)]),
            Row::new(["25%".to_string(), report::fmt_stat(stats.p25)]),
            Row::new(["75%".to_string(), report::fmt_stat(stats.p75)]),
            Row::new(["max".to_string(), report::fmt_stat(stats.max)]),
            Row::new(["std".to_string(), report::fmt_stat(stats.std)]),
            Row::new(["variance".to_string(), report::fmt_stat(stats.variance)]),
        ];

        let table = Table::new(rows, [Constraint::Length(10), Constraint::Min(0)])
            .block(Block::default().title("Statistics").borders(Borders::ALL));
        frame.render_widget(table, area);
    }

    fn draw_chart_panel(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);

        let titles: Vec<&str> = View::ALL.iter().map(|v| v.title()).collect();
        let tabs = Tabs::new(titles)
            .select(self.view.index())
            .style(Style::default().fg(Color::Gray))
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, chunks[0]);

        let block = Block::default()
            .title(self.view.title())
            .borders(Borders::ALL);
        let inner = block.inner(chunks[1]);
        frame.render_widget(block, chunks[1]);
        frame.render_widget(Clear, inner);

        match self.view {
            View::Distribution => self.draw_distribution(frame, inner),
            View::TimeSeries => self.draw_time_series(frame, inner),
            View::Spread => self.draw_spread(frame, inner),
            View::TopPlants => self.draw_top_plants(frame, inner),
        }
    }

    fn draw_distribution(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let filtered = self.month_subsystem_filtered();
        let bins = query::cost_histogram(&filtered, query::DEFAULT_HISTOGRAM_BINS);

        let Some((first, last)) = bins.first().zip(bins.last()) else {
            draw_empty_hint(frame, area);
            return;
        };

        let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0) as f64;
        let widget = HistogramChart {
            bins: &bins,
            x_bounds: [first.lower, last.upper],
            y_bounds: [0.0, (max_count * 1.05).max(1.0)],
            x_label: "unit variable cost (R$)",
        };
        frame.render_widget(widget, area);
    }

    fn draw_time_series(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        // The time series deliberately reads the full table: the plant
        // selector is its only filter.
        let points = time_series_points(&self.data.table.records, self.params.plant.as_deref());
        if points.is_empty() {
            draw_empty_hint(frame, area);
            return;
        }

        let (x_bounds, y_bounds) = series_bounds(&points);
        let y_label = if self.params.plant.is_some() {
            "cost (R$)"
        } else {
            "mean cost (R$)"
        };

        let widget = TimeSeriesChart {
            series: &points,
            x_bounds,
            y_bounds,
            y_label,
            fmt_x: fmt_axis_date,
        };
        frame.render_widget(widget, area);
    }

    fn draw_spread(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let filtered =
            query::filter_by_month(&self.data.table.records, self.params.month.as_deref());
        let groups = query::group_spread(&filtered, self.params.group_by);

        if groups.is_empty() {
            draw_empty_hint(frame, area);
            return;
        }

        let header = Row::new(["group", "rows", "min", "25%", "median", "75%", "max"])
            .style(Style::default().fg(Color::Cyan));
        let rows: Vec<Row> = groups
            .iter()
            .map(|g| {
                Row::new([
                    g.label.clone(),
                    g.count.to_string(),
                    report::fmt_stat(g.min),
                    report::fmt_stat(g.p25),
                    report::fmt_stat(g.p50),
                    report::fmt_stat(g.p75),
                    report::fmt_stat(g.max),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(16),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
        ];
        let table = Table::new(rows, widths).header(header);
        frame.render_widget(table, area);
    }

    fn draw_top_plants(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let filtered = self.month_subsystem_filtered();
        let top = query::average_cost_by_plant(&filtered, self.params.top_n);

        if top.is_empty() {
            draw_empty_hint(frame, area);
            return;
        }

        let bars: Vec<(String, f64)> = top
            .iter()
            .map(|p| (p.plant.clone(), p.avg_cost))
            .collect();
        let max_avg = bars.iter().map(|&(_, v)| v).fold(0.0, f64::max);

        let widget = PlantBarChart {
            bars: &bars,
            y_bounds: [0.0, (max_avg * 1.05).max(1.0)],
        };
        frame.render_widget(widget, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help =
            "1-4/Tab view  s/S subsystem  m/M month  p/P plant  g group  +/- top  e export  r reload  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn draw_empty_hint(frame: &mut ratatui::Frame<'_>, area: Rect) {
    let msg = Paragraph::new("No rows match the current filters.")
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(msg, area);
}

/// Advance an optional selection through `values`, passing through `None`
/// ("all") between the last and first entries.
fn cycle_option(values: &[String], current: &Option<String>, delta: i32) -> Option<String> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as i32;
    let cur = current
        .as_ref()
        .and_then(|v| values.iter().position(|x| x == v))
        .map(|i| i as i32);

    let next = match (cur, delta >= 0) {
        (None, true) => Some(0),
        (None, false) => Some(n - 1),
        (Some(i), true) => {
            if i + 1 >= n {
                None
            } else {
                Some(i + 1)
            }
        }
        (Some(i), false) => {
            if i == 0 {
                None
            } else {
                Some(i - 1)
            }
        }
    };

    next.map(|i| values[i as usize].clone())
}

/// Build the `(epoch seconds, cost)` series for the time-series chart.
fn time_series_points(records: &[CostRecord], plant: Option<&str>) -> Vec<(f64, f64)> {
    let series = match plant {
        Some(p) => query::plant_cost_series(records, p),
        None => query::average_cost_over_time(records),
    };
    series
        .iter()
        .map(|p| (p.start_time.and_utc().timestamp() as f64, p.cost))
        .collect()
}

/// Padded chart bounds for a point series.
fn series_bounds(points: &[(f64, f64)]) -> ([f64; 2], [f64; 2]) {
    let (mut x0, mut x1) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y0, mut y1) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in points {
        x0 = x0.min(x);
        x1 = x1.max(x);
        y0 = y0.min(y);
        y1 = y1.max(y);
    }

    if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) {
        return ([0.0, 1.0], [0.0, 1.0]);
    }

    // Half a day on each side keeps single-point series drawable.
    if x1 <= x0 {
        x0 -= 43_200.0;
        x1 += 43_200.0;
    }
    let pad = ((y1 - y0).abs() * 0.05).max(1e-9);
    ([x0, x1], [y0 - pad, y1 + pad])
}

fn fmt_axis_date(v: f64) -> String {
    match chrono::DateTime::from_timestamp(v as i64, 0) {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn cycling_passes_through_none_at_both_ends() {
        let subsystems = values(&["N", "NE", "S"]);

        let first = cycle_option(&subsystems, &None, 1);
        assert_eq!(first.as_deref(), Some("N"));

        let last = cycle_option(&subsystems, &Some("S".to_string()), 1);
        assert_eq!(last, None);

        let back = cycle_option(&subsystems, &None, -1);
        assert_eq!(back.as_deref(), Some("S"));

        let off = cycle_option(&subsystems, &Some("N".to_string()), -1);
        assert_eq!(off, None);
    }

    #[test]
    fn cycling_an_empty_list_stays_unselected() {
        assert_eq!(cycle_option(&[], &None, 1), None);
    }

    #[test]
    fn series_bounds_pad_degenerate_inputs() {
        let ([x0, x1], [y0, y1]) = series_bounds(&[(1_000_000.0, 42.0)]);
        assert!(x1 > x0);
        assert!(y1 > y0);
        assert!(x0 < 1_000_000.0 && x1 > 1_000_000.0);
    }
}
