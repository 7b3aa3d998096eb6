//! Plotters-powered chart widgets for Ratatui.
//!
//! Why Plotters instead of Ratatui's built-in `Chart` widget?
//! - nicer axis + mesh rendering
//! - less manual work for ticks/labels
//! - easy to extend later (legend, annotations, exportable PNG/SVG backends, etc.)
//!
//! We render Plotters output into the Ratatui buffer using
//! `plotters-ratatui-backend` and delegate to its widget helper to avoid
//! coupling our code to its internal backend types.
//!
//! The widgets are intentionally data-driven: all series and bounds are
//! computed outside the render call. This keeps `render()` focused on drawing
//! and makes the data prep testable on its own.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::domain::HistogramBin;

// Series styling: keep the palette high-contrast for terminal readability.
const LINE_COLOR: RGBColor = RGBColor(0, 255, 255); // cyan
const BAR_COLOR: RGBColor = RGBColor(0, 190, 190);

/// Cost distribution as equal-width bars.
pub struct HistogramChart<'a> {
    pub bins: &'a [HistogramBin],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
}

impl Widget for HistogramChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if unusable_area(area, buf) || bad_bounds(self.x_bounds, self.y_bounds) {
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                // Small margins keep the chart readable without wasting space.
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 8)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // We disable the mesh lines to reduce visual clutter in
            // low-resolution terminal rendering; axes + labels are enough.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc("rows")
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| format!("{v:.0}"))
                .y_label_formatter(&|v| format!("{v:.0}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .draw()?;

            chart.draw_series(self.bins.iter().map(|b| {
                Rectangle::new([(b.lower, 0.0), (b.upper, b.count as f64)], BAR_COLOR.filled())
            }))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// Cost-over-time line with point markers.
pub struct TimeSeriesChart<'a> {
    /// `(seconds since epoch, cost)` points, ascending in time.
    pub series: &'a [(f64, f64)],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub y_label: &'a str,
    pub fmt_x: fn(f64) -> String,
}

impl Widget for TimeSeriesChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if unusable_area(area, buf) || bad_bounds(self.x_bounds, self.y_bounds) {
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 8)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc("period start")
                .y_desc(self.y_label)
                .x_labels(4)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| format!("{v:.0}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .draw()?;

            chart.draw_series(LineSeries::new(self.series.iter().copied(), &LINE_COLOR))?;

            // Markers on top of the line so sparse series stay visible.
            chart.draw_series(self.series.iter().map(|&(x, y)| Pixel::new((x, y), WHITE)))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// Average cost per plant as indexed bars; tick labels map back to names.
pub struct PlantBarChart<'a> {
    /// `(plant, average cost)`, already ranked.
    pub bars: &'a [(String, f64)],
    pub y_bounds: [f64; 2],
}

impl Widget for PlantBarChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let x_bounds = [-0.5, self.bars.len() as f64 - 0.5];
        if unusable_area(area, buf) || bad_bounds(x_bounds, self.y_bounds) {
            return;
        }

        let [x0, x1] = x_bounds;
        let [y0, y1] = self.y_bounds;
        let bars = self.bars;

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 8)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .y_desc("avg cost")
                .x_labels(bars.len().clamp(1, 8))
                .y_labels(5)
                .x_label_formatter(&|v| {
                    // Only label (near-)integer positions, which map to bars.
                    let idx = v.round();
                    if (v - idx).abs() > 0.25 || idx < 0.0 {
                        return String::new();
                    }
                    bars.get(idx as usize)
                        .map(|(plant, _)| shorten(plant, 12))
                        .unwrap_or_default()
                })
                .y_label_formatter(&|v| format!("{v:.0}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .draw()?;

            chart.draw_series(bars.iter().enumerate().map(|(i, &(_, avg))| {
                let x = i as f64;
                Rectangle::new([(x - 0.4, 0.0), (x + 0.4, avg)], BAR_COLOR.filled())
            }))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// When the available area is too small, Plotters may fail to build a chart.
/// In that case, we render a small hint rather than panicking.
fn unusable_area(area: Rect, buf: &mut Buffer) -> bool {
    if area.width < 20 || area.height < 8 {
        buf.set_string(
            area.x,
            area.y,
            "Chart area too small (resize terminal).",
            Style::default().fg(Color::Yellow),
        );
        return true;
    }
    false
}

fn bad_bounds(x: [f64; 2], y: [f64; 2]) -> bool {
    !(x[0].is_finite() && x[1].is_finite() && y[0].is_finite() && y[1].is_finite())
        || x[1] <= x[0]
        || y[1] <= y[0]
}

fn shorten(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max - 1).chain(std::iter::once('.')).collect()
}
