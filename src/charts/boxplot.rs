//! RMSE distribution per site as a box-and-whisker chart.

use anyhow::{Context, Result};
use plotters::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};

use super::canvas::{Area, Canvas, RenderSettings, render};
use super::draw::{draw_centered_lines, draw_text_box_at};
use super::layout::{RefLine, Stroke, THRESHOLD_RED, dash_intervals};
use crate::loader::Dataset;
use crate::output::save_raster;
use crate::site::Site;
use crate::stats::{BoxStats, RmseSummary};

pub const PNG_NAME: &str = "RMSE_MultiSite_BoxPlot.png";

const BOX_WIDTH: f64 = 0.6;
const BOX_ALPHA: f64 = 0.7;

#[derive(Debug, Clone)]
pub struct SiteBox {
    pub site: Site,
    /// Center on the x axis.
    pub position: f64,
    /// `None` when the site has no RMSE values.
    pub stats: Option<BoxStats>,
    pub summary: RmseSummary,
    pub color: RGBColor,
}

impl SiteBox {
    /// Site name, biome and observation count, one per line.
    pub fn tick_label(&self) -> Vec<String> {
        vec![
            self.site.title().to_string(),
            self.site.biome().to_string(),
            format!("(n={})", self.summary.observations),
        ]
    }

    /// Mean, median and good-fit share shown above the box.
    pub fn stats_label(&self) -> Vec<String> {
        vec![
            format!("μ={:.3}", self.summary.mean),
            format!("Md={:.3}", self.summary.median),
            format!("{:.0}%≤0.10", self.summary.pct_good),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct BoxPlot {
    pub title: String,
    pub size_in: (f64, f64),
    pub x_range: Range<f64>,
    pub y_range: Range<f64>,
    pub boxes: Vec<SiteBox>,
    pub threshold: RefLine,
}

pub fn build(data: &Dataset) -> BoxPlot {
    let boxes = data
        .iter()
        .enumerate()
        .map(|(i, tables)| {
            let values = tables.rmse_values();
            SiteBox {
                site: tables.site,
                position: (i + 1) as f64,
                stats: BoxStats::from_values(&values),
                summary: RmseSummary::from_values(tables.site.title(), &values),
                color: tables.site.box_color(),
            }
        })
        .collect();

    BoxPlot {
        title: "Multi-Site RMSE Comparison: Algorithm Performance Across Biomes".to_string(),
        size_in: (10.0, 6.0),
        x_range: 0.5..3.5,
        y_range: 0.0..0.26,
        boxes,
        threshold: RefLine::threshold("Operational Threshold (0.10)", 2.0).stroke(Stroke::Dashed),
    }
}

pub fn draw(root: &Area<'_>, plot: &BoxPlot, canvas: &Canvas) -> Result<()> {
    let body = root.titled(&plot.title, canvas.bold(13.0))?;

    let mut chart = ChartBuilder::on(&body)
        .margin(canvas.px_u(10.0))
        .x_label_area_size(canvas.px_u(64.0))
        .y_label_area_size(canvas.px_u(52.0))
        .build_cartesian_2d(plot.x_range.clone(), plot.y_range.clone())?;

    let y_fmt = |v: &f64| format!("{v:.2}");
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .y_labels(8)
        .y_label_formatter(&y_fmt)
        .y_max_light_lines(0)
        .bold_line_style(BLACK.mix(0.12).stroke_width(1))
        .axis_style(BLACK.stroke_width(canvas.px_u(1.2)))
        .label_style(canvas.font(10.0))
        .axis_desc_style(canvas.bold(11.0))
        .y_desc("RMSE (Reconstruction Error)")
        .x_desc("Study Site")
        .draw()?;

    let line_w = canvas.px_u(1.2);
    let half = BOX_WIDTH / 2.0;

    for b in &plot.boxes {
        let Some(s) = &b.stats else { continue };
        let (left, right) = (b.position - half, b.position + half);
        let cap = half / 2.0;
        let corners = [(left, s.q1), (right, s.q3)];

        chart.draw_series([
            Rectangle::new(corners, b.color.mix(BOX_ALPHA).filled()),
            Rectangle::new(corners, BLACK.stroke_width(line_w)),
        ])?;

        let (x, lo, hi) = (b.position, s.whisker_low, s.whisker_high);
        let whiskers = [
            vec![(x, lo), (x, s.q1)],
            vec![(x, s.q3), (x, hi)],
            vec![(x - cap, lo), (x + cap, lo)],
            vec![(x - cap, hi), (x + cap, hi)],
        ];
        chart.draw_series(
            whiskers
                .into_iter()
                .map(|pts| PathElement::new(pts, BLACK.stroke_width(line_w))),
        )?;

        chart.draw_series(std::iter::once(PathElement::new(
            vec![(left, s.median), (right, s.median)],
            BLACK.stroke_width(canvas.px_u(2.0)),
        )))?;

        let r = canvas.px_i(3.0).max(1);
        chart.draw_series(
            s.outliers
                .iter()
                .map(|&v| Circle::new((b.position, v), r, BLACK.stroke_width(1))),
        )?;

        let d = canvas.px_i(4.0).max(2);
        let fill = THRESHOLD_RED.filled();
        let diamond = Polygon::new(vec![(0, -d), (d, 0), (0, d), (-d, 0)], fill);
        chart.draw_series(std::iter::once(EmptyElement::at((x, s.mean)) + diamond))?;
    }

    let t = &plot.threshold;
    let width = canvas.px_u(t.width_pt);
    let style = t.color.mix(t.opacity).stroke_width(width);
    let dashes = dash_intervals(plot.x_range.start, plot.x_range.end, t.stroke);
    let anno = chart.draw_series(
        dashes
            .into_iter()
            .map(|(a, b)| PathElement::new(vec![(a, t.value), (b, t.value)], style)),
    )?;
    if let Some(label) = &t.label {
        let len = canvas.px_i(16.0);
        anno.label(label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + len, y)], style));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .margin(canvas.px_u(6.0))
        .background_style(WHITE.mix(0.85).filled())
        .border_style(BLACK.mix(0.3).stroke_width(1))
        .label_font(canvas.font(10.0))
        .draw()?;

    // Annotations sit in backend pixels so they can leave the plotting area.
    let stats_y = plot.y_range.end * 0.95;
    let tick_style = TextStyle::from(canvas.font(10.0)).color(&BLACK);
    for b in &plot.boxes {
        let (x, top) = chart.backend_coord(&(b.position, stats_y));
        if b.stats.is_some() {
            let lines = b.stats_label();
            let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
            draw_text_box_at(root, &lines, (x, top), canvas.font(9.0), canvas)?;
        }

        let (x, bottom) = chart.backend_coord(&(b.position, plot.y_range.start));
        let anchor = (x, bottom + canvas.px_i(5.0));
        draw_centered_lines(root, &b.tick_label(), anchor, &tick_style)?;
    }

    Ok(())
}

/// Writes the RMSE box plot PNG.
#[tracing::instrument(skip(data, settings), fields(out_dir = %out_dir.display()))]
pub fn render_figure(data: &Dataset, settings: &RenderSettings, out_dir: &Path) -> Result<PathBuf> {
    let plot = build(data);
    let canvas = settings.standard;
    let path = out_dir.join(PNG_NAME);

    let raster = render(&canvas, plot.size_in, |root| draw(root, &plot, &canvas))
        .with_context(|| format!("failed to draw {PNG_NAME}"))?;
    save_raster(raster, &path)?;
    Ok(path)
}
