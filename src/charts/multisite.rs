//! Figure 4: per-site fraction and RMSE panels side by side.

use anyhow::{Context, Result};
use plotters::style::RGBColor;
use std::path::{Path, PathBuf};

use super::canvas::{RenderSettings, day_number, render};
use super::draw::draw_figure;
use super::layout::{
    Band, Figure, LegendPos, Marker, Panel, RMSE_FILL, RefLine, Series, padded_range, panel_tag,
};
use crate::loader::{Dataset, SiteTables};
use crate::output::save_raster;
use crate::site::Site;
use crate::stats::RmseSummary;
use crate::table::DynamicsRecord;

pub const PNG_NAME: &str = "Figure4_MultiSite_Comparison.png";
pub const TIFF_NAME: &str = "Figure4_MultiSite_Comparison_HighRes.tiff";

/// Lines of the statistics box shown on an RMSE panel.
pub fn stats_note(summary: &RmseSummary) -> Vec<String> {
    vec![
        format!("Mean: {:.3}", summary.mean),
        format!("Median: {:.3}", summary.median),
        format!("{:.1}% ≤0.10", summary.pct_good),
    ]
}

fn fraction_panel(tables: &SiteTables, x_range: std::ops::Range<f64>) -> Panel {
    let (soil_color, veg_color) = tables.site.comparison_palette();
    let column = |f: fn(&DynamicsRecord) -> f64| -> Vec<(f64, Option<f64>)> {
        tables
            .dynamics
            .iter()
            .map(|r| (day_number(r.timestamp), Some(f(r))))
            .collect()
    };

    let soil_points = column(|r: &DynamicsRecord| r.soil);
    let veg_points = column(|r: &DynamicsRecord| r.veg);
    let soil = Series::new("Soil", soil_points, soil_color);
    let veg = Series::new("Vegetation", veg_points, veg_color);

    let mut panel = Panel::new(x_range, 0.0..1.0, "Fractional Cover");
    panel.title = Some(tables.site.display_name().to_string());
    panel.legend = LegendPos::UpperLeft;
    panel.date_format = "%b";
    for (series, marker) in [(soil, Marker::Circle), (veg, Marker::Square)] {
        let series = series.marker(marker, 5.0).width(2.5).opacity(0.9);
        panel.bands.push(Band::under(&series, 0.2));
        panel.series.push(series);
    }
    panel
}

fn rmse_panel(tables: &SiteTables, x_range: std::ops::Range<f64>) -> Panel {
    let points = tables
        .accuracy
        .iter()
        .map(|r| (day_number(r.timestamp), Some(r.rmse)))
        .collect();
    let series = Series::new("RMSE", points, RGBColor(0, 0, 0))
        .marker(Marker::Diamond, 5.0)
        .width(2.5)
        .opacity(0.9);

    let summary = RmseSummary::from_values(tables.site.title(), &tables.rmse_values());

    let mut panel = Panel::new(x_range, 0.0..0.25, "RMSE");
    panel.title = Some("Reconstruction Accuracy".to_string());
    panel.legend = LegendPos::UpperLeft;
    panel.date_format = "%b";
    let fill = Band::under(&series, 0.15).color(RMSE_FILL);
    let threshold = RefLine::threshold("Good Fit (≤0.10)", 2.5);
    panel.bands.push(fill);
    panel.series.push(series);
    panel.hlines.push(threshold);
    panel.note = stats_note(&summary);
    panel
}

/// Builds the 3 × 2 grid: one row per site, fractions left and RMSE right.
pub fn build(data: &Dataset) -> Figure {
    let mut panels = Vec::with_capacity(6);

    for (row, site) in Site::ALL.into_iter().enumerate() {
        let tables = data.site(site);
        let left_range = padded_range(tables.dynamics.iter().map(|r| day_number(r.timestamp)));
        let right_range = padded_range(tables.accuracy.iter().map(|r| day_number(r.timestamp)));

        let bottom = row == Site::ALL.len() - 1;
        let pair = [
            fraction_panel(tables, left_range),
            rmse_panel(tables, right_range),
        ];
        for (col, mut panel) in pair.into_iter().enumerate() {
            panel.tag = Some(panel_tag(row * 2 + col));
            panel.show_x_labels = bottom;
            if bottom {
                panel.x_desc = Some("Date (2023)".to_string());
            }
            panels.push(panel);
        }
    }

    Figure {
        title: "Multi-Site Comparative Analysis: Narok, Kajiado, Turkana (2023)".to_string(),
        size_in: (16.0, 12.0),
        cols: 2,
        row_weights: vec![1.0; 3],
        panels,
    }
}

/// Writes Figure 4 as a standard PNG and a high-resolution TIFF.
#[tracing::instrument(skip(data, settings), fields(out_dir = %out_dir.display()))]
pub fn render_figure(
    data: &Dataset,
    settings: &RenderSettings,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let figure = build(data);
    let mut written = Vec::new();

    for (canvas, name) in [(settings.standard, PNG_NAME), (settings.hires, TIFF_NAME)] {
        let path = out_dir.join(name);
        let raster = render(&canvas, figure.size_in, |root| draw_figure(root, &figure, &canvas))
            .with_context(|| format!("failed to draw {name}"))?;
        save_raster(raster, &path)?;
        written.push(path);
    }

    Ok(written)
}
