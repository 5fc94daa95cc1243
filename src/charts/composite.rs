//! Per-site composite: stacked endmember fractions over merged RMSE.

use anyhow::{Context, Result};
use plotters::style::RGBColor;
use std::path::{Path, PathBuf};

use super::canvas::{RenderSettings, day_number, render};
use super::draw::draw_figure;
use super::layout::{
    Band, Figure, LegendPos, Marker, Panel, RMSE_FILL, RefLine, Series, padded_range,
};
use super::temporal::{SHADOW, SOIL, VEG};
use crate::loader::Dataset;
use crate::merge::{matched_rmse, merge_left};
use crate::output::save_raster;
use crate::site::Site;
use crate::stats;

pub fn file_name(site: Site) -> String {
    format!("{}_Complete_Analysis.png", site.title())
}

/// Upper RMSE axis bound: 0.25, or 10% above the largest value if higher.
pub fn rmse_axis_max(values: &[f64]) -> f64 {
    (stats::max(values) * 1.1).max(0.25)
}

pub fn build(data: &Dataset, site: Site) -> Figure {
    let tables = data.site(site);
    let merged = merge_left(&tables.dynamics, &tables.accuracy);
    let x_range = padded_range(merged.iter().map(|r| day_number(r.timestamp)));

    let mut soil = Vec::with_capacity(tables.dynamics.len());
    let mut veg = Vec::with_capacity(tables.dynamics.len());
    let mut shadow = Vec::with_capacity(tables.dynamics.len());
    for r in &tables.dynamics {
        let x = day_number(r.timestamp);
        let (lower, middle, upper) = r.stack_bounds();
        soil.push((x, 0.0, lower));
        veg.push((x, lower, middle));
        shadow.push((x, middle, upper));
    }

    let mut stacked = Panel::new(x_range.clone(), 0.0..1.0, "Fractional Cover (Cumulative)");
    stacked.title = Some("Endmember Fractions (Stacked)".to_string());
    stacked.legend = LegendPos::MiddleRight;
    stacked.show_x_labels = false;
    stacked.bands = vec![
        Band::between("Soil", soil, SOIL, 0.7),
        Band::between("Vegetation", veg, VEG, 0.7),
        Band::between("Shadow", shadow, SHADOW, 0.7),
    ];

    let points = merged
        .iter()
        .map(|r| (day_number(r.timestamp), r.rmse))
        .collect();
    let rmse = Series::new("RMSE", points, RGBColor(0, 0, 0)).marker(Marker::Circle, 4.0);

    let y_max = rmse_axis_max(&matched_rmse(&merged));
    let mut accuracy = Panel::new(x_range, 0.0..y_max, "RMSE");
    accuracy.title = Some("Model Reconstruction Accuracy".to_string());
    accuracy.x_desc = Some("Date (2023)".to_string());
    accuracy.legend = LegendPos::MiddleRight;
    let fill = Band::under(&rmse, 0.2).color(RMSE_FILL);
    let threshold = RefLine::threshold("Acceptable Threshold (0.10)", 2.0);
    accuracy.bands.push(fill);
    accuracy.series.push(rmse);
    accuracy.hlines.push(threshold);

    Figure {
        title: format!("{}: Complete Temporal Analysis 2023", site.display_name()),
        size_in: (14.0, 8.0),
        cols: 1,
        row_weights: vec![2.0, 1.0],
        panels: vec![stacked, accuracy],
    }
}

/// Writes one composite PNG per site.
#[tracing::instrument(skip(data, settings), fields(out_dir = %out_dir.display()))]
pub fn render_all(
    data: &Dataset,
    settings: &RenderSettings,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let canvas = settings.standard;
    let mut written = Vec::new();

    for site in Site::ALL {
        let figure = build(data, site);
        let path = out_dir.join(file_name(site));
        let raster = render(&canvas, figure.size_in, |root| draw_figure(root, &figure, &canvas))
            .with_context(|| format!("failed to draw composite for {site}"))?;
        save_raster(raster, &path)?;
        written.push(path);
    }

    Ok(written)
}
