//! Figure 3: Narok fraction and RMSE time series with phenology markers.

use anyhow::{Context, Result};
use plotters::style::RGBColor;
use std::path::{Path, PathBuf};

use super::canvas::{RenderSettings, date_day, day_number, render};
use super::draw::draw_figure;
use super::layout::{
    Band, Figure, LegendPos, Marker, Panel, RMSE_FILL, RefLine, Series, Stroke, padded_range,
    panel_tag,
};
use crate::loader::Dataset;
use crate::merge::merge_left;
use crate::output::save_raster;
use crate::site::{Site, narok_events};
use crate::table::MergedRecord;

pub const PNG_NAME: &str = "Figure3_Narok_Temporal_Dynamics.png";
pub const TIFF_NAME: &str = "Figure3_Narok_Temporal_Dynamics_HighRes.tiff";

pub const SOIL: RGBColor = RGBColor(0xD2, 0x69, 0x1E);
pub const VEG: RGBColor = RGBColor(0x22, 0x8B, 0x22);
pub const SHADOW: RGBColor = RGBColor(0x41, 0x69, 0xE1);

/// Builds the four stacked panels (soil, vegetation, shadow, RMSE) for Narok.
pub fn build(data: &Dataset) -> Figure {
    let narok = data.site(Site::Narok);
    let merged = merge_left(&narok.dynamics, &narok.accuracy);
    let events = narok_events();

    let record_days = merged.iter().map(|r| day_number(r.timestamp));
    let event_days = events.iter().map(|e| date_day(e.date));
    let x_range = padded_range(record_days.chain(event_days));

    let column = |f: fn(&MergedRecord) -> Option<f64>| dated(&merged, f);
    let soil = column(|r: &MergedRecord| Some(r.soil));
    let veg = column(|r: &MergedRecord| Some(r.veg));
    let shadow = column(|r: &MergedRecord| Some(r.shadow));

    let fractions = [
        ("Soil", SOIL, Marker::Circle, soil),
        ("Vegetation", VEG, Marker::Square, veg),
        ("Shadow", SHADOW, Marker::Triangle, shadow),
    ];

    let event_lines = |labelled: bool| -> Vec<RefLine> {
        events
            .iter()
            .map(|e| RefLine {
                label: labelled.then(|| e.label.to_string()),
                value: date_day(e.date),
                color: e.color,
                width_pt: 1.5,
                stroke: Stroke::Dashed,
                opacity: 0.6,
            })
            .collect()
    };

    let mut panels: Vec<Panel> = fractions
        .into_iter()
        .map(|(label, color, marker, points)| {
            let series = Series::new(label, points, color).marker(marker, 4.0);
            let y_desc = format!("{label} Fraction");
            let mut panel = Panel::new(x_range.clone(), 0.0..1.0, &y_desc);
            panel.show_x_labels = false;
            panel.bands.push(Band::under(&series, 0.3));
            panel.series.push(series);
            panel.vlines = event_lines(false);
            panel
        })
        .collect();

    let rmse = Series::new("RMSE", column(|r: &MergedRecord| r.rmse), RGBColor(0, 0, 0));
    let rmse = rmse.marker(Marker::Diamond, 4.0);
    let mut rmse_panel = Panel::new(x_range, 0.0..0.20, "RMSE");
    rmse_panel.x_desc = Some("Date (2023)".to_string());
    let fill = Band::under(&rmse, 0.2).color(RMSE_FILL);
    let threshold = RefLine::threshold("Good Fit Threshold (0.10)", 2.0);
    rmse_panel.bands.push(fill);
    rmse_panel.series.push(rmse);
    rmse_panel.hlines.push(threshold);
    rmse_panel.vlines = event_lines(true);
    rmse_panel.legend = LegendPos::UpperRight;
    panels.push(rmse_panel);

    for (i, panel) in panels.iter_mut().enumerate() {
        panel.tag = Some(panel_tag(i));
    }

    Figure {
        title: "Narok Agricultural Zone: Temporal Dynamics 2023".to_string(),
        size_in: (12.0, 10.0),
        cols: 1,
        row_weights: vec![1.0; 4],
        panels,
    }
}

fn dated(merged: &[MergedRecord], f: fn(&MergedRecord) -> Option<f64>) -> Vec<(f64, Option<f64>)> {
    merged
        .iter()
        .map(|r| (day_number(r.timestamp), f(r)))
        .collect()
}

/// Writes Figure 3 as a standard PNG and a high-resolution TIFF.
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
