//! Table 1: RMSE summary statistics rendered as a styled grid.

use anyhow::{Context, Result};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::{Path, PathBuf};

use super::canvas::{Area, Canvas, RenderSettings, render};
use crate::loader::Dataset;
use crate::output::{print_json, save_raster, write_summary_csv};
use crate::stats::RmseSummary;

pub const PNG_NAME: &str = "Table1_RMSE_Summary.png";
pub const CSV_NAME: &str = "Table1_RMSE_Summary.csv";

const HEADER_FILL: RGBColor = RGBColor(0x44, 0x72, 0xC4);
const STRIPE_FILL: RGBColor = RGBColor(0xF2, 0xF2, 0xF2);
const OVERALL_FILL: RGBColor = RGBColor(0xE7, 0xE6, 0xE6);

pub const COLUMNS: [&str; 8] = [
    "Site",
    "Observations",
    "Mean RMSE",
    "Median RMSE",
    "Std Dev",
    "Min",
    "Max",
    "% Good Fit\n(≤0.10)",
];

/// Column widths as fractions of the figure width.
const COL_WIDTHS: [f64; 8] = [0.15, 0.12, 0.12, 0.12, 0.11, 0.09, 0.09, 0.12];

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub cells: Vec<String>,
    pub fill: RGBColor,
    pub bold: bool,
}

#[derive(Debug, Clone)]
pub struct SummaryTable {
    pub title: String,
    pub size_in: (f64, f64),
    pub header: TableRow,
    pub rows: Vec<TableRow>,
}

/// One summary per site in site order, then the pooled `Overall` row.
pub fn summaries(data: &Dataset) -> Vec<RmseSummary> {
    let overall = RmseSummary::from_values("Overall", &data.overall_rmse());
    data.iter()
        .map(|t| RmseSummary::from_values(t.site.title(), &t.rmse_values()))
        .chain(std::iter::once(overall))
        .collect()
}

pub fn build(summaries: &[RmseSummary]) -> SummaryTable {
    let last = summaries.len().saturating_sub(1);
    let rows = summaries
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let (fill, bold) = if i == last {
                (OVERALL_FILL, true)
            } else if i % 2 == 1 {
                (STRIPE_FILL, false)
            } else {
                (WHITE, false)
            };
            TableRow {
                cells: s.table_cells(),
                fill,
                bold,
            }
        })
        .collect();

    SummaryTable {
        title: "Table 1: Multi-Site RMSE Accuracy Summary (2023)".to_string(),
        size_in: (12.0, 4.0),
        header: TableRow {
            cells: COLUMNS.iter().map(|c| c.to_string()).collect(),
            fill: HEADER_FILL,
            bold: true,
        },
        rows,
    }
}

pub fn draw(root: &Area<'_>, table: &SummaryTable, canvas: &Canvas) -> Result<()> {
    let (width, height) = root.dim_in_pixel();
    let (width, height) = (width as i32, height as i32);

    let title_style = TextStyle::from(canvas.bold(12.0))
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Top));
    let title_pos = (width / 2, canvas.px_i(12.0));
    root.draw(&Text::new(table.title.clone(), title_pos, title_style))?;

    // Header gets an extra half row for its two-line label.
    let top = canvas.px_i(44.0);
    let bottom = height - canvas.px_i(12.0);
    let units = table.rows.len() as f64 + 1.5;
    let row_h = ((bottom - top) as f64 / units).min(canvas.px(26.0));
    let header_h = (row_h * 1.5).round() as i32;
    let row_h = row_h.round() as i32;

    let total: f64 = COL_WIDTHS.iter().sum();
    let mut edges = vec![((1.0 - total) / 2.0 * width as f64).round() as i32];
    for w in COL_WIDTHS {
        let next = edges[edges.len() - 1] as f64 + w * width as f64;
        edges.push(next.round() as i32);
    }

    draw_row(root, &table.header, &edges, top, header_h, WHITE, canvas)?;
    for (i, row) in table.rows.iter().enumerate() {
        let y = top + header_h + i as i32 * row_h;
        draw_row(root, row, &edges, y, row_h, BLACK, canvas)?;
    }
    Ok(())
}

fn draw_row(
    area: &Area<'_>,
    row: &TableRow,
    edges: &[i32],
    top: i32,
    height: i32,
    text_color: RGBColor,
    canvas: &Canvas,
) -> Result<()> {
    let font = if row.bold {
        canvas.bold(10.0)
    } else {
        canvas.font(10.0)
    };
    let style = TextStyle::from(font)
        .color(&text_color)
        .pos(Pos::new(HPos::Center, VPos::Center));

    for (cell, bounds) in row.cells.iter().zip(edges.windows(2)) {
        let (left, right) = (bounds[0], bounds[1]);
        let corners = [(left, top), (right, top + height)];
        area.draw(&Rectangle::new(corners, row.fill.filled()))?;
        area.draw(&Rectangle::new(corners, BLACK.stroke_width(1)))?;

        let lines: Vec<&str> = cell.lines().collect();
        let step = height / (lines.len() as i32 + 1);
        for (i, line) in lines.iter().enumerate() {
            area.draw(&Text::new(
                line.to_string(),
                ((left + right) / 2, top + step * (i as i32 + 1)),
                style.clone(),
            ))?;
        }
    }
    Ok(())
}

/// Writes the table image and the same rows as CSV.
#[tracing::instrument(skip(data, settings), fields(out_dir = %out_dir.display()))]
pub fn render_table(
    data: &Dataset,
    settings: &RenderSettings,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let summaries = summaries(data);
    print_json(&summaries)?;

    let table = build(&summaries);
    let canvas = settings.standard;
    let png = out_dir.join(PNG_NAME);
    let raster = render(&canvas, table.size_in, |root| draw(root, &table, &canvas))
        .with_context(|| format!("failed to draw {PNG_NAME}"))?;
    save_raster(raster, &png)?;

    let csv = out_dir.join(CSV_NAME);
    write_summary_csv(&csv, &summaries)?;

    Ok(vec![png, csv])
}
