//! Rasterizes [`Figure`] layouts with plotters.

use anyhow::Result;
use plotters::chart::ChartContext;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::canvas::{Area, Canvas, date_label};
use super::layout::{Band, Figure, LegendPos, Marker, Panel, RefLine, Series, dash_intervals};

type Coords = Cartesian2d<RangedCoordf64, RangedCoordf64>;
type Chart<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Coords>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    TopCenter,
}

pub fn draw_figure(root: &Area<'_>, figure: &Figure, canvas: &Canvas) -> Result<()> {
    let body = root.titled(&figure.title, canvas.bold(14.0))?;
    let rows = split_rows(&body, &figure.row_weights);

    for (r, row) in rows.iter().enumerate() {
        let cells = row.split_evenly((1, figure.cols.max(1)));
        for (c, cell) in cells.iter().enumerate() {
            if let Some(panel) = figure.panels.get(r * figure.cols + c) {
                draw_panel(cell, panel, canvas)?;
            }
        }
    }
    Ok(())
}

/// Splits `area` into stacked rows whose heights follow `weights`.
pub fn split_rows<'a>(area: &Area<'a>, weights: &[f64]) -> Vec<Area<'a>> {
    let total: f64 = weights.iter().sum();
    if weights.len() <= 1 || total <= 0.0 {
        return vec![area.clone()];
    }

    let (_, height) = area.dim_in_pixel();
    let mut rest = area.clone();
    let mut rows = Vec::with_capacity(weights.len());
    for w in &weights[..weights.len() - 1] {
        let px = (height as f64 * w / total).round() as u32;
        let (top, bottom) = rest.split_vertically(px);
        rows.push(top);
        rest = bottom;
    }
    rows.push(rest);
    rows
}

pub fn draw_panel(area: &Area<'_>, panel: &Panel, canvas: &Canvas) -> Result<()> {
    let x_label_area = if panel.x_desc.is_some() {
        canvas.px_u(34.0)
    } else {
        canvas.px_u(18.0)
    };

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(canvas.px_u(6.0))
        .margin_right(canvas.px_u(10.0))
        .x_label_area_size(x_label_area)
        .y_label_area_size(canvas.px_u(44.0));
    if let Some(title) = &panel.title {
        builder.caption(title, canvas.bold(12.0));
    }
    let mut chart = builder.build_cartesian_2d(panel.x_range.clone(), panel.y_range.clone())?;

    let date_format = panel.date_format;
    let show_x = panel.show_x_labels;
    let x_fmt = move |v: &f64| {
        if show_x {
            date_label(*v, date_format)
        } else {
            String::new()
        }
    };
    let y_fmt = |v: &f64| format!("{v:.2}");

    let mut mesh = chart.configure_mesh();
    mesh.x_labels(8)
        .y_labels(6)
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .x_max_light_lines(0)
        .y_max_light_lines(0)
        .bold_line_style(BLACK.mix(0.12).stroke_width(1))
        .axis_style(BLACK.stroke_width(canvas.px_u(1.2)))
        .label_style(canvas.font(9.0))
        .axis_desc_style(canvas.bold(10.0))
        .y_desc(panel.y_desc.as_str());
    if let Some(x_desc) = &panel.x_desc {
        mesh.x_desc(x_desc.as_str());
    }
    mesh.draw()?;

    for band in &panel.bands {
        draw_band(&mut chart, band, canvas)?;
    }
    for line in &panel.hlines {
        draw_ref_line(&mut chart, line, canvas, true)?;
    }
    for line in &panel.vlines {
        draw_ref_line(&mut chart, line, canvas, false)?;
    }
    for series in &panel.series {
        draw_series(&mut chart, series, canvas)?;
    }

    if panel.has_legend() {
        let position = match panel.legend {
            LegendPos::UpperLeft => SeriesLabelPosition::UpperLeft,
            LegendPos::UpperRight => SeriesLabelPosition::UpperRight,
            LegendPos::MiddleRight => SeriesLabelPosition::MiddleRight,
        };
        chart
            .configure_series_labels()
            .position(position)
            .margin(canvas.px_u(6.0))
            .legend_area_size(canvas.px_u(18.0))
            .background_style(WHITE.mix(0.85).filled())
            .border_style(BLACK.mix(0.3).stroke_width(1))
            .label_font(canvas.font(9.0))
            .draw()?;
    }

    let plot = chart.plotting_area().strip_coord_spec();
    if let Some(tag) = &panel.tag {
        let tag = [tag.as_str()];
        draw_text_box(&plot, &tag, Corner::TopLeft, canvas.bold(12.0), canvas)?;
    }
    if !panel.note.is_empty() {
        let lines: Vec<&str> = panel.note.iter().map(String::as_str).collect();
        let corner = if panel.legend == LegendPos::UpperRight {
            Corner::TopCenter
        } else {
            Corner::TopRight
        };
        draw_text_box(&plot, &lines, corner, canvas.font(9.0), canvas)?;
    }

    Ok(())
}

fn draw_band(chart: &mut Chart<'_, '_>, band: &Band, canvas: &Canvas) -> Result<()> {
    let fill = band.color.mix(band.opacity).filled();
    let polygons = band.polygons();
    if polygons.is_empty() {
        return Ok(());
    }

    let anno = chart.draw_series(polygons.into_iter().map(|pts| Polygon::new(pts, fill)))?;
    if let Some(label) = &band.label {
        let half = canvas.px_i(4.0);
        let len = canvas.px_i(16.0);
        anno.label(label.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - half), (x + len, y + half)], fill));
    }
    Ok(())
}

fn draw_ref_line(
    chart: &mut Chart<'_, '_>,
    line: &RefLine,
    canvas: &Canvas,
    horizontal: bool,
) -> Result<()> {
    let style = line
        .color
        .mix(line.opacity)
        .stroke_width(canvas.px_u(line.width_pt));
    let x = chart.x_range();
    let y = chart.y_range();
    let v = line.value;

    let dashes: Vec<Vec<(f64, f64)>> = if horizontal {
        dash_intervals(x.start, x.end, line.stroke)
            .into_iter()
            .map(|(a, b)| vec![(a, v), (b, v)])
            .collect()
    } else {
        dash_intervals(y.start, y.end, line.stroke)
            .into_iter()
            .map(|(a, b)| vec![(v, a), (v, b)])
            .collect()
    };

    let anno = chart.draw_series(dashes.into_iter().map(|pts| PathElement::new(pts, style)))?;
    if let Some(label) = &line.label {
        let len = canvas.px_i(16.0);
        anno.label(label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + len, y)], style));
    }
    Ok(())
}

fn draw_series(chart: &mut Chart<'_, '_>, series: &Series, canvas: &Canvas) -> Result<()> {
    let color = series.color.mix(series.opacity);
    let style = color.stroke_width(canvas.px_u(series.width_pt));
    let segments = series.segments();

    for (i, seg) in segments.iter().enumerate() {
        let anno = chart.draw_series(LineSeries::new(seg.iter().copied(), style))?;
        if i == 0 {
            if let Some(label) = &series.label {
                let len = canvas.px_i(16.0);
                anno.label(label.clone())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + len, y)], style));
            }
        }
    }

    let points: Vec<(f64, f64)> = segments.into_iter().flatten().collect();
    let r = (canvas.px(series.marker_pt) / 2.0).round().max(1.0) as i32;
    let fill = color.filled();

    match series.marker {
        Marker::None => {}
        Marker::Circle => {
            chart.draw_series(points.iter().map(|&p| Circle::new(p, r, fill)))?;
        }
        Marker::Square => {
            chart.draw_series(
                points
                    .iter()
                    .map(|&p| EmptyElement::at(p) + Rectangle::new([(-r, -r), (r, r)], fill)),
            )?;
        }
        Marker::Triangle => {
            chart.draw_series(points.iter().map(|&p| TriangleMarker::new(p, r + 1, fill)))?;
        }
        Marker::Diamond => {
            let d = r + 1;
            let outline = vec![(0, -d), (d, 0), (0, d), (-d, 0)];
            chart.draw_series(
                points
                    .iter()
                    .map(|&p| EmptyElement::at(p) + Polygon::new(outline.clone(), fill)),
            )?;
        }
    }
    Ok(())
}

/// Draws `lines` in a boxed note anchored at a corner of `area`.
pub fn draw_text_box(
    area: &Area<'_>,
    lines: &[&str],
    corner: Corner,
    font: FontDesc<'static>,
    canvas: &Canvas,
) -> Result<()> {
    let style = TextStyle::from(font).color(&BLACK);
    let (box_w, _) = text_box_size(area, lines, &style, canvas)?;
    let inset = canvas.px_i(5.0);

    let (area_w, _) = area.dim_in_pixel();
    let left = match corner {
        Corner::TopLeft => inset,
        Corner::TopRight => area_w as i32 - inset - box_w,
        Corner::TopCenter => (area_w as i32 - box_w) / 2,
    };
    paint_text_box(area, lines, (left, inset), &style, canvas)
}

/// Draws `lines` in a boxed note whose top edge is centered on `(cx, top)`.
pub fn draw_text_box_at(
    area: &Area<'_>,
    lines: &[&str],
    (cx, top): (i32, i32),
    font: FontDesc<'static>,
    canvas: &Canvas,
) -> Result<()> {
    let style = TextStyle::from(font).color(&BLACK);
    let (box_w, _) = text_box_size(area, lines, &style, canvas)?;
    paint_text_box(area, lines, (cx - box_w / 2, top), &style, canvas)
}

fn text_box_size(
    area: &Area<'_>,
    lines: &[&str],
    style: &TextStyle<'_>,
    canvas: &Canvas,
) -> Result<(i32, i32)> {
    let pad = canvas.px_i(4.0);
    let (width, step) = measure_lines(area, lines, style)?;
    Ok((width + 2 * pad, step * lines.len() as i32 + 2 * pad))
}

/// Widest line and the vertical step between lines.
fn measure_lines(area: &Area<'_>, lines: &[&str], style: &TextStyle<'_>) -> Result<(i32, i32)> {
    let mut width = 0i32;
    let mut line_height = 0i32;
    for line in lines {
        let (w, h) = area.estimate_text_size(line, style)?;
        width = width.max(w as i32);
        line_height = line_height.max(h as i32);
    }
    Ok((width, (line_height as f64 * 1.25).round() as i32))
}

fn paint_text_box(
    area: &Area<'_>,
    lines: &[&str],
    (left, top): (i32, i32),
    style: &TextStyle<'_>,
    canvas: &Canvas,
) -> Result<()> {
    let pad = canvas.px_i(4.0);
    let (box_w, box_h) = text_box_size(area, lines, style, canvas)?;
    let (_, step) = measure_lines(area, lines, style)?;
    let corners = [(left, top), (left + box_w, top + box_h)];

    area.draw(&Rectangle::new(corners, WHITE.mix(0.9).filled()))?;
    area.draw(&Rectangle::new(corners, BLACK.mix(0.4).stroke_width(1)))?;

    for (i, line) in lines.iter().enumerate() {
        area.draw(&Text::new(
            line.to_string(),
            (left + pad, top + pad + i as i32 * step),
            style.pos(Pos::new(HPos::Left, VPos::Top)),
        ))?;
    }
    Ok(())
}

/// Draws each line of `text` centered on `(x, y)`, stacking downward.
pub fn draw_centered_lines(
    area: &Area<'_>,
    text: &[String],
    (x, y): (i32, i32),
    style: &TextStyle<'_>,
) -> Result<()> {
    let mut offset = 0;
    for line in text {
        let (_, h) = area.estimate_text_size(line, style)?;
        area.draw(&Text::new(
            line.clone(),
            (x, y + offset),
            style.pos(Pos::new(HPos::Center, VPos::Top)),
        ))?;
        offset += (h as f64 * 1.2).round() as i32;
    }
    Ok(())
}
