//! Backend-independent description of a multi-panel time-series figure.
//!
//! Renderers build a [`Figure`] from the loaded tables; [`super::draw`] turns
//! it into pixels. Keeping the two apart lets tests check axis ranges, series
//! counts, and reference lines without rasterizing anything.

use plotters::style::RGBColor;
use std::ops::Range;

use crate::stats::GOOD_FIT_THRESHOLD;

pub const THRESHOLD_RED: RGBColor = RGBColor(255, 0, 0);
pub const RMSE_FILL: RGBColor = RGBColor(128, 128, 128);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    None,
    Circle,
    Square,
    Triangle,
    Diamond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stroke {
    Solid,
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendPos {
    UpperLeft,
    UpperRight,
    MiddleRight,
}

/// A polyline with optional markers. `None` values break the line.
#[derive(Debug, Clone)]
pub struct Series {
    pub label: Option<String>,
    pub points: Vec<(f64, Option<f64>)>,
    pub color: RGBColor,
    pub width_pt: f64,
    pub marker: Marker,
    pub marker_pt: f64,
    pub opacity: f64,
}

impl Series {
    pub fn new(label: &str, points: Vec<(f64, Option<f64>)>, color: RGBColor) -> Self {
        Series {
            label: Some(label.to_string()),
            points,
            color,
            width_pt: 2.0,
            marker: Marker::None,
            marker_pt: 4.0,
            opacity: 1.0,
        }
    }

    pub fn marker(mut self, marker: Marker, size_pt: f64) -> Self {
        self.marker = marker;
        self.marker_pt = size_pt;
        self
    }

    pub fn width(mut self, width_pt: f64) -> Self {
        self.width_pt = width_pt;
        self
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        split_segments(&self.points)
    }
}

/// A filled region between two curves, stored as contiguous
/// `(x, lower, upper)` runs.
#[derive(Debug, Clone)]
pub struct Band {
    pub label: Option<String>,
    pub segments: Vec<Vec<(f64, f64, f64)>>,
    pub color: RGBColor,
    pub opacity: f64,
}

impl Band {
    /// Fill between zero and `series`, following its gaps.
    pub fn under(series: &Series, opacity: f64) -> Self {
        Band {
            label: None,
            segments: series
                .segments()
                .into_iter()
                .map(|seg| seg.into_iter().map(|(x, y)| (x, 0.0, y)).collect())
                .collect(),
            color: series.color,
            opacity,
        }
    }

    pub fn between(
        label: &str,
        rows: Vec<(f64, f64, f64)>,
        color: RGBColor,
        opacity: f64,
    ) -> Self {
        Band {
            label: Some(label.to_string()),
            segments: vec![rows],
            color,
            opacity,
        }
    }

    pub fn color(mut self, color: RGBColor) -> Self {
        self.color = color;
        self
    }

    /// Closed outline: upper edge left to right, lower edge back.
    pub fn polygons(&self) -> Vec<Vec<(f64, f64)>> {
        self.segments
            .iter()
            .filter(|seg| !seg.is_empty())
            .map(|seg| {
                seg.iter()
                    .map(|&(x, _, hi)| (x, hi))
                    .chain(seg.iter().rev().map(|&(x, lo, _)| (x, lo)))
                    .collect()
            })
            .collect()
    }
}

/// A horizontal or vertical reference line at a fixed data value.
#[derive(Debug, Clone)]
pub struct RefLine {
    pub label: Option<String>,
    pub value: f64,
    pub color: RGBColor,
    pub width_pt: f64,
    pub stroke: Stroke,
    pub opacity: f64,
}

impl RefLine {
    /// Dotted red line at [`GOOD_FIT_THRESHOLD`].
    pub fn threshold(label: &str, width_pt: f64) -> Self {
        RefLine {
            label: Some(label.to_string()),
            value: GOOD_FIT_THRESHOLD,
            color: THRESHOLD_RED,
            width_pt,
            stroke: Stroke::Dotted,
            opacity: 0.7,
        }
    }

    pub fn stroke(mut self, stroke: Stroke) -> Self {
        self.stroke = stroke;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Panel {
    pub title: Option<String>,
    /// Panel tag such as `(A)`, boxed in the upper-left corner.
    pub tag: Option<String>,
    pub x_range: Range<f64>,
    pub y_range: Range<f64>,
    pub y_desc: String,
    pub x_desc: Option<String>,
    pub date_format: &'static str,
    pub show_x_labels: bool,
    pub bands: Vec<Band>,
    pub series: Vec<Series>,
    pub hlines: Vec<RefLine>,
    pub vlines: Vec<RefLine>,
    /// Lines of a boxed annotation in the upper-right corner.
    pub note: Vec<String>,
    pub legend: LegendPos,
}

impl Panel {
    pub fn new(x_range: Range<f64>, y_range: Range<f64>, y_desc: &str) -> Self {
        Panel {
            title: None,
            tag: None,
            x_range,
            y_range,
            y_desc: y_desc.to_string(),
            x_desc: None,
            date_format: "%b %d",
            show_x_labels: true,
            bands: Vec::new(),
            series: Vec::new(),
            hlines: Vec::new(),
            vlines: Vec::new(),
            note: Vec::new(),
            legend: LegendPos::UpperRight,
        }
    }

    pub fn has_legend(&self) -> bool {
        let mut lines = self.hlines.iter().chain(&self.vlines);
        self.series.iter().any(|s| s.label.is_some())
            || self.bands.iter().any(|b| b.label.is_some())
            || lines.any(|l| l.label.is_some())
    }
}

/// A grid of panels under a common title.
#[derive(Debug, Clone)]
pub struct Figure {
    pub title: String,
    pub size_in: (f64, f64),
    pub cols: usize,
    /// Relative row heights; the row count is its length.
    pub row_weights: Vec<f64>,
    /// Row-major.
    pub panels: Vec<Panel>,
}

impl Figure {
    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_weights.len()
    }
}

/// `A`, `B`, ... wrapped in parentheses.
pub fn panel_tag(index: usize) -> String {
    let letter = (b'A' + (index % 26) as u8) as char;
    format!("({letter})")
}

/// Splits points into runs of finite values, breaking at gaps.
pub fn split_segments(points: &[(f64, Option<f64>)]) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for &(x, y) in points {
        match y {
            Some(y) if y.is_finite() && x.is_finite() => current.push((x, y)),
            _ => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Padded x range covering `xs`, so edge markers are not clipped.
///
/// Falls back to a one-day window around a single value, and to calendar
/// year 2023 when `xs` is empty.
pub fn padded_range(xs: impl IntoIterator<Item = f64>) -> Range<f64> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for x in xs.into_iter().filter(|x| x.is_finite()) {
        lo = lo.min(x);
        hi = hi.max(x);
    }

    if lo > hi {
        // 2023-01-01 .. 2023-12-31 in epoch days
        return 19358.0..19722.0;
    }
    if hi - lo < 1.0 {
        return (lo - 1.0)..(hi + 1.0);
    }
    let pad = (hi - lo) * 0.03;
    (lo - pad)..(hi + pad)
}

/// Dash intervals covering `[start, end]`, as fractions `dash` and `gap` of
/// the full length. A solid stroke yields one interval.
pub fn dash_intervals(start: f64, end: f64, stroke: Stroke) -> Vec<(f64, f64)> {
    let (dash, gap) = match stroke {
        Stroke::Solid => return vec![(start, end)],
        Stroke::Dashed => (0.03, 0.02),
        Stroke::Dotted => (0.006, 0.012),
    };
    let len = end - start;
    if len <= 0.0 {
        return Vec::new();
    }

    let (dash, step) = (dash * len, (dash + gap) * len);
    (0..)
        .map(|i| start + i as f64 * step)
        .take_while(|&a| a < end)
        .map(|a| (a, (a + dash).min(end)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_segments_breaks_on_gaps() {
        let pts = vec![
            (0.0, Some(1.0)),
            (1.0, Some(2.0)),
            (2.0, None),
            (3.0, Some(f64::NAN)),
            (4.0, Some(3.0)),
        ];
        let segs = split_segments(&pts);
        assert_eq!(segs, vec![vec![(0.0, 1.0), (1.0, 2.0)], vec![(4.0, 3.0)]]);
        assert!(split_segments(&[(0.0, None)]).is_empty());
    }

    #[test]
    fn test_band_under_follows_series_gaps() {
        let points = vec![(0.0, Some(0.1)), (1.0, None), (2.0, Some(0.2))];
        let s = Series::new("RMSE", points, THRESHOLD_RED);
        let band = Band::under(&s, 0.2);
        assert_eq!(band.segments.len(), 2);
        assert_eq!(band.segments[1], vec![(2.0, 0.0, 0.2)]);
    }

    #[test]
    fn test_band_polygon_outline() {
        let rows = vec![(0.0, 0.2, 0.5), (1.0, 0.3, 0.6)];
        let band = Band::between("Veg", rows, RMSE_FILL, 0.7);
        let polys = band.polygons();
        assert_eq!(polys.len(), 1);
        assert_eq!(
            polys[0],
            vec![(0.0, 0.5), (1.0, 0.6), (1.0, 0.3), (0.0, 0.2)]
        );
    }

    #[test]
    fn test_padded_range() {
        let r = padded_range([10.0, 110.0]);
        assert!(r.start < 10.0 && r.end > 110.0);
        assert_eq!(padded_range([5.0]), 4.0..6.0);
        let empty = padded_range(std::iter::empty());
        assert!(empty.start < empty.end);
    }

    #[test]
    fn test_dash_intervals_stay_in_bounds() {
        let dashes = dash_intervals(0.0, 1.0, Stroke::Dashed);
        assert!((19..=21).contains(&dashes.len()));
        assert!(dashes.iter().all(|&(a, b)| a >= 0.0 && b <= 1.0 && a < b));
        assert_eq!(dash_intervals(0.0, 2.0, Stroke::Solid), vec![(0.0, 2.0)]);
        assert!(dash_intervals(1.0, 1.0, Stroke::Dotted).is_empty());
    }

    #[test]
    fn test_row_count_follows_weights() {
        let fig = Figure {
            title: String::new(),
            size_in: (4.0, 3.0),
            cols: 2,
            row_weights: vec![2.0, 1.0],
            panels: Vec::new(),
        };
        assert_eq!(fig.row_count(), 2);
        assert_eq!(fig.panel_count(), 0);
    }

    #[test]
    fn test_panel_tags() {
        assert_eq!(panel_tag(0), "(A)");
        assert_eq!(panel_tag(5), "(F)");
    }
}
