//! Physical sizing (inches, points, dpi) and in-memory rasterization.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::output::Raster;

pub type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Largest raster [`render`] allocates, in pixels (three bytes each).
pub const MAX_RASTER_PIXELS: u64 = 200_000_000;

/// Converts figure units (inches and typographic points) to pixels at a
/// fixed resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub dpi: u32,
}

impl Canvas {
    pub fn new(dpi: u32) -> Self {
        Canvas { dpi: dpi.max(1) }
    }

    pub fn pixels(&self, (w_in, h_in): (f64, f64)) -> (u32, u32) {
        let dpi = self.dpi as f64;
        (
            (w_in * dpi).round().max(1.0) as u32,
            (h_in * dpi).round().max(1.0) as u32,
        )
    }

    /// Points to pixels.
    pub fn px(&self, pt: f64) -> f64 {
        pt * self.dpi as f64 / 72.0
    }

    pub fn px_i(&self, pt: f64) -> i32 {
        self.px(pt).round() as i32
    }

    /// Points to a pixel width of at least one.
    pub fn px_u(&self, pt: f64) -> u32 {
        self.px(pt).round().max(1.0) as u32
    }

    pub fn font(&self, pt: f64) -> FontDesc<'static> {
        FontDesc::new(FontFamily::SansSerif, self.px(pt), FontStyle::Normal)
    }

    pub fn bold(&self, pt: f64) -> FontDesc<'static> {
        FontDesc::new(FontFamily::SansSerif, self.px(pt), FontStyle::Bold)
    }
}

/// Standard and publication resolutions used for one run.
#[derive(Debug, Clone, Copy)]
pub struct RenderSettings {
    pub standard: Canvas,
    pub hires: Canvas,
}

impl RenderSettings {
    pub fn new(dpi: u32, hires_dpi: u32) -> Self {
        RenderSettings {
            standard: Canvas::new(dpi),
            hires: Canvas::new(hires_dpi),
        }
    }
}

/// Draws onto a white RGB buffer of `size_in` inches and returns the pixels.
pub fn render<F>(canvas: &Canvas, size_in: (f64, f64), draw: F) -> Result<Raster>
where
    F: FnOnce(&Area<'_>) -> Result<()>,
{
    let (width, height) = canvas.pixels(size_in);
    let count = u64::from(width) * u64::from(height);
    if count > MAX_RASTER_PIXELS {
        bail!("{width}x{height} raster exceeds the {MAX_RASTER_PIXELS} pixel limit");
    }

    let len = count as usize * 3;
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(len)
        .with_context(|| format!("cannot allocate a {width}x{height} raster"))?;
    pixels.resize(len, 0u8);
    {
        let backend = BitMapBackend::with_buffer(&mut pixels, (width, height));
        let root = backend.into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
    }
    Ok(Raster {
        width,
        height,
        pixels,
    })
}

/// Date axis position: fractional days since the Unix epoch.
pub fn day_number(ts: NaiveDateTime) -> f64 {
    ts.and_utc().timestamp() as f64 / SECONDS_PER_DAY
}

/// [`day_number`] of midnight on `date`.
pub fn date_day(date: NaiveDate) -> f64 {
    day_number(date.and_time(NaiveTime::MIN))
}

pub fn date_label(day: f64, fmt: &str) -> String {
    DateTime::from_timestamp((day * SECONDS_PER_DAY).round() as i64, 0)
        .map(|dt| dt.format(fmt).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::parse_timestamp;

    #[test]
    fn test_canvas_pixels_scale_with_dpi() {
        assert_eq!(Canvas::new(300).pixels((12.0, 10.0)), (3600, 3000));
        assert_eq!(Canvas::new(600).pixels((12.0, 10.0)), (7200, 6000));
        assert_eq!(Canvas::new(72).px(10.0), 10.0);
        assert_eq!(Canvas::new(10).px_u(0.1), 1);
    }

    #[test]
    fn test_day_number_round_trips_through_label() {
        let ts = parse_timestamp("2023-03-04").unwrap();
        let day = day_number(ts);
        assert_eq!(day, 19420.0);
        assert_eq!(date_label(day, "%b %d"), "Mar 04");
        assert_eq!(date_label(day + 0.4, "%Y-%m-%d"), "2023-03-04");
        assert_eq!(date_day(ts.date()), day);
    }

    #[test]
    fn test_render_refuses_oversized_raster() {
        let err = render(&Canvas::new(5000), (16.0, 12.0), |_| Ok(())).unwrap_err();
        assert!(err.to_string().contains("pixel limit"));
    }

    #[test]
    fn test_render_fills_white() {
        let raster = render(&Canvas::new(10), (0.5, 0.3), |_| Ok(())).unwrap();
        assert_eq!((raster.width, raster.height), (5, 3));
        assert_eq!(raster.pixels.len(), 5 * 3 * 3);
        assert!(raster.pixels.iter().all(|&b| b == 255));
    }
}
