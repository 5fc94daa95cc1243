//! Persistence for rendered figures and summary statistics.
//!
//! Supports image encoding (PNG or TIFF by extension), CSV export, and
//! JSON logging.

use anyhow::{Context, Result, anyhow};
use image::{ImageFormat, RgbImage};
use serde::Serialize;
use tracing::{debug, info};

use crate::stats::RmseSummary;
use csv::WriterBuilder;
use std::fs::File;
use std::path::Path;

/// Packed 8-bit RGB pixels, row-major.
#[derive(Debug, Clone)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Encodes `raster` to `path`; the format follows the file extension.
pub fn save_raster(raster: Raster, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path)
        .with_context(|| format!("unsupported image extension: {}", path.display()))?;
    let (width, height) = (raster.width, raster.height);
    let img = RgbImage::from_raw(width, height, raster.pixels)
        .ok_or_else(|| anyhow!("pixel buffer does not match {width}x{height}"))?;

    img.save_with_format(path, format)
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!(path = %path.display(), width, height, "Saved");
    Ok(())
}

/// Logs any serializable value as pretty-printed JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    debug!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes one CSV row per [`RmseSummary`], replacing any existing file.
pub fn write_summary_csv(path: &Path, rows: &[RmseSummary]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing summary CSV");

    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path = %path.display(), "Saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    fn checker(width: u32, height: u32) -> Raster {
        let pixels = (0..width * height)
            .flat_map(|i| {
                let v = if i % 2 == 0 { 255 } else { 0 };
                [v, v, v]
            })
            .collect();
        Raster {
            width,
            height,
            pixels,
        }
    }

    #[test]
    fn test_print_json_does_not_panic() {
        let rows = vec![RmseSummary::default()];
        print_json(&rows).unwrap();
    }

    #[test]
    fn test_save_raster_png() {
        let path = temp_path("unmix_figures_test_raster.png");
        let _ = fs::remove_file(&path);

        save_raster(checker(4, 3), &path).unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (4, 3));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_raster_tiff() {
        let path = temp_path("unmix_figures_test_raster.tiff");
        let _ = fs::remove_file(&path);

        save_raster(checker(5, 5), &path).unwrap();
        assert!(fs::metadata(&path).unwrap().len() > 0);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_raster_rejects_short_buffer() {
        let path = temp_path("unmix_figures_test_short.png");
        let raster = Raster {
            width: 10,
            height: 10,
            pixels: vec![0; 5],
        };
        assert!(save_raster(raster, &path).is_err());
    }

    #[test]
    fn test_save_raster_rejects_unknown_extension() {
        let path = temp_path("unmix_figures_test_raster.xyz");
        assert!(save_raster(checker(2, 2), &path).is_err());
    }

    #[test]
    fn test_write_summary_csv_header_and_rows() {
        let path = temp_path("unmix_figures_test_summary.csv");
        let _ = fs::remove_file(&path);

        let rows = vec![
            RmseSummary::from_values("Narok", &[0.05, 0.12]),
            RmseSummary::from_values("Overall", &[0.05, 0.12]),
        ];
        write_summary_csv(&path, &rows).unwrap();
        write_summary_csv(&path, &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        // Rewritten, not appended: 1 header + 2 rows
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "label,observations,mean,median,std_dev,pop_std_dev,min,max,pct_good"
        );
        assert!(lines[1].starts_with("Narok,2,"));

        fs::remove_file(&path).unwrap();
    }
}
