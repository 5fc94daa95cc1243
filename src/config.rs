use std::ops::RangeInclusive;
use std::path::PathBuf;

/// Environment variable consulted when no `--font` is given.
pub const FONT_ENV: &str = "UNMIX_FONT_PATH";

pub const DEFAULT_DATA_DIR: &str = "DATA";
pub const DEFAULT_OUTPUT_DIR: &str = "IMAGES";
pub const DEFAULT_DPI: u32 = 300;
pub const DEFAULT_HIRES_DPI: u32 = 600;

/// Resolutions accepted on the command line. At the top end the largest
/// figure still fits under [`crate::charts::canvas::MAX_RASTER_PIXELS`].
pub const DPI_RANGE: RangeInclusive<i64> = 10..=1000;

/// Input and output locations plus rendering resolution for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Resolution of the standard PNG outputs.
    pub dpi: u32,
    /// Resolution of the `_HighRes.tiff` outputs.
    pub hires_dpi: u32,
    pub font_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            dpi: DEFAULT_DPI,
            hires_dpi: DEFAULT_HIRES_DPI,
            font_path: None,
        }
    }
}

impl Config {
    /// Fills `font_path` from [`FONT_ENV`] when it was not set explicitly.
    pub fn with_env_font(mut self) -> Self {
        if self.font_path.is_none() {
            self.font_path = std::env::var_os(FONT_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::canvas::{Canvas, MAX_RASTER_PIXELS};

    #[test]
    fn test_defaults_match_published_layout() {
        let config = Config::default();
        assert_eq!(config.data_dir, PathBuf::from("DATA"));
        assert_eq!(config.output_dir, PathBuf::from("IMAGES"));
        assert_eq!((config.dpi, config.hires_dpi), (300, 600));
        assert!(config.font_path.is_none());
    }

    #[test]
    fn test_explicit_font_wins_over_env() {
        let config = Config {
            font_path: Some(PathBuf::from("/tmp/explicit.ttf")),
            ..Config::default()
        }
        .with_env_font();
        assert_eq!(config.font_path, Some(PathBuf::from("/tmp/explicit.ttf")));
    }

    #[test]
    fn test_largest_figure_fits_at_max_dpi() {
        let dpi = *DPI_RANGE.end() as u32;
        let (w, h) = Canvas::new(dpi).pixels((16.0, 12.0));
        assert!(u64::from(w) * u64::from(h) <= MAX_RASTER_PIXELS);
        assert!(DPI_RANGE.contains(&i64::from(DEFAULT_HIRES_DPI)));
    }
}
