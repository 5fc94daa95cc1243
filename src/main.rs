//! CLI entry point for the unmixing figure generator.
//!
//! Reads the six per-site CSV exports and writes the publication figures
//! and the RMSE summary table.

use anyhow::Result;
use clap::Parser;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use unmix_figures::config::{self, Config};
use unmix_figures::pipeline;

#[derive(Parser)]
#[command(name = "unmix_figures")]
#[command(about = "Render spectral unmixing figures", long_about = None)]
struct Cli {
    /// Directory holding the six CSV exports
    #[arg(long, value_name = "DIR", default_value = config::DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Directory the figures are written to (created if missing)
    #[arg(long, value_name = "DIR", default_value = config::DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Resolution of the standard PNG figures
    #[arg(
        long,
        default_value_t = config::DEFAULT_DPI,
        value_parser = clap::value_parser!(u32).range(config::DPI_RANGE)
    )]
    dpi: u32,

    /// Resolution of the high-resolution TIFF figures
    #[arg(
        long,
        default_value_t = config::DEFAULT_HIRES_DPI,
        value_parser = clap::value_parser!(u32).range(config::DPI_RANGE)
    )]
    hires_dpi: u32,

    /// TrueType font for all text (default: UNMIX_FONT_PATH, then system fonts)
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Config {
        Config {
            data_dir: self.data_dir,
            output_dir: self.output_dir,
            dpi: self.dpi,
            hires_dpi: self.hires_dpi,
            font_path: self.font,
        }
        .with_env_font()
    }
}

/// Coloured stderr plus a JSON rolling log file. The returned guard flushes
/// the file writer on drop.
fn init_logging() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/unmix_figures.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("unmix_figures.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(guard)
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_logging()?;
    let config = Cli::parse().into_config();

    info!(
        data_dir = %config.data_dir.display(),
        output_dir = %config.output_dir.display(),
        dpi = config.dpi,
        hires_dpi = config.hires_dpi,
        "Spectral unmixing figure generation"
    );

    match pipeline::run(&config) {
        Ok(written) => {
            info!(
                files = written.len(),
                output_dir = %config.output_dir.display(),
                "Done"
            );
            Ok(())
        }
        Err(e) => {
            let chain = format!("{e:#}");
            error!(error = %chain, "Figure generation failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["unmix_figures"]).unwrap();
        let config = Config {
            font_path: None,
            ..cli.into_config()
        };
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_dpi_outside_range_is_rejected() {
        assert!(Cli::try_parse_from(["unmix_figures", "--dpi", "2400"]).is_err());
        assert!(Cli::try_parse_from(["unmix_figures", "--hires-dpi", "5"]).is_err());

        let cli = Cli::try_parse_from(["unmix_figures", "--hires-dpi", "1000"]).unwrap();
        assert_eq!(cli.hires_dpi, 1000);
    }
}
