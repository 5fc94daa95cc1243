//! Runs every renderer over one loaded dataset.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use crate::charts::canvas::RenderSettings;
use crate::charts::{boxplot, composite, multisite, summary, temporal};
use crate::config::Config;
use crate::fonts;
use crate::loader::Dataset;

/// Loads the six exports and writes all figures, in a fixed order.
///
/// Returns the written paths. Stops at the first failure; files already
/// written stay in place.
#[tracing::instrument(
    skip(config),
    fields(
        data_dir = %config.data_dir.display(),
        output_dir = %config.output_dir.display(),
    )
)]
pub fn run(config: &Config) -> Result<Vec<PathBuf>> {
    fonts::ensure_registered(config.font_path.as_deref())?;

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("failed to create {}", config.output_dir.display()))?;

    let data = Dataset::load(&config.data_dir)?;
    info!(tables = data.table_count(), "Loaded datasets");

    let settings = RenderSettings::new(config.dpi, config.hires_dpi);
    let out = config.output_dir.as_path();
    let mut written = Vec::new();

    info!("Generating Figure 3");
    written.extend(temporal::render_figure(&data, &settings, out)?);

    info!("Generating Figure 4");
    written.extend(multisite::render_figure(&data, &settings, out)?);

    info!("Generating per-site composites");
    written.extend(composite::render_all(&data, &settings, out)?);

    info!("Generating RMSE box plot");
    written.push(boxplot::render_figure(&data, &settings, out)?);

    info!("Generating summary table");
    written.extend(summary::render_table(&data, &settings, out)?);

    info!(files = written.len(), output_dir = %out.display(), "All figures generated");
    Ok(written)
}
