//! CSV loading for the six per-site exports.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::site::Site;
use crate::table::{AccuracyRecord, DynamicsRecord};

/// Allowed deviation of `Soil + Veg + Shadow` from 1.0 before a row is reported.
pub const FRACTION_SUM_TOLERANCE: f64 = 0.02;

/// Dynamics and accuracy tables for a single site.
#[derive(Debug, Clone)]
pub struct SiteTables {
    pub site: Site,
    pub dynamics: Vec<DynamicsRecord>,
    pub accuracy: Vec<AccuracyRecord>,
}

impl SiteTables {
    pub fn rmse_values(&self) -> Vec<f64> {
        self.accuracy.iter().map(|r| r.rmse).collect()
    }
}

/// Every table needed by the figures, indexed by [`Site`].
#[derive(Debug, Clone)]
pub struct Dataset {
    sites: [SiteTables; 3],
}

impl Dataset {
    pub fn new(narok: SiteTables, kajiado: SiteTables, turkana: SiteTables) -> Self {
        Self {
            sites: [narok, kajiado, turkana],
        }
    }

    /// Reads all six exports from `data_dir`, failing on the first missing or
    /// malformed file.
    #[tracing::instrument(fields(data_dir = %data_dir.display()))]
    pub fn load(data_dir: &Path) -> Result<Self> {
        let [narok, kajiado, turkana] = Site::ALL;
        Ok(Self::new(
            load_site(data_dir, narok)?,
            load_site(data_dir, kajiado)?,
            load_site(data_dir, turkana)?,
        ))
    }

    pub fn site(&self, site: Site) -> &SiteTables {
        // Site::ALL order matches the array layout.
        &self.sites[site as usize]
    }

    pub fn site_mut(&mut self, site: Site) -> &mut SiteTables {
        &mut self.sites[site as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &SiteTables> {
        self.sites.iter()
    }

    pub fn table_count(&self) -> usize {
        self.sites.len() * 2
    }

    /// RMSE values of all sites concatenated in site order.
    pub fn overall_rmse(&self) -> Vec<f64> {
        self.sites.iter().flat_map(|s| s.rmse_values()).collect()
    }
}

/// Loads the dynamics and accuracy exports for one site.
pub fn load_site(data_dir: &Path, site: Site) -> Result<SiteTables> {
    let dynamics: Vec<DynamicsRecord> = read_table(&data_dir.join(site.dynamics_file()))?;
    let accuracy: Vec<AccuracyRecord> = read_table(&data_dir.join(site.accuracy_file()))?;

    let off = check_fraction_sums(&dynamics);
    if off > 0 {
        warn!(
            site = %site,
            rows = off,
            tolerance = FRACTION_SUM_TOLERANCE,
            "Fractions do not sum to 1.0; plotting source values as-is"
        );
    }

    info!(
        site = %site,
        dynamics = dynamics.len(),
        accuracy = accuracy.len(),
        "Loaded site tables"
    );

    Ok(SiteTables {
        site,
        dynamics,
        accuracy,
    })
}

/// Deserializes every row of the CSV file at `path`.
///
/// # Errors
///
/// Returns an error naming the file if it cannot be opened, a required
/// column is missing, or any row fails to parse.
pub fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(file);

    let mut rows = Vec::new();
    for (i, result) in rdr.deserialize().enumerate() {
        let record: T =
            result.with_context(|| format!("{}: malformed row {}", path.display(), i + 1))?;
        rows.push(record);
    }

    debug!(path = %path.display(), rows = rows.len(), "Read CSV table");
    Ok(rows)
}

/// Counts rows whose fractions stray from 1.0 by more than
/// [`FRACTION_SUM_TOLERANCE`], logging each one at debug level.
pub fn check_fraction_sums(records: &[DynamicsRecord]) -> usize {
    records
        .iter()
        .filter(|r| {
            let sum = r.fraction_sum();
            let off = (sum - 1.0).abs() > FRACTION_SUM_TOLERANCE;
            if off {
                debug!(timestamp = %r.timestamp, sum, "Fraction sum out of tolerance");
            }
            off
        })
        .count()
}
