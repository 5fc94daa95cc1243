pub mod charts;
pub mod config;
pub mod fonts;
pub mod loader;
pub mod merge;
pub mod output;
pub mod pipeline;
pub mod site;
pub mod stats;
pub mod table;

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, NaiveDateTime};
    use std::path::PathBuf;

    use crate::loader::{Dataset, SiteTables};
    use crate::site::Site;
    use crate::table::{AccuracyRecord, DynamicsRecord};

    fn day(month: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, month, d)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    /// `n` dynamics rows every `step` days from Jan 10, summing to 1.0, and
    /// RMSE for every other row plus one date with no dynamics row.
    fn site_tables(site: Site, n: usize, step: i64, rmse_base: f64) -> SiteTables {
        let start = day(1, 10);
        let dynamics: Vec<DynamicsRecord> = (0..n)
            .map(|i| {
                let soil = 0.2 + 0.04 * (i % 5) as f64;
                let veg = 0.5 - 0.03 * (i % 4) as f64;
                DynamicsRecord {
                    timestamp: start + chrono::Duration::days(step * i as i64),
                    soil,
                    veg,
                    shadow: 1.0 - soil - veg,
                }
            })
            .collect();

        let mut accuracy: Vec<AccuracyRecord> = dynamics
            .iter()
            .step_by(2)
            .enumerate()
            .map(|(i, r)| AccuracyRecord {
                timestamp: r.timestamp,
                rmse: rmse_base + 0.015 * (i % 6) as f64,
            })
            .collect();
        accuracy.push(AccuracyRecord {
            timestamp: day(12, 20),
            rmse: rmse_base + 0.2,
        });

        SiteTables {
            site,
            dynamics,
            accuracy,
        }
    }

    /// Registers fonts for rendering tests; `false` means the host has none.
    pub fn fonts_ready() -> bool {
        let explicit = std::env::var_os(crate::config::FONT_ENV).map(PathBuf::from);
        match crate::fonts::ensure_registered(explicit.as_deref()) {
            Ok(_) => true,
            Err(e) => {
                eprintln!("skipping render test: {e}");
                false
            }
        }
    }

    pub fn sample_dataset() -> Dataset {
        Dataset::new(
            site_tables(Site::Narok, 24, 14, 0.05),
            site_tables(Site::Kajiado, 10, 30, 0.07),
            site_tables(Site::Turkana, 16, 20, 0.09),
        )
    }
}
