//! Study sites and the fixed metadata attached to each of them.

use chrono::NaiveDate;
use plotters::style::RGBColor;
use std::fmt;

/// One of the three study sites of the unmixing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
    Narok,
    Kajiado,
    Turkana,
}

impl Site {
    /// All sites, in the order they appear in every figure and table.
    pub const ALL: [Site; 3] = [Site::Narok, Site::Kajiado, Site::Turkana];

    /// Lowercase identifier (`narok`, `kajiado`, `turkana`).
    pub fn key(self) -> &'static str {
        match self {
            Site::Narok => "narok",
            Site::Kajiado => "kajiado",
            Site::Turkana => "turkana",
        }
    }

    /// Capitalized identifier, used in file names and table rows.
    pub fn title(self) -> &'static str {
        match self {
            Site::Narok => "Narok",
            Site::Kajiado => "Kajiado",
            Site::Turkana => "Turkana",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Site::Narok => "Narok Agricultural Cropland",
            Site::Kajiado => "Kajiado Acacia Shrubland",
            Site::Turkana => "Turkana Arid Rangeland",
        }
    }

    /// Land-cover class shown under the site name on the box plot axis.
    pub fn biome(self) -> &'static str {
        match self {
            Site::Narok => "Cropland",
            Site::Kajiado => "Shrubland",
            Site::Turkana => "Rangeland",
        }
    }

    pub fn dynamics_file(self) -> &'static str {
        match self {
            Site::Narok => "Narok_Crops Soil Veg and Shadow Dynamics.csv",
            Site::Kajiado => "Kajiado_Shrub Soil Veg and Shadow Dynamics.csv",
            Site::Turkana => "Turkana_Bare Soil Veg and Shadow Dynamics.csv",
        }
    }

    // The Narok export carries an underscore the other two do not.
    pub fn accuracy_file(self) -> &'static str {
        match self {
            Site::Narok => "Narok_Crops Model Accuracy_RMSE.csv",
            Site::Kajiado => "Kajiado_Shrub Model Accuracy RMSE.csv",
            Site::Turkana => "Turkana_Bare Model Accuracy RMSE.csv",
        }
    }

    /// Soil and vegetation line colours on the multi-site comparison.
    pub fn comparison_palette(self) -> (RGBColor, RGBColor) {
        match self {
            Site::Narok => (RGBColor(0x8B, 0x45, 0x13), RGBColor(0x2E, 0x8B, 0x57)),
            Site::Kajiado => (RGBColor(0xCD, 0x85, 0x3F), RGBColor(0x3C, 0xB3, 0x71)),
            Site::Turkana => (RGBColor(0xDE, 0xB8, 0x87), RGBColor(0x90, 0xEE, 0x90)),
        }
    }

    pub fn box_color(self) -> RGBColor {
        match self {
            Site::Narok => RGBColor(0x90, 0xEE, 0x90),
            Site::Kajiado => RGBColor(0xFF, 0xD7, 0x00),
            Site::Turkana => RGBColor(0xFF, 0x63, 0x47),
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A dated agronomic or climatic event marked on the Narok time series.
#[derive(Debug, Clone, Copy)]
pub struct PhenologyEvent {
    pub label: &'static str,
    pub date: NaiveDate,
    pub color: RGBColor,
}

/// Long rains onset, harvest, and El Niño onset for the 2023 season.
pub fn narok_events() -> Vec<PhenologyEvent> {
    [
        ("Long Rains", (2023, 3, 4), RGBColor(0, 0, 255)),
        ("Harvest", (2023, 8, 1), RGBColor(255, 165, 0)),
        ("El Niño", (2023, 11, 29), RGBColor(0, 128, 0)),
    ]
    .into_iter()
    .filter_map(|(label, (y, m, d), color)| {
        NaiveDate::from_ymd_opt(y, m, d).map(|date| PhenologyEvent { label, date, color })
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_keys_are_lowercase_titles() {
        for site in Site::ALL {
            assert_eq!(site.key(), site.title().to_lowercase());
        }
    }

    #[test]
    fn test_file_names_are_distinct() {
        let mut names: Vec<_> = Site::ALL
            .iter()
            .flat_map(|s| [s.dynamics_file(), s.accuracy_file()])
            .collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 6);
    }

    #[test]
    fn test_narok_events_in_date_order() {
        let events = narok_events();
        assert_eq!(events.len(), 3);
        assert!(events.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(events[0].date.to_string(), "2023-03-04");
    }
}
