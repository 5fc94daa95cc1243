//! Row types for the two exported table shapes and their merged form.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

/// One observation from a `Soil Veg and Shadow Dynamics` export.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DynamicsRecord {
    #[serde(
        rename = "system:time_start",
        alias = "date",
        alias = "timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "Soil")]
    pub soil: f64,
    #[serde(rename = "Veg")]
    pub veg: f64,
    #[serde(rename = "Shadow")]
    pub shadow: f64,
}

impl DynamicsRecord {
    pub fn fraction_sum(&self) -> f64 {
        self.soil + self.veg + self.shadow
    }

    /// Cumulative band boundaries `(soil, soil + veg, 1.0)` for a stacked
    /// area chart, clamped so that `0 <= lower <= middle <= upper = 1`.
    pub fn stack_bounds(&self) -> (f64, f64, f64) {
        let lower = clamp_unit(self.soil);
        let middle = clamp_unit(self.soil + self.veg).max(lower);
        (lower, middle, 1.0)
    }
}

/// One observation from a `Model Accuracy RMSE` export.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccuracyRecord {
    #[serde(
        rename = "system:time_start",
        alias = "date",
        alias = "timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "RMSE")]
    pub rmse: f64,
}

/// A dynamics row joined with the RMSE observed at the same timestamp, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub timestamp: NaiveDateTime,
    pub soil: f64,
    pub veg: f64,
    pub shadow: f64,
    pub rmse: Option<f64>,
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%b %d, %Y", "%B %d, %Y", "%d/%m/%Y", "%Y/%m/%d"];

/// Parses the timestamp encodings found in Earth Engine exports.
///
/// Accepts chart-export dates (`Mar 4, 2023`), ISO dates and date-times,
/// RFC 3339, and integer epoch milliseconds (`system:time_start` raw values).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(ms) = s.parse::<i64>() {
        return DateTime::from_timestamp_millis(ms).map(|dt| dt.naive_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_chart_export_date() {
        assert_eq!(parse_timestamp("Mar 4, 2023"), Some(ymd(2023, 3, 4)));
        assert_eq!(parse_timestamp("Nov 29, 2023"), Some(ymd(2023, 11, 29)));
    }

    #[test]
    fn test_parse_iso_forms() {
        assert_eq!(parse_timestamp("2023-03-04"), Some(ymd(2023, 3, 4)));
        assert_eq!(
            parse_timestamp("2023-03-04 10:15:00").map(|t| t.to_string()),
            Some("2023-03-04 10:15:00".to_string())
        );
        assert_eq!(
            parse_timestamp("2023-03-04T00:00:00Z"),
            Some(ymd(2023, 3, 4))
        );
    }

    #[test]
    fn test_parse_epoch_millis() {
        // 2023-03-04T00:00:00Z
        assert_eq!(parse_timestamp("1677888000000"), Some(ymd(2023, 3, 4)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn test_stack_bounds_are_ordered() {
        let rec = DynamicsRecord {
            timestamp: ymd(2023, 3, 4),
            soil: 0.4,
            veg: 0.5,
            shadow: 0.1,
        };
        let (lower, middle, upper) = rec.stack_bounds();
        assert!((lower - 0.4).abs() < 1e-12);
        assert!((middle - 0.9).abs() < 1e-12);
        assert_eq!(upper, 1.0);
    }

    #[test]
    fn test_stack_bounds_clamp_out_of_range_fractions() {
        let over = DynamicsRecord {
            timestamp: ymd(2023, 3, 4),
            soil: 0.7,
            veg: 0.6,
            shadow: 0.0,
        };
        let (lower, middle, upper) = over.stack_bounds();
        assert!(lower <= middle && middle <= upper);
        assert_eq!(middle, 1.0);

        let negative = DynamicsRecord {
            timestamp: ymd(2023, 3, 4),
            soil: -0.1,
            veg: -0.2,
            shadow: 1.3,
        };
        let (lower, middle, _) = negative.stack_bounds();
        assert_eq!(lower, 0.0);
        assert_eq!(middle, 0.0);
    }
}
