//! Timestamp joins between dynamics and accuracy tables.

use chrono::NaiveDateTime;
use std::collections::HashMap;

use crate::table::{AccuracyRecord, DynamicsRecord, MergedRecord};

/// Left-joins `dynamics` with `accuracy` on exact timestamp equality.
///
/// Every dynamics row is kept in its original order. A row with no matching
/// timestamp gets `rmse: None`; a row matching several accuracy rows is
/// repeated once per match.
pub fn merge_left(dynamics: &[DynamicsRecord], accuracy: &[AccuracyRecord]) -> Vec<MergedRecord> {
    let mut by_time: HashMap<NaiveDateTime, Vec<f64>> = HashMap::new();
    for a in accuracy {
        by_time.entry(a.timestamp).or_default().push(a.rmse);
    }

    let mut merged = Vec::with_capacity(dynamics.len());
    for d in dynamics {
        let row = |rmse| MergedRecord {
            timestamp: d.timestamp,
            soil: d.soil,
            veg: d.veg,
            shadow: d.shadow,
            rmse,
        };

        match by_time.get(&d.timestamp) {
            Some(matches) => merged.extend(matches.iter().map(|&v| row(Some(v)))),
            None => merged.push(row(None)),
        }
    }

    merged
}

/// RMSE values present in a merged table, skipping unmatched rows.
pub fn matched_rmse(merged: &[MergedRecord]) -> Vec<f64> {
    merged.iter().filter_map(|r| r.rmse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::parse_timestamp;

    fn dyn_row(date: &str, soil: f64) -> DynamicsRecord {
        DynamicsRecord {
            timestamp: parse_timestamp(date).unwrap(),
            soil,
            veg: 0.5,
            shadow: 0.5 - soil,
        }
    }

    fn acc_row(date: &str, rmse: f64) -> AccuracyRecord {
        AccuracyRecord {
            timestamp: parse_timestamp(date).unwrap(),
            rmse,
        }
    }

    #[test]
    fn test_single_row_merge() {
        let dynamics = vec![DynamicsRecord {
            timestamp: parse_timestamp("2023-03-04").unwrap(),
            soil: 0.4,
            veg: 0.5,
            shadow: 0.1,
        }];
        let accuracy = vec![acc_row("2023-03-04", 0.08)];

        let merged = merge_left(&dynamics, &accuracy);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].rmse, Some(0.08));
        assert_eq!(merged[0].soil, 0.4);
    }

    #[test]
    fn test_unmatched_rows_are_kept_without_rmse() {
        let dynamics = vec![
            dyn_row("2023-01-01", 0.1),
            dyn_row("2023-01-06", 0.2),
            dyn_row("2023-01-11", 0.3),
        ];
        let accuracy = vec![acc_row("2023-01-06", 0.05), acc_row("2023-02-01", 0.2)];

        let merged = merge_left(&dynamics, &accuracy);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].rmse, None);
        assert_eq!(merged[1].rmse, Some(0.05));
        assert_eq!(merged[2].rmse, None);
        assert_eq!(matched_rmse(&merged), vec![0.05]);
    }

    #[test]
    fn test_merge_preserves_order_and_never_drops_rows() {
        let dynamics: Vec<_> = (1..=28)
            .map(|d| dyn_row(&format!("2023-02-{d:02}"), 0.01 * d as f64))
            .collect();
        let accuracy = vec![
            acc_row("2023-02-03", 0.1),
            acc_row("2023-02-03", 0.12),
            acc_row("2023-02-10", 0.09),
        ];

        let merged = merge_left(&dynamics, &accuracy);
        assert!(merged.len() >= dynamics.len());
        assert_eq!(merged.len(), 29);
        assert!(merged.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_merge_is_exact_not_nearest() {
        let dynamics = vec![DynamicsRecord {
            timestamp: parse_timestamp("2023-03-04 10:00:00").unwrap(),
            soil: 0.4,
            veg: 0.5,
            shadow: 0.1,
        }];
        let accuracy = vec![acc_row("2023-03-04", 0.08)];

        let merged = merge_left(&dynamics, &accuracy);
        assert_eq!(merged[0].rmse, None);
    }
}
