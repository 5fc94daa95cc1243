use serde::Serialize;

/// RMSE at or below which an unmixing fit counts as good.
pub const GOOD_FIT_THRESHOLD: f64 = 0.10;

/// Descriptive statistics of one RMSE series, as shown in figure annotations
/// and the summary table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RmseSummary {
    pub label: String,
    pub observations: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample (n - 1) standard deviation, as shown in the table.
    pub std_dev: f64,
    /// Population (n) standard deviation.
    pub pop_std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub pct_good: f64,
}

impl RmseSummary {
    pub fn from_values(label: &str, values: &[f64]) -> Self {
        let avg = mean(values);
        RmseSummary {
            label: label.to_string(),
            observations: values.len(),
            mean: avg,
            median: median(values),
            std_dev: sample_stddev(values, avg),
            pop_std_dev: pop_stddev(values, avg),
            min: min(values),
            max: max(values),
            pct_good: pct_good_fit(values),
        }
    }

    /// Table cells in column order: label, observations, mean, median,
    /// std dev, min, max, percent good.
    pub fn table_cells(&self) -> Vec<String> {
        vec![
            self.label.clone(),
            self.observations.to_string(),
            format!("{:.3}", self.mean),
            format!("{:.3}", self.median),
            format!("{:.3}", self.std_dev),
            format!("{:.3}", self.min),
            format!("{:.3}", self.max),
            format!("{:.1}%", self.pct_good),
        ]
    }
}

/// Quartile summary for one box of a box plot.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub mean: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    /// Whiskers reach the furthest values within 1.5 × IQR of the box;
    /// anything beyond is an outlier. Returns `None` for an empty series.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let sorted = sorted(values);
        let q1 = quantile_sorted(&sorted, 0.25);
        let med = quantile_sorted(&sorted, 0.5);
        let q3 = quantile_sorted(&sorted, 0.75);
        let iqr = q3 - q1;
        let lo_fence = q1 - 1.5 * iqr;
        let hi_fence = q3 + 1.5 * iqr;

        let inside = sorted
            .iter()
            .copied()
            .filter(|v| *v >= lo_fence && *v <= hi_fence);
        let whisker_low = inside.clone().fold(f64::INFINITY, f64::min).min(q1);
        let whisker_high = inside.fold(f64::NEG_INFINITY, f64::max).max(q3);

        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < lo_fence || *v > hi_fence)
            .collect();

        Some(BoxStats {
            q1,
            median: med,
            q3,
            whisker_low,
            whisker_high,
            mean: mean(values),
            outliers,
        })
    }
}

pub fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Percentage of values at or below [`GOOD_FIT_THRESHOLD`]; 0.0 for empty input.
pub fn pct_good_fit(values: &[f64]) -> f64 {
    let good = values.iter().filter(|v| **v <= GOOD_FIT_THRESHOLD).count();
    pct(good, values.len())
}

/// Arithmetic mean; 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    match values.len() {
        0 => 0.0,
        n => values.iter().sum::<f64>() / n as f64,
    }
}

/// Population (n) standard deviation around `mean`; 0.0 for empty input.
pub fn pop_stddev(values: &[f64], mean: f64) -> f64 {
    spread(values, mean, 0)
}

/// Sample (n - 1) standard deviation around `mean`; 0.0 for fewer than two
/// values.
pub fn sample_stddev(values: &[f64], mean: f64) -> f64 {
    spread(values, mean, 1)
}

/// Square root of the summed squared deviations over `n - ddof`.
fn spread(values: &[f64], mean: f64, ddof: usize) -> f64 {
    let Some(denom) = values.len().checked_sub(ddof).filter(|d| *d > 0) else {
        return 0.0;
    };
    let squares: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (squares / denom as f64).sqrt()
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    quantile_sorted(&sorted(values), 0.5)
}

pub fn min(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

pub fn max(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

/// Linear-interpolation quantile of an ascending, non-empty slice.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_pct_with_zero_total() {
        assert_eq!(pct(10, 0), 0.0);
    }

    #[test]
    fn test_pct_normal_values() {
        assert_eq!(pct(50, 100), 50.0);
        assert_eq!(pct(1, 4), 25.0);
    }

    #[test]
    fn test_pct_good_fit_counts_threshold_inclusive() {
        assert_eq!(pct_good_fit(&[0.05, 0.10, 0.11, 0.2]), 50.0);
        assert_eq!(pct_good_fit(&[0.08]), 100.0);
        assert_eq!(pct_good_fit(&[]), 0.0);
    }

    #[test]
    fn test_pct_good_fit_bounded() {
        let values: Vec<f64> = (0..50).map(|i| i as f64 * 0.005).collect();
        let p = pct_good_fit(&values);
        assert!((0.0..=100.0).contains(&p));
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_population_and_sample_stddev() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let m = mean(&v);
        assert_eq!(m, 5.0);
        assert!(approx(pop_stddev(&v, m), 2.0));
        assert_eq!(pop_stddev(&[], 0.0), 0.0);
        assert!(approx(sample_stddev(&v, m), (32.0f64 / 7.0).sqrt()));
        assert_eq!(sample_stddev(&[1.0], 1.0), 0.0);
    }

    #[test]
    fn test_summary_of_empty_series() {
        let s = RmseSummary::from_values("Empty", &[]);
        assert_eq!(s.observations, 0);
        assert_eq!(s.mean, 0.0);
        assert_eq!(s.pct_good, 0.0);
    }

    #[test]
    fn test_summary_carries_both_deviations() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let s = RmseSummary::from_values("Narok", &v);
        assert!(approx(s.pop_std_dev, 2.0));
        assert!(approx(s.std_dev, (32.0f64 / 7.0).sqrt()));

        let single = RmseSummary::from_values("Narok", &[0.08]);
        assert_eq!(single.pop_std_dev, 0.0);
        assert_eq!(single.std_dev, 0.0);
    }

    #[test]
    fn test_summary_cells_formatting() {
        let s = RmseSummary::from_values("Narok", &[0.05, 0.15]);
        let cells = s.table_cells();
        assert_eq!(cells[0], "Narok");
        assert_eq!(cells[1], "2");
        assert_eq!(cells[2], "0.100");
        assert_eq!(cells[5], "0.050");
        assert_eq!(cells[6], "0.150");
        assert_eq!(cells[7], "50.0%");
    }

    #[test]
    fn test_overall_mean_is_weighted_site_mean() {
        let a: Vec<f64> = (0..65).map(|i| 0.05 + 0.001 * i as f64).collect();
        let b: Vec<f64> = (0..21).map(|i| 0.12 + 0.002 * i as f64).collect();
        let c: Vec<f64> = (0..42).map(|i| 0.09 + 0.0005 * i as f64).collect();
        let all: Vec<f64> = a.iter().chain(&b).chain(&c).copied().collect();
        assert_eq!(all.len(), 128);

        let means = [mean(&a), mean(&b), mean(&c)];
        let overall = mean(&all);
        let lo = means.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = means.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(overall >= lo && overall <= hi);

        let weighted = (means[0] * 65.0 + means[1] * 21.0 + means[2] * 42.0) / 128.0;
        assert!(approx(overall, weighted));
    }

    #[test]
    fn test_box_stats_quartiles_and_outliers() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0];
        let b = BoxStats::from_values(&values).unwrap();
        assert!(approx(b.q1, 3.25));
        assert!(approx(b.median, 5.5));
        assert!(approx(b.q3, 7.75));
        assert_eq!(b.whisker_low, 1.0);
        assert_eq!(b.whisker_high, 9.0);
        assert_eq!(b.outliers, vec![100.0]);
        assert!(approx(b.mean, 14.5));
    }

    #[test]
    fn test_box_stats_single_value() {
        let b = BoxStats::from_values(&[0.08]).unwrap();
        assert_eq!(b.q1, 0.08);
        assert_eq!(b.q3, 0.08);
        assert_eq!(b.whisker_low, 0.08);
        assert_eq!(b.whisker_high, 0.08);
        assert!(b.outliers.is_empty());
        assert!(BoxStats::from_values(&[]).is_none());
    }
}
