//! Statistics Calculator Module
//! Descriptive statistics and box-plot summaries of the derived metrics.

use serde::Serialize;

/// Whisker reach in interquartile ranges.
pub const WHISKER_IQR: f64 = 1.5;

/// Descriptive statistics for a set of values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub q3: f64,
    pub p05: f64,
    pub p95: f64,
}

impl Default for DistributionStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            variance: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            q1: f64::NAN,
            q3: f64::NAN,
            p05: f64::NAN,
            p95: f64::NAN,
        }
    }
}

impl DistributionStats {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// What a box overlay draws: the box, the median and the whiskers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxSummary {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub mean: f64,
    /// Smallest value within 1.5 IQR below q1.
    pub whisker_low: f64,
    /// Largest value within 1.5 IQR above q3.
    pub whisker_high: f64,
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(values: &[f64]) -> DistributionStats {
        let n = values.len();
        if n == 0 {
            return DistributionStats::default();
        }

        let sorted = Self::sorted(values);

        let mean = values.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };

        DistributionStats {
            count: n,
            mean,
            median: Self::percentile(&sorted, 50.0),
            std: variance.sqrt(),
            variance,
            min: sorted[0],
            max: sorted[n - 1],
            q1: Self::percentile(&sorted, 25.0),
            q3: Self::percentile(&sorted, 75.0),
            p05: Self::percentile(&sorted, 5.0),
            p95: Self::percentile(&sorted, 95.0),
        }
    }

    /// Box, median, mean and Tukey whiskers; `None` for an empty slice.
    pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
        if values.is_empty() {
            return None;
        }
        let stats = Self::compute_descriptive_stats(values);
        let sorted = Self::sorted(values);
        let reach = WHISKER_IQR * stats.iqr();

        let whisker_low = sorted
            .iter()
            .copied()
            .find(|&v| v >= stats.q1 - reach)
            .unwrap_or(stats.q1);
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= stats.q3 + reach)
            .unwrap_or(stats.q3);

        Some(BoxSummary {
            q1: stats.q1,
            median: stats.median,
            q3: stats.q3,
            mean: stats.mean,
            whisker_low,
            whisker_high,
        })
    }

    fn sorted(values: &[f64]) -> Vec<f64> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        sorted
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptive_stats() {
        let stats = StatsCalculator::compute_descriptive_stats(&[4.0, 1.0, 3.0, 2.0, 5.0]);
        assert_eq!(stats.count, 5);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.q1, 2.0);
        assert_eq!(stats.q3, 4.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert!((stats.variance - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_stats_are_nan() {
        let stats = StatsCalculator::compute_descriptive_stats(&[]);
        assert_eq!(stats.count, 0);
        assert!(stats.mean.is_nan());
        assert!(StatsCalculator::box_summary(&[]).is_none());
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [10.0, 20.0, 30.0, 40.0];
        assert_eq!(StatsCalculator::percentile(&sorted, 50.0), 25.0);
        assert_eq!(StatsCalculator::percentile(&sorted, 0.0), 10.0);
        assert_eq!(StatsCalculator::percentile(&sorted, 100.0), 40.0);
    }

    #[test]
    fn test_whiskers_exclude_outliers() {
        let values = [20.0, 22.0, 24.0, 25.0, 26.0, 28.0, 90.0];
        let summary = StatsCalculator::box_summary(&values).unwrap();
        assert_eq!(summary.whisker_low, 20.0);
        assert_eq!(summary.whisker_high, 28.0);
        assert_eq!(summary.median, 25.0);
    }
}
