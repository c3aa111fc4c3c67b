//! Kernel density estimate used to draw violin outlines.

use statrs::distribution::{Continuous, Normal};

/// Number of points sampled along a violin outline.
pub const DENSITY_SAMPLES: usize = 100;

/// Sampled density curve of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityCurve {
    /// (value, density) pairs in increasing value order.
    pub points: Vec<(f64, f64)>,
    pub bandwidth: f64,
}

impl DensityCurve {
    pub fn max_density(&self) -> f64 {
        self.points.iter().map(|&(_, d)| d).fold(0.0, f64::max)
    }

    /// Densities scaled so the widest point equals `half_width`.
    pub fn scaled(&self, half_width: f64) -> Vec<(f64, f64)> {
        let max = self.max_density();
        if max <= 0.0 {
            return self.points.iter().map(|&(v, _)| (v, 0.0)).collect();
        }
        self.points
            .iter()
            .map(|&(v, d)| (v, d / max * half_width))
            .collect()
    }
}

/// Silverman's rule of thumb: 1.059 * min(std, IQR / 1.349) * n^(-1/5).
pub fn silverman_bandwidth(values: &[f64]) -> f64 {
    let stats = super::StatsCalculator::compute_descriptive_stats(values);
    let n = values.len() as f64;
    let spread = match stats.iqr() / 1.349 {
        iqr if iqr > 0.0 => stats.std.min(iqr),
        _ => stats.std,
    };
    let bandwidth = 1.059 * spread * n.powf(-0.2);
    if bandwidth.is_finite() && bandwidth > 0.0 {
        bandwidth
    } else {
        // Single value or all equal: any small positive width draws a sliver.
        1.0
    }
}

/// Gaussian KDE sampled from `min - 2h` to `max + 2h`.
pub fn gaussian_kde(values: &[f64]) -> Option<DensityCurve> {
    if values.is_empty() {
        return None;
    }
    let bandwidth = silverman_bandwidth(values);
    let kernel = Normal::new(0.0, 1.0).ok()?;

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let start = min - 2.0 * bandwidth;
    let end = max + 2.0 * bandwidth;
    let step = (end - start) / (DENSITY_SAMPLES - 1) as f64;
    let norm = values.len() as f64 * bandwidth;

    let points = (0..DENSITY_SAMPLES)
        .map(|i| {
            let x = start + step * i as f64;
            let density = values
                .iter()
                .map(|v| kernel.pdf((x - v) / bandwidth))
                .sum::<f64>()
                / norm;
            (x, density)
        })
        .collect();

    Some(DensityCurve { points, bandwidth })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kde_integrates_to_about_one() {
        let values = [22.0, 24.0, 24.5, 25.0, 26.0, 30.0, 31.0, 36.0];
        let curve = gaussian_kde(&values).unwrap();
        let step = curve.points[1].0 - curve.points[0].0;
        let area: f64 = curve.points.iter().map(|&(_, d)| d * step).sum();
        assert!((area - 1.0).abs() < 0.05, "area was {}", area);
    }

    #[test]
    fn test_kde_peaks_near_the_mode() {
        let values = [10.0, 10.0, 10.0, 10.5, 9.5, 20.0];
        let curve = gaussian_kde(&values).unwrap();
        let (peak, _) = curve
            .points
            .iter()
            .copied()
            .fold((0.0, f64::MIN), |best, p| if p.1 > best.1 { p } else { best });
        assert!((peak - 10.0).abs() < 1.5);
    }

    #[test]
    fn test_single_value_has_positive_bandwidth() {
        let curve = gaussian_kde(&[42.0]).unwrap();
        assert!(curve.bandwidth > 0.0);
        let scaled = curve.scaled(0.4);
        assert!(scaled.iter().any(|&(_, w)| (w - 0.4).abs() < 1e-9));
    }

    #[test]
    fn test_empty_has_no_curve() {
        assert!(gaussian_kde(&[]).is_none());
    }
}
