//! Robust location/scale estimates and outlier detection
//!
//! Outliers use the modified z-score
//! ```text
//! Mᵢ = 0.6745 · (xᵢ − median) / MAD
//! ```
//! flagged when |Mᵢ| exceeds the threshold (3.5 by default). When more than
//! half the values coincide the MAD collapses to zero; the mean absolute
//! deviation (scaled by 1.253314 to match a normal σ) is used instead, and
//! a series whose values are all identical has no outliers.
//!
//! Reference:
//! Iglewicz, B. & Hoaglin, D. (1993). How to Detect and Handle Outliers.
//! ASQC Basic References in Quality Control, vol. 16.

use std::cmp::Ordering;

/// Parameters for MAD outlier detection
#[derive(Debug, Clone, Copy)]
pub struct OutlierParams {
    /// Modified z-score threshold
    pub threshold: f64,
}

impl Default for OutlierParams {
    fn default() -> Self {
        Self { threshold: 3.5 }
    }
}

/// Median of finite input; NaN when empty
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Median ignoring NaN
pub fn nan_median(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    median(&finite)
}

/// Population standard deviation ignoring NaN; NaN when empty
pub fn nan_std(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if finite.is_empty() {
        return f64::NAN;
    }
    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    (finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Flag outliers among `values` (NaN entries are never flagged)
pub fn mad_outliers(values: &[f64], params: OutlierParams) -> Vec<bool> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if finite.len() < 3 {
        return vec![false; values.len()];
    }

    let med = median(&finite);
    let deviations: Vec<f64> = finite.iter().map(|v| (v - med).abs()).collect();
    let mad = median(&deviations);

    let scale = if mad > 0.0 {
        mad / 0.6745
    } else {
        let mean_ad = deviations.iter().sum::<f64>() / deviations.len() as f64;
        if mean_ad <= 0.0 {
            return vec![false; values.len()];
        }
        1.253_314 * mean_ad
    };

    values
        .iter()
        .map(|&v| !v.is_nan() && ((v - med).abs() / scale) > params.threshold)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_median_even_odd() {
        assert_relative_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_relative_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert!(median(&[]).is_nan());
        assert_relative_eq!(nan_median(&[f64::NAN, 5.0, 1.0]), 3.0);
    }

    #[test]
    fn test_nan_std() {
        assert_relative_eq!(nan_std(&[2.0, 4.0, f64::NAN, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0);
    }

    #[test]
    fn test_mad_flags_spike() {
        let mut values: Vec<f64> = (0..21).map(|i| -2.0 * i as f64 + 0.3 * ((i * 7) % 5) as f64).collect();
        values[8] = 150.0;
        values[3] = f64::NAN;
        let flags = mad_outliers(&values, OutlierParams::default());
        // Linear trend with a spread of ±20 m: only the spike stands out
        assert!(flags[8]);
        assert!(!flags[3]);
        assert_eq!(flags.iter().filter(|&&f| f).count(), 1);
    }

    #[test]
    fn test_mad_zero_falls_back_to_mean_deviation() {
        let mut values = vec![0.0; 15];
        values[4] = 25.0;
        let flags = mad_outliers(&values, OutlierParams::default());
        assert!(flags[4]);
        assert_eq!(flags.iter().filter(|&&f| f).count(), 1);
    }

    #[test]
    fn test_constant_series_has_no_outliers() {
        let flags = mad_outliers(&[1.0; 10], OutlierParams::default());
        assert!(flags.iter().all(|&f| !f));
    }
}
