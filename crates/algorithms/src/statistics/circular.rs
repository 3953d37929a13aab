//! Circular statistics for angles with an arbitrary period
//!
//! Bearings along a shoreline transect are axes rather than directions, so
//! they are summarised with period 180°: samples are mapped onto the unit
//! circle with θ·2π/period, averaged as vectors, and mapped back.
//!
//! ```text
//! R    = |mean(e^{iθ})|
//! mean = arg(mean(e^{iθ})) · period / 2π
//! std  = √(−2 ln R) · period / 2π
//! ```

use std::f64::consts::TAU;

/// Circular mean and standard deviation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularSummary {
    /// Mean angle in [0, period)
    pub mean: f64,
    pub std: f64,
}

/// Summarise `angles` (NaN skipped); both statistics are NaN when no angle
/// is finite.
pub fn circular_mean_std(angles: &[f64], period: f64) -> CircularSummary {
    let (mut s, mut c, mut n) = (0.0, 0.0, 0usize);
    for &a in angles.iter().filter(|a| a.is_finite()) {
        let theta = a * TAU / period;
        s += theta.sin();
        c += theta.cos();
        n += 1;
    }
    if n == 0 {
        return CircularSummary {
            mean: f64::NAN,
            std: f64::NAN,
        };
    }

    let (s, c) = (s / n as f64, c / n as f64);
    let r = (s * s + c * c).sqrt().min(1.0);
    let mean = (s.atan2(c) * period / TAU).rem_euclid(period);
    let std = if r > 0.0 {
        (-2.0 * r.ln()).sqrt() * period / TAU
    } else {
        f64::INFINITY
    };
    CircularSummary { mean, std }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wraps_across_zero() {
        // 175° and 5° are 10° apart as axes; the mean axis is 0°
        let s = circular_mean_std(&[175.0, 5.0], 180.0);
        assert!(s.mean < 1e-9 || (180.0 - s.mean) < 1e-9);
        assert!(s.std < 10.0);
    }

    #[test]
    fn test_invariant_under_half_turn() {
        let a = [10.0, 20.0, 35.0, f64::NAN];
        let b: Vec<f64> = a.iter().map(|v| v + 180.0).collect();
        let sa = circular_mean_std(&a, 180.0);
        let sb = circular_mean_std(&b, 180.0);
        assert_relative_eq!(sa.mean, sb.mean, epsilon = 1e-9);
        assert_relative_eq!(sa.std, sb.std, epsilon = 1e-9);
    }

    #[test]
    fn test_identical_angles_have_zero_spread() {
        let s = circular_mean_std(&[42.0; 5], 180.0);
        assert_relative_eq!(s.mean, 42.0, epsilon = 1e-9);
        assert_relative_eq!(s.std, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_empty_is_nan() {
        let s = circular_mean_std(&[f64::NAN], 180.0);
        assert!(s.mean.is_nan() && s.std.is_nan());
    }
}
