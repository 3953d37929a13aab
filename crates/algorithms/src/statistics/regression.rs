//! Ordinary least squares with slope significance
//!
//! ```text
//! slope = Sxy / Sxx,   intercept = ȳ − slope·x̄
//! se    = √(SSE / (n − 2)) / √Sxx
//! p     = 2 · (1 − T_{n−2}(|slope / se|))
//! ```

use statrs::distribution::{ContinuousCDF, StudentsT};

/// Result of a simple linear regression
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Two-sided p-value of the slope under H₀: slope = 0
    pub p_value: f64,
    /// Standard error of the slope
    pub stderr: f64,
    /// Number of (x, y) pairs used
    pub n: usize,
}

impl LinearFit {
    /// All-NaN fit, used where a series cannot be regressed
    pub fn nan() -> Self {
        Self {
            slope: f64::NAN,
            intercept: f64::NAN,
            p_value: f64::NAN,
            stderr: f64::NAN,
            n: 0,
        }
    }

    /// Copy with every statistic rounded to `decimals`
    pub fn rounded(&self, decimals: i32) -> Self {
        let scale = 10f64.powi(decimals);
        let round = |v: f64| (v * scale).round() / scale;
        Self {
            slope: round(self.slope),
            intercept: round(self.intercept),
            p_value: round(self.p_value),
            stderr: round(self.stderr),
            n: self.n,
        }
    }
}

/// Fit `y = slope·x + intercept`, skipping pairs where either value is NaN.
///
/// Returns `None` with fewer than two pairs or when every x is identical.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(&a, &b)| (a, b))
        .collect();
    let n = pairs.len();
    if n < 2 {
        return None;
    }

    let n_f = n as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n_f;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n_f;
    let sxx: f64 = pairs.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    let sxy: f64 = pairs.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();
    if sxx <= 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    if n == 2 {
        // Two points fit exactly; no residual degrees of freedom
        return Some(LinearFit {
            slope,
            intercept,
            p_value: if slope != 0.0 { 0.0 } else { 1.0 },
            stderr: 0.0,
            n,
        });
    }

    let sse: f64 = pairs
        .iter()
        .map(|p| (p.1 - (intercept + slope * p.0)).powi(2))
        .sum();
    let df = n_f - 2.0;
    let stderr = (sse / df).sqrt() / sxx.sqrt();

    let p_value = if stderr <= f64::EPSILON * slope.abs().max(1.0) {
        if slope != 0.0 {
            0.0
        } else {
            1.0
        }
    } else {
        let t = (slope / stderr).abs();
        match StudentsT::new(0.0, 1.0, df) {
            Ok(dist) => (2.0 * (1.0 - dist.cdf(t))).clamp(0.0, 1.0),
            Err(_) => f64::NAN,
        }
    };

    Some(LinearFit {
        slope,
        intercept,
        p_value,
        stderr,
        n,
    })
}
