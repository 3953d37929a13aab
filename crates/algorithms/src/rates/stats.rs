//! Rate-of-change statistics for one point's distance series

use std::collections::BTreeMap;

use crate::statistics::{linear_regression, mad_outliers, LinearFit, OutlierParams};

/// Parameters for rate statistics
#[derive(Debug, Clone)]
pub struct RateStatsParams {
    /// First year included in the all-time statistics
    pub initial_year: i32,
    pub outliers: OutlierParams,
    /// Decimal places kept in regression output
    pub decimals: i32,
}

impl Default for RateStatsParams {
    fn default() -> Self {
        Self {
            initial_year: 1988,
            outliers: OutlierParams::default(),
            decimals: 3,
        }
    }
}

/// Regression and summary statistics of a distance series
#[derive(Debug, Clone, PartialEq)]
pub struct RateStats {
    /// Distance against year, outliers removed, rounded
    pub fit: LinearFit,
    /// Years flagged as outliers, ascending
    pub outliers: Vec<i32>,
    pub valid_obs: usize,
    pub valid_span: usize,
    /// Shoreline change envelope: max − min distance
    pub sce: f64,
    /// Net shoreline movement: −distance at the initial year
    pub nsm: f64,
    pub max_year: Option<i32>,
    pub min_year: Option<i32>,
}

impl RateStats {
    /// Outlier years joined by spaces
    pub fn outlier_string(&self) -> String {
        self.outliers
            .iter()
            .map(|y| y.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Compute statistics for `distances` (year → signed distance, NaN missing)
pub fn rate_statistics(distances: &BTreeMap<i32, f64>, params: &RateStatsParams) -> RateStats {
    let valid: Vec<(i32, f64)> = distances
        .iter()
        .filter(|(_, d)| d.is_finite())
        .map(|(&y, &d)| (y, d))
        .collect();

    let values: Vec<f64> = valid.iter().map(|&(_, d)| d).collect();
    let flags = mad_outliers(&values, params.outliers);
    let outliers: Vec<i32> = valid
        .iter()
        .zip(&flags)
        .filter(|(_, &f)| f)
        .map(|(&(y, _), _)| y)
        .collect();
    let kept: Vec<(i32, f64)> = valid
        .iter()
        .zip(&flags)
        .filter(|(_, &f)| !f)
        .map(|(&p, _)| p)
        .collect();

    let years: Vec<f64> = kept.iter().map(|&(y, _)| y as f64).collect();
    let dists: Vec<f64> = kept.iter().map(|&(_, d)| d).collect();
    let fit = linear_regression(&years, &dists)
        .map(|f| f.rounded(params.decimals))
        .unwrap_or_else(LinearFit::nan);

    let window: Vec<(i32, f64)> = kept
        .into_iter()
        .filter(|&(y, _)| y >= params.initial_year)
        .collect();
    let max = window
        .iter()
        .copied()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    let min = window
        .iter()
        .copied()
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let valid_span = match (window.first(), window.last()) {
        (Some(first), Some(last)) => (last.0 - first.0 + 1) as usize,
        _ => 0,
    };
    let sce = match (max, min) {
        (Some(hi), Some(lo)) => hi.1 - lo.1,
        _ => f64::NAN,
    };
    let nsm = window
        .iter()
        .find(|&&(y, _)| y == params.initial_year)
        .map_or(f64::NAN, |&(_, d)| -d);

    RateStats {
        fit,
        outliers,
        valid_obs: window.len(),
        valid_span,
        sce,
        nsm,
        max_year: max.map(|m| m.0),
        min_year: min.map(|m| m.0),
    }
}
