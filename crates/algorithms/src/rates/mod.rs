//! Rates of shoreline change at points along the baseline shoreline
//!
//! - **baseline**: evenly spaced points along the baseline-year shoreline
//! - **movement**: signed distance and bearing to every annual shoreline
//! - **stats**: robust regression and summary statistics per point

mod baseline;
mod movement;
mod stats;

pub use baseline::sample_along;
pub use movement::{annual_movements, AnnualSurfaces, MovementParams, PointMovement};
pub use stats::{rate_statistics, RateStats, RateStatsParams};

use std::collections::BTreeMap;

use coastlines_core::{Algorithm, Error, FeatureCollection, GeoTransform, Projection, Result, CRS};
use geo_types::{MultiLineString, Point};
use ndarray::Array2;
use tracing::{debug, info};

use crate::certainty::{classify_point, rocky_coast_flags, PointFacts, RockyParams};
use crate::geodesy::geohash;
use crate::statistics::{circular_mean_std, OutlierParams};

/// Precision of point identifiers
pub const GEOHASH_PRECISION: usize = 11;

/// Parameters for rates of change
#[derive(Debug, Clone)]
pub struct RateParams {
    pub baseline_year: i32,
    /// First year of the all-time statistics
    pub initial_year: i32,
    /// Distance between baseline points (m)
    pub spacing: f64,
    pub max_valid_dist: f64,
    pub outliers: OutlierParams,
    pub rocky: RockyParams,
    /// Decimal places of point coordinates in the analysis CRS
    pub coordinate_decimals: i32,
    /// Decimal places of annual distances
    pub distance_decimals: i32,
}

impl Default for RateParams {
    fn default() -> Self {
        Self {
            baseline_year: 2021,
            initial_year: 1988,
            spacing: 30.0,
            max_valid_dist: 1200.0,
            outliers: OutlierParams::default(),
            rocky: RockyParams::default(),
            coordinate_decimals: 2,
            distance_decimals: 2,
        }
    }
}

/// A baseline point and everything measured at it
#[derive(Debug, Clone)]
pub struct RatePoint {
    pub location: Point<f64>,
    /// Geohash of the rounded location in lon/lat
    pub uid: String,
    /// Signed distance per year (m), NaN where missing
    pub distances: BTreeMap<i32, f64>,
    pub stats: RateStats,
    /// Circular mean of bearings, whole degrees in [0, 180)
    pub angle_mean: f64,
    pub angle_std: f64,
    pub certainty: &'static str,
}

/// Shorelines and surfaces of one tile
#[derive(Debug, Clone)]
pub struct RatesInput {
    pub shorelines: BTreeMap<i32, MultiLineString<f64>>,
    /// Unmasked water index per year
    pub water_index: BTreeMap<i32, Array2<f64>>,
    pub transform: GeoTransform,
    pub crs: CRS,
    /// Geomorphology polygons for the rocky-coast rule
    pub geomorphology: Option<FeatureCollection>,
}

/// Rates of change stage
#[derive(Debug, Clone, Default)]
pub struct RatesOfChange;

impl Algorithm for RatesOfChange {
    type Input = RatesInput;
    type Output = Vec<RatePoint>;
    type Params = RateParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "RatesOfChange"
    }

    fn description(&self) -> &'static str {
        "Regress annual shoreline positions at points along the baseline shoreline"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        rates_of_change(&input, &params)
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Measure, regress and classify points along the baseline-year shoreline.
///
/// # Errors
/// - [`Error::InvalidParameter`] when the baseline year has no shoreline or
///   the spacing is not positive
/// - [`Error::UnsupportedCrs`] when the CRS cannot be projected to lon/lat
pub fn rates_of_change(input: &RatesInput, params: &RateParams) -> Result<Vec<RatePoint>> {
    let baseline = input
        .shorelines
        .get(&params.baseline_year)
        .ok_or_else(|| Error::InvalidParameter {
            name: "baseline_year",
            value: params.baseline_year.to_string(),
            reason: "no shoreline was extracted for this year".into(),
        })?;
    let projection = Projection::from_crs(&input.crs)?;

    let points: Vec<Point<f64>> = sample_along(baseline, params.spacing)?
        .into_iter()
        .map(|p| {
            Point::new(
                round_to(p.x(), params.coordinate_decimals),
                round_to(p.y(), params.coordinate_decimals),
            )
        })
        .collect();
    info!("Measuring {} baseline points against {} years", points.len(), input.shorelines.len());

    let surfaces = AnnualSurfaces {
        shorelines: &input.shorelines,
        water_index: &input.water_index,
        transform: &input.transform,
        projection: &projection,
    };
    let movement_params = MovementParams {
        baseline_year: params.baseline_year,
        max_valid_dist: params.max_valid_dist,
    };
    let movements = annual_movements(&points, surfaces, &movement_params)?;

    let rocky = match &input.geomorphology {
        Some(features) => rocky_coast_flags(&points, &input.crs, features, &params.rocky)?,
        None => vec![false; points.len()],
    };
    debug!("{} points near rocky coast", rocky.iter().filter(|&&r| r).count());

    let stats_params = RateStatsParams {
        initial_year: params.initial_year,
        outliers: params.outliers,
        ..Default::default()
    };

    Ok(points
        .into_iter()
        .zip(movements)
        .zip(rocky)
        .map(|((location, movement), rocky)| {
            let distances: BTreeMap<i32, f64> = movement
                .distances
                .into_iter()
                .map(|(y, d)| (y, round_to(d, params.distance_decimals)))
                .collect();
            let stats = rate_statistics(&distances, &stats_params);
            let bearings: Vec<f64> = movement.bearings.values().copied().collect();
            let angles = circular_mean_std(&bearings, 180.0);

            let facts = PointFacts {
                baseline_outlier: stats.outliers.contains(&params.baseline_year),
                rocky,
                slope: stats.fit.slope,
                angle_std: angles.std,
                valid_obs: stats.valid_obs,
                comparison_years: distances.len(),
            };
            let (lon, lat) = projection.to_lonlat(location.x(), location.y());

            RatePoint {
                location,
                uid: geohash::encode(lon, lat, GEOHASH_PRECISION),
                certainty: classify_point(&facts),
                distances,
                stats,
                angle_mean: angles.mean.round() % 180.0,
                angle_std: angles.std.round(),
            }
        })
        .collect())
}
