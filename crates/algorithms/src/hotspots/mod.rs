//! Hotspots: rates of change summarised over neighbourhoods of a given radius
//!
//! Points are placed along the baseline shoreline at half the radius. Each
//! one pools the annual distances of the `good` rate points within the
//! radius (per-year median) and regresses the pooled series.

mod index;

pub use index::PointIndex;

use std::collections::{BTreeMap, BTreeSet};

use coastlines_core::{Algorithm, Error, Projection, Result, CRS};
use geo_types::{MultiLineString, Point};
use tracing::{debug, info};

use crate::certainty::GOOD;
use crate::geodesy::geohash;
use crate::maybe_rayon::*;
use crate::rates::{rate_statistics, sample_along, RatePoint, RateStats, RateStatsParams, GEOHASH_PRECISION};
use crate::statistics::{nan_median, OutlierParams};

/// Label of a hotspot drawing on too few rate points
pub const INSUFFICIENT_POINTS: &str = "insufficient points";

/// Rate point attributes hotspots draw on
#[derive(Debug, Clone)]
pub struct SourcePoint {
    pub location: Point<f64>,
    pub distances: BTreeMap<i32, f64>,
    pub certainty: String,
}

impl From<&RatePoint> for SourcePoint {
    fn from(p: &RatePoint) -> Self {
        Self {
            location: p.location,
            distances: p.distances.clone(),
            certainty: p.certainty.to_string(),
        }
    }
}

/// Parameters for hotspot aggregation
#[derive(Debug, Clone)]
pub struct HotspotParams {
    /// Neighbourhood radii (m), one output layer each
    pub radii: Vec<f64>,
    pub initial_year: i32,
    pub outliers: OutlierParams,
    /// Decimal places of hotspot coordinates in the analysis CRS
    pub coordinate_decimals: i32,
    /// Decimal places of pooled distances
    pub distance_decimals: i32,
}

impl Default for HotspotParams {
    fn default() -> Self {
        Self {
            radii: vec![10_000.0, 5_000.0, 1_000.0],
            initial_year: 1988,
            outliers: OutlierParams::default(),
            coordinate_decimals: 2,
            distance_decimals: 2,
        }
    }
}

impl HotspotParams {
    pub fn validate(&self) -> Result<()> {
        if self.radii.is_empty() {
            return Err(Error::InvalidParameter {
                name: "radii",
                value: "[]".into(),
                reason: "at least one radius is required".into(),
            });
        }
        if let Some(r) = self.radii.iter().find(|r| !(r.is_finite() && **r > 0.0)) {
            return Err(Error::InvalidParameter {
                name: "radii",
                value: r.to_string(),
                reason: "radii must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Aggregate statistics around one point on the baseline shoreline
#[derive(Debug, Clone)]
pub struct HotspotPoint {
    pub radius: f64,
    pub location: Point<f64>,
    pub uid: String,
    /// Per-year median distance of the pooled rate points
    pub distances: BTreeMap<i32, f64>,
    pub stats: RateStats,
    /// Number of pooled rate points
    pub n: usize,
    pub certainty: &'static str,
}

/// Hotspots of a single radius
#[derive(Debug, Clone)]
pub struct HotspotLayer {
    pub radius: f64,
    pub points: Vec<HotspotPoint>,
}

/// Baseline shoreline and rate points of the whole study area
#[derive(Debug, Clone)]
pub struct HotspotInput {
    pub baseline: MultiLineString<f64>,
    pub points: Vec<SourcePoint>,
    pub crs: CRS,
}

/// Hotspot aggregation stage
#[derive(Debug, Clone, Default)]
pub struct Hotspots;

impl Algorithm for Hotspots {
    type Input = HotspotInput;
    type Output = Vec<HotspotLayer>;
    type Params = HotspotParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Hotspots"
    }

    fn description(&self) -> &'static str {
        "Summarise rates of change over shoreline neighbourhoods"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        hotspots(&input.baseline, &input.points, &input.crs, &params)
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// One layer of hotspots per radius, in the order given.
///
/// Only rate points labelled `good` are pooled. A hotspot pooling fewer than
/// `radius / 30` points is labelled `insufficient points`.
pub fn hotspots(
    baseline: &MultiLineString<f64>,
    points: &[SourcePoint],
    crs: &CRS,
    params: &HotspotParams,
) -> Result<Vec<HotspotLayer>> {
    params.validate()?;
    let projection = Projection::from_crs(crs)?;

    let good: Vec<&SourcePoint> = points.iter().filter(|p| p.certainty == GOOD).collect();
    let locations: Vec<Point<f64>> = good.iter().map(|p| p.location).collect();
    let index = PointIndex::build(&locations);
    info!("Hotspots from {} good rate points of {}", good.len(), points.len());

    let stats_params = RateStatsParams {
        initial_year: params.initial_year,
        outliers: params.outliers,
        ..Default::default()
    };

    params
        .radii
        .iter()
        .map(|&radius| {
            let samples = sample_along(baseline, radius / 2.0)?;
            let points: Vec<HotspotPoint> = samples
                .into_par_iter()
                .map(|s| {
                    let location = Point::new(
                        round_to(s.x(), params.coordinate_decimals),
                        round_to(s.y(), params.coordinate_decimals),
                    );
                    let pooled: Vec<&SourcePoint> = index
                        .within_radius(location.x(), location.y(), radius)
                        .into_iter()
                        .map(|i| good[i])
                        .collect();
                    let distances = pooled_medians(&pooled, params.distance_decimals);
                    let n = pooled.len();
                    let (lon, lat) = projection.to_lonlat(location.x(), location.y());
                    HotspotPoint {
                        radius,
                        location,
                        uid: geohash::encode(lon, lat, GEOHASH_PRECISION),
                        stats: rate_statistics(&distances, &stats_params),
                        distances,
                        n,
                        certainty: if (n as f64) < radius / 30.0 { INSUFFICIENT_POINTS } else { GOOD },
                    }
                })
                .collect();
            debug!("Radius {} m: {} hotspots", radius, points.len());
            Ok(HotspotLayer { radius, points })
        })
        .collect()
}

/// Median distance per year over the pooled points
fn pooled_medians(pooled: &[&SourcePoint], decimals: i32) -> BTreeMap<i32, f64> {
    let years: BTreeSet<i32> = pooled.iter().flat_map(|p| p.distances.keys().copied()).collect();
    years
        .into_iter()
        .map(|year| {
            let values: Vec<f64> = pooled
                .iter()
                .map(|p| p.distances.get(&year).copied().unwrap_or(f64::NAN))
                .collect();
            (year, round_to(nan_median(&values), decimals))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::line_string;

    fn source(x: f64, slope: f64, certainty: &str) -> SourcePoint {
        SourcePoint {
            location: Point::new(x, -3_000_000.0),
            distances: (2000..=2010).map(|y| (y, slope * (y - 2010) as f64)).collect(),
            certainty: certainty.into(),
        }
    }

    fn baseline() -> MultiLineString<f64> {
        MultiLineString::new(vec![line_string![(x: 0.0, y: -3_000_000.0), (x: 3_000.0, y: -3_000_000.0)]])
    }

    fn params(radius: f64) -> HotspotParams {
        HotspotParams {
            radii: vec![radius],
            initial_year: 2000,
            ..Default::default()
        }
    }

    #[test]
    fn test_counts_and_certainty() {
        // Rate points every 30 m; a 300 m radius pools 21 of them mid-line
        let points: Vec<SourcePoint> = (0..=100).map(|i| source(i as f64 * 30.0, -1.0, GOOD)).collect();
        let layers = hotspots(&baseline(), &points, &CRS::australian_albers(), &params(300.0)).unwrap();
        assert_eq!(layers.len(), 1);
        let layer = &layers[0];
        // Samples every 150 m along 3 km
        assert_eq!(layer.points.len(), 21);

        let mid = &layer.points[10];
        assert_eq!(mid.n, 21);
        assert_eq!(mid.certainty, GOOD);
        assert_relative_eq!(mid.stats.fit.slope, -1.0);
        // End points see half a neighbourhood, still at least 300 / 30
        assert_eq!(layer.points[0].n, 11);
        assert_eq!(layer.points[0].certainty, GOOD);
    }

    #[test]
    fn test_only_good_points_pooled() {
        let mut points: Vec<SourcePoint> = (0..=100).map(|i| source(i as f64 * 30.0, -1.0, GOOD)).collect();
        for p in points.iter_mut().skip(40).take(30) {
            p.certainty = "extreme value (> 50 m)".into();
            p.distances.values_mut().for_each(|d| *d *= 100.0);
        }
        let layers = hotspots(&baseline(), &points, &CRS::australian_albers(), &params(300.0)).unwrap();
        let centre = &layers[0].points[10];
        assert_eq!(centre.n, 0);
        assert_eq!(centre.certainty, INSUFFICIENT_POINTS);
        assert!(centre.stats.fit.slope.is_nan());
        assert_eq!(layers[0].points[0].stats.fit.slope, -1.0);
    }

    #[test]
    fn test_invalid_radius() {
        assert!(hotspots(&baseline(), &[], &CRS::australian_albers(), &params(0.0)).is_err());
    }
}
