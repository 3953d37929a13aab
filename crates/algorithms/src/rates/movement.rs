//! Signed distances from baseline points to each year's shoreline
//!
//! For a baseline point `p` and year Y, `q` is the closest point on the
//! year-Y shoreline. The distance ‖p − q‖ is positive when the year-Y
//! shoreline lies ocean-ward of the baseline, judged by comparing the
//! baseline water index at `q` with the year-Y water index at `p`.

use std::collections::BTreeMap;

use coastlines_core::{GeoTransform, Projection, Result};
use geo::{Closest, ClosestPoint};
use geo_types::{MultiLineString, Point};
use ndarray::Array2;

use crate::geodesy::axial_bearing;
use crate::interpolation::bilinear_at_point;
use crate::maybe_rayon::*;

/// Parameters for the movement engine
#[derive(Debug, Clone)]
pub struct MovementParams {
    pub baseline_year: i32,
    /// Distances beyond this (m) are treated as missing
    pub max_valid_dist: f64,
}

impl Default for MovementParams {
    fn default() -> Self {
        Self {
            baseline_year: 2021,
            max_valid_dist: 1200.0,
        }
    }
}

/// Per-year movement of one baseline point
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointMovement {
    /// Signed distance (m), NaN where unknown
    pub distances: BTreeMap<i32, f64>,
    /// Axial bearing p → q in degrees [0, 180), NaN where unknown
    pub bearings: BTreeMap<i32, f64>,
}

/// Annual shorelines and the water index rasters they were traced from
#[derive(Debug, Clone, Copy)]
pub struct AnnualSurfaces<'a> {
    pub shorelines: &'a BTreeMap<i32, MultiLineString<f64>>,
    /// Unmasked water index per year on `transform`
    pub water_index: &'a BTreeMap<i32, Array2<f64>>,
    pub transform: &'a GeoTransform,
    /// Projection of the analysis CRS, for geodesic bearings
    pub projection: &'a Projection,
}

/// Movement of each point for every year that has a shoreline
pub fn annual_movements(
    points: &[Point<f64>],
    surfaces: AnnualSurfaces<'_>,
    params: &MovementParams,
) -> Result<Vec<PointMovement>> {
    let baseline_index = surfaces.water_index.get(&params.baseline_year);

    Ok(points
        .into_par_iter()
        .map(|p| {
            let mut movement = PointMovement::default();
            for (&year, shoreline) in surfaces.shorelines {
                let (distance, bearing) = if year == params.baseline_year {
                    (0.0, f64::NAN)
                } else {
                    measure(p, year, shoreline, baseline_index, surfaces, params)
                };
                movement.distances.insert(year, distance);
                movement.bearings.insert(year, bearing);
            }
            movement
        })
        .collect())
}

fn measure(
    p: &Point<f64>,
    year: i32,
    shoreline: &MultiLineString<f64>,
    baseline_index: Option<&Array2<f64>>,
    surfaces: AnnualSurfaces<'_>,
    params: &MovementParams,
) -> (f64, f64) {
    let missing = (f64::NAN, f64::NAN);
    let q = match shoreline.closest_point(p) {
        Closest::Intersection(q) | Closest::SinglePoint(q) => q,
        Closest::Indeterminate => return missing,
    };
    let raw = ((p.x() - q.x()).powi(2) + (p.y() - q.y()).powi(2)).sqrt();
    if raw.is_nan() || raw > params.max_valid_dist {
        return missing;
    }

    let (Some(baseline), Some(current)) = (baseline_index, surfaces.water_index.get(&year)) else {
        return missing;
    };
    let at_q = bilinear_at_point(baseline, surfaces.transform, q.x(), q.y());
    let at_p = bilinear_at_point(current, surfaces.transform, p.x(), p.y());
    if at_q.is_nan() || at_p.is_nan() {
        return missing;
    }
    let sign = if at_q > at_p { 1.0 } else { -1.0 };

    let (lon1, lat1) = surfaces.projection.to_lonlat(p.x(), p.y());
    let (lon2, lat2) = surfaces.projection.to_lonlat(q.x(), q.y());
    (sign * raw, axial_bearing(lon1, lat1, lon2, lat2))
}
