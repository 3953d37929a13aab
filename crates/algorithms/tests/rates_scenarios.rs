//! End-to-end rate-of-change scenarios on synthetic coastlines.
//!
//! Each year's water index rises eastward and crosses zero at that year's
//! shoreline, so the sea lies east and seaward movement is +x. The grid sits
//! on the Albers central meridian, where grid east is true east.

use std::collections::BTreeMap;

use approx::assert_relative_eq;
use coastlines_algorithms::coastal::{coastal_masks, CoastalParams, MaskedYear, MergedYear};
use coastlines_algorithms::rates::{rates_of_change, RateParams, RatePoint, RatesInput};
use coastlines_algorithms::vectorize::{extract_shorelines, ShorelineParams};
use coastlines_core::{AttributeValue, Feature, FeatureCollection, GeoTransform, CRS};
use geo_types::{polygon, Geometry};
use ndarray::Array2;

const ROWS: usize = 100;
const COLS: usize = 150;

fn transform() -> GeoTransform {
    GeoTransform::new(-1_500.0, -2_997_000.0, 30.0, -30.0)
}

fn water_index(edge_x: f64) -> Array2<f64> {
    let t = transform();
    Array2::from_shape_fn((ROWS, COLS), |(r, c)| {
        let (x, _) = t.pixel_to_geo(c, r);
        (x - edge_x) / 300.0
    })
}

fn surfaces(edges: &BTreeMap<i32, f64>) -> BTreeMap<i32, Array2<f64>> {
    edges.iter().map(|(&y, &e)| (y, water_index(e))).collect()
}

fn params(baseline_year: i32, initial_year: i32) -> RateParams {
    RateParams {
        baseline_year,
        initial_year,
        ..Default::default()
    }
}

/// Trace shorelines from unmasked surfaces and measure rates
fn run(edges: &BTreeMap<i32, f64>, params: &RateParams, geomorphology: Option<FeatureCollection>) -> Vec<RatePoint> {
    let index = surfaces(edges);
    let masked: Vec<MaskedYear> = index
        .iter()
        .map(|(&year, wi)| MaskedYear {
            year,
            water_index: wi.clone(),
            certainty: Array2::zeros((ROWS, COLS)),
        })
        .collect();
    let shorelines = extract_shorelines(&masked, &transform(), &ShorelineParams::default()).unwrap();
    let input = RatesInput {
        shorelines,
        water_index: index,
        transform: transform(),
        crs: CRS::australian_albers(),
        geomorphology,
    };
    rates_of_change(&input, params).unwrap()
}

/// A point away from the line ends
fn middle(points: &[RatePoint]) -> &RatePoint {
    &points[points.len() / 2]
}

#[test]
fn stable_shoreline() {
    let edges: BTreeMap<i32, f64> = (2000..=2020).map(|y| (y, 0.0)).collect();
    let points = run(&edges, &params(2020, 2000), None);
    assert!(!points.is_empty());
    for p in &points {
        assert_relative_eq!(p.stats.fit.slope, 0.0);
        assert_relative_eq!(p.stats.sce, 0.0);
        assert_relative_eq!(p.stats.nsm, 0.0);
        assert_eq!(p.stats.valid_obs, 21);
        assert_eq!(p.certainty, "good");
    }
}

#[test]
fn linear_retreat() {
    // Earlier shorelines lie 2 m further seaward per year
    let edges: BTreeMap<i32, f64> = (2000..=2020).map(|y| (y, 2.0 * (2020 - y) as f64)).collect();
    let points = run(&edges, &params(2020, 2000), None);
    let p = middle(&points);
    assert_relative_eq!(p.distances[&2000], 40.0, epsilon = 1e-6);
    assert_relative_eq!(p.distances[&2020], 0.0);
    assert_relative_eq!(p.stats.fit.slope, -2.0);
    assert_relative_eq!(p.stats.nsm, -40.0, epsilon = 1e-6);
    assert_relative_eq!(p.stats.sce, 40.0, epsilon = 1e-6);
    assert_eq!(p.stats.valid_span, 21);
    assert!(p.stats.fit.p_value < 0.01);
    // Movement is east-west
    assert!((p.angle_mean - 90.0).abs() <= 1.0);
    assert_eq!(p.certainty, "good");
}

#[test]
fn noisy_year_is_reported_as_outlier() {
    let jitter = |y: i32| 0.3 * ((y * 7) % 5) as f64;
    let edges: BTreeMap<i32, f64> = (2000..=2020)
        .map(|y| (y, if y == 2007 { 180.0 } else { jitter(y) }))
        .collect();
    let points = run(&edges, &params(2020, 2000), None);
    let p = middle(&points);
    assert_eq!(p.stats.outlier_string(), "2007");
    assert_eq!(p.stats.valid_obs, 20);
    assert!(p.stats.fit.slope.abs() < 0.2);
    assert_eq!(p.certainty, "good");
}

#[test]
fn insufficient_observations() {
    // Eight years have shorelines beyond the valid search distance
    let edges: BTreeMap<i32, f64> = (2000..=2020)
        .map(|y| (y, if (2001..=2008).contains(&y) { 1_500.0 } else { 0.0 }))
        .collect();
    let points = run(&edges, &params(2020, 2000), None);
    let p = middle(&points);
    assert!(p.distances[&2004].is_nan());
    assert_eq!(p.stats.valid_obs, 13);
    assert_eq!(p.certainty, "insufficient observations");
}

#[test]
fn extreme_slope() {
    let edges: BTreeMap<i32, f64> = (2010..=2020).map(|y| (y, 75.0 * (2020 - y) as f64)).collect();
    let points = run(&edges, &params(2020, 2010), None);
    let p = middle(&points);
    assert_relative_eq!(p.stats.fit.slope, -75.0);
    assert_eq!(p.certainty, "extreme value (> 50 m)");
}

#[test]
fn rocky_coast() {
    let edges: BTreeMap<i32, f64> = (2000..=2020).map(|y| (y, 0.0)).collect();
    let rock = |probability: f64| {
        let poly = polygon![
            (x: 100.0, y: -2_998_000.0),
            (x: 200.0, y: -2_998_000.0),
            (x: 200.0, y: -2_999_000.0),
            (x: 100.0, y: -2_999_000.0),
        ];
        let mut rocks = FeatureCollection::new(CRS::australian_albers());
        rocks.push(
            Feature::new(Geometry::Polygon(poly))
                .with_property("Preds", AttributeValue::String("Bedrock".into()))
                .with_property("Probs", AttributeValue::float(probability)),
        );
        rocks
    };

    let points = run(&edges, &params(2020, 2000), Some(rock(0.9)));
    assert_eq!(middle(&points).certainty, "likely rocky coastline");
    // Points far beyond the 300 m search distance are unaffected
    assert_eq!(points[0].certainty, "good");

    let points = run(&edges, &params(2020, 2000), Some(rock(0.5)));
    assert_eq!(middle(&points).certainty, "good");
}

#[test]
fn coastal_masks_feed_shorelines() {
    let t = transform();
    let years: Vec<MergedYear> = (2000..=2010)
        .map(|y| MergedYear {
            year: y,
            water_index: water_index(2.0 * (2010 - y) as f64),
            stdev: Array2::from_elem((ROWS, COLS), 0.05),
            count: Array2::from_elem((ROWS, COLS), 20.0),
        })
        .collect();
    let ocean = Array2::from_shape_fn((ROWS, COLS), |(_, c)| c >= 70);
    let coastal = CoastalParams {
        river_min_area_px: 100,
        ..Default::default()
    };
    let masks = coastal_masks(&years, &ocean, &coastal).unwrap();
    assert_eq!(masks.years.len(), 11);
    // Far inland is outside the analysis area
    assert!(masks.years[0].water_index[(50, 0)].is_nan());

    let shorelines = extract_shorelines(&masks.years, &t, &ShorelineParams::default()).unwrap();
    assert_eq!(shorelines.len(), 11);
    let input = RatesInput {
        shorelines,
        water_index: years.iter().map(|y| (y.year, y.water_index.clone())).collect(),
        transform: t,
        crs: CRS::australian_albers(),
        geomorphology: None,
    };
    let points = rates_of_change(&input, &params(2010, 2000)).unwrap();
    let p = middle(&points);
    assert_relative_eq!(p.stats.fit.slope, -2.0);
    assert_relative_eq!(p.distances[&2000], 20.0, epsilon = 1e-6);
}
