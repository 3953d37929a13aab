//! Rate point certainty rules

use coastlines_core::{FeatureCollection, Result, CRS};
use geo::{Closest, ClosestPoint, Intersects};
use geo_types::{Geometry, Point};

use crate::maybe_rayon::*;

/// Label of a point no rule applies to
pub const GOOD: &str = "good";

/// Facts about a rate point that certainty rules inspect
#[derive(Debug, Clone, PartialEq)]
pub struct PointFacts {
    /// The baseline year was flagged as an outlier
    pub baseline_outlier: bool,
    /// A rocky-coast polygon lies nearby
    pub rocky: bool,
    /// Regression slope (m/yr)
    pub slope: f64,
    /// Circular standard deviation of bearings (degrees)
    pub angle_std: f64,
    pub valid_obs: usize,
    /// Number of years distances were measured for
    pub comparison_years: usize,
}

/// A predicate and the label it assigns
#[derive(Debug, Clone, Copy)]
pub struct CertaintyRule {
    pub label: &'static str,
    pub applies: fn(&PointFacts) -> bool,
}

fn baseline_outlier(f: &PointFacts) -> bool {
    f.baseline_outlier
}

fn rocky(f: &PointFacts) -> bool {
    f.rocky
}

fn extreme_slope(f: &PointFacts) -> bool {
    f.slope.abs() > 50.0
}

fn angular_variability(f: &PointFacts) -> bool {
    f.angle_std > 30.0
}

fn insufficient_observations(f: &PointFacts) -> bool {
    (f.valid_obs as f64) < 0.75 * f.comparison_years as f64
}

/// Rules in precedence order; the last one that applies wins
pub const POINT_CERTAINTY_RULES: [CertaintyRule; 5] = [
    CertaintyRule {
        label: "baseline outlier",
        applies: baseline_outlier,
    },
    CertaintyRule {
        label: "likely rocky coastline",
        applies: rocky,
    },
    CertaintyRule {
        label: "extreme value (> 50 m)",
        applies: extreme_slope,
    },
    CertaintyRule {
        label: "high angular variability",
        applies: angular_variability,
    },
    CertaintyRule {
        label: "insufficient observations",
        applies: insufficient_observations,
    },
];

/// Certainty label of a point
pub fn classify_point(facts: &PointFacts) -> &'static str {
    POINT_CERTAINTY_RULES
        .iter()
        .rev()
        .find(|rule| (rule.applies)(facts))
        .map_or(GOOD, |rule| rule.label)
}

/// Which geomorphology features count as rocky coast
#[derive(Debug, Clone)]
pub struct RockyParams {
    pub class_field: String,
    pub class_value: String,
    pub probability_field: String,
    /// Minimum class probability (exclusive)
    pub min_probability: f64,
    /// Search distance around each point (m)
    pub max_distance: f64,
}

impl Default for RockyParams {
    fn default() -> Self {
        Self {
            class_field: "Preds".into(),
            class_value: "Bedrock".into(),
            probability_field: "Probs".into(),
            min_probability: 0.75,
            max_distance: 300.0,
        }
    }
}

/// Distance from `p` to `geometry`; zero inside polygons
fn distance_to(geometry: &Geometry<f64>, p: &Point<f64>) -> Option<f64> {
    if geometry.intersects(p) {
        return Some(0.0);
    }
    match geometry.closest_point(p) {
        Closest::Intersection(_) => Some(0.0),
        Closest::SinglePoint(q) => Some((p.x() - q.x()).hypot(p.y() - q.y())),
        Closest::Indeterminate => None,
    }
}

/// Flag points whose nearest geomorphology feature lies within
/// `max_distance` and is rocky.
///
/// Only the single nearest feature is consulted; a rocky polygon further
/// away than some other feature does not flag the point. Ties go to the
/// first feature in the collection.
///
/// # Errors
/// [`coastlines_core::Error::CrsMismatch`] when the features are not in the
/// points' CRS.
pub fn rocky_coast_flags(
    points: &[Point<f64>],
    crs: &CRS,
    geomorphology: &FeatureCollection,
    params: &RockyParams,
) -> Result<Vec<bool>> {
    if let Some(features_crs) = &geomorphology.crs {
        crs.ensure_same(features_crs)?;
    }

    let candidates: Vec<(&Geometry<f64>, bool)> = geomorphology
        .iter()
        .filter_map(|f| {
            let is_rocky = f.get_property(&params.class_field).and_then(|v| v.as_str())
                == Some(params.class_value.as_str())
                && f.get_property(&params.probability_field)
                    .map_or(false, |v| v.as_f64() > params.min_probability);
            f.geometry.as_ref().map(|g| (g, is_rocky))
        })
        .collect();

    Ok(points
        .into_par_iter()
        .map(|p| {
            candidates
                .iter()
                .filter_map(|&(g, is_rocky)| distance_to(g, p).map(|d| (d, is_rocky)))
                .filter(|&(d, _)| d <= params.max_distance)
                .fold(None::<(f64, bool)>, |best, cand| match best {
                    Some(b) if b.0 <= cand.0 => Some(b),
                    _ => Some(cand),
                })
                .map_or(false, |(_, is_rocky)| is_rocky)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coastlines_core::{AttributeValue, Feature};
    use geo_types::polygon;

    fn facts() -> PointFacts {
        PointFacts {
            baseline_outlier: false,
            rocky: false,
            slope: -1.0,
            angle_std: 5.0,
            valid_obs: 21,
            comparison_years: 21,
        }
    }

    #[test]
    fn test_default_is_good() {
        assert_eq!(classify_point(&facts()), GOOD);
    }

    #[test]
    fn test_last_rule_wins() {
        let mut f = facts();
        f.rocky = true;
        f.slope = 75.0;
        assert_eq!(classify_point(&f), "extreme value (> 50 m)");
        f.valid_obs = 12;
        assert_eq!(classify_point(&f), "insufficient observations");
        // 0.75 · 21 = 15.75
        f.valid_obs = 15;
        assert_eq!(classify_point(&f), "insufficient observations");
        f.valid_obs = 16;
        assert_eq!(classify_point(&f), "extreme value (> 50 m)");
    }

    #[test]
    fn test_deterministic() {
        let mut f = facts();
        f.baseline_outlier = true;
        f.angle_std = 45.0;
        let first = classify_point(&f);
        assert_eq!(first, "high angular variability");
        assert_eq!(classify_point(&f), first);
    }

    fn geomorphology(class: &str, prob: f64) -> FeatureCollection {
        let poly = polygon![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 100.0), (x: 0.0, y: 100.0)];
        let mut fc = FeatureCollection::new(CRS::australian_albers());
        fc.push(
            Feature::new(Geometry::Polygon(poly))
                .with_property("Preds", AttributeValue::from(class))
                .with_property("Probs", AttributeValue::from(prob)),
        );
        fc
    }

    #[test]
    fn test_rocky_within_distance() {
        let points = [Point::new(50.0, 50.0), Point::new(350.0, 50.0), Point::new(450.0, 50.0)];
        let flags = rocky_coast_flags(
            &points,
            &CRS::australian_albers(),
            &geomorphology("Bedrock", 0.9),
            &RockyParams::default(),
        )
        .unwrap();
        assert_eq!(flags, vec![true, true, false]);

        let sandy = rocky_coast_flags(
            &points,
            &CRS::australian_albers(),
            &geomorphology("Sandy", 0.9),
            &RockyParams::default(),
        )
        .unwrap();
        assert!(sandy.iter().all(|&f| !f));

        let unsure = rocky_coast_flags(
            &points,
            &CRS::australian_albers(),
            &geomorphology("Bedrock", 0.6),
            &RockyParams::default(),
        )
        .unwrap();
        assert!(unsure.iter().all(|&f| !f));
    }

    #[test]
    fn test_nearest_feature_decides() {
        let sandy = polygon![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 100.0), (x: 0.0, y: 100.0)];
        let bedrock = polygon![(x: 350.0, y: 0.0), (x: 450.0, y: 0.0), (x: 450.0, y: 100.0), (x: 350.0, y: 100.0)];
        let mut fc = FeatureCollection::new(CRS::australian_albers());
        fc.push(
            Feature::new(Geometry::Polygon(bedrock))
                .with_property("Preds", AttributeValue::from("Bedrock"))
                .with_property("Probs", AttributeValue::from(0.95)),
        );
        fc.push(
            Feature::new(Geometry::Polygon(sandy))
                .with_property("Preds", AttributeValue::from("Sandy"))
                .with_property("Probs", AttributeValue::from(0.95)),
        );

        // 10 m from the sandy polygon, 240 m from the bedrock one
        let points = [Point::new(110.0, 50.0), Point::new(340.0, 50.0), Point::new(700.0, 50.0)];
        let flags = rocky_coast_flags(&points, &CRS::australian_albers(), &fc, &RockyParams::default()).unwrap();
        assert_eq!(flags, vec![false, true, true]);
    }

    #[test]
    fn test_rocky_crs_mismatch() {
        let err = rocky_coast_flags(&[], &CRS::wgs84(), &geomorphology("Bedrock", 0.9), &RockyParams::default());
        assert!(err.is_err());
    }
}
