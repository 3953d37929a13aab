//! Continental stage: merge tile layers and aggregate hotspots

use std::collections::BTreeMap;

use coastlines_algorithms::hotspots::{hotspots, HotspotPoint, SourcePoint};
use coastlines_core::io::{read_geojson, write_geojson};
use coastlines_core::{AttributeValue, Error, Feature, FeatureCollection};
use geo_types::{Geometry, LineString, MultiLineString};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::outputs::{ensure_parent, OutputLayout, RATES_LAYER, SHORELINES_LAYER};

/// What a continental run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContinentalSummary {
    pub tiles_merged: usize,
    /// Tiles without vector outputs, left out of the merge
    pub tiles_missing: Vec<String>,
    pub shorelines: usize,
    pub rate_points: usize,
    pub hotspot_layers: usize,
}

/// Concatenate `layer` over `tiles`; tiles without the layer are skipped
fn merge_layer(layout: &OutputLayout, tiles: &[String], layer: &str) -> Result<(FeatureCollection, Vec<String>)> {
    let mut merged = FeatureCollection::default();
    let mut missing = Vec::new();
    for tile in tiles {
        let path = layout.tile_layer(tile, layer);
        if !path.is_file() {
            missing.push(tile.clone());
            continue;
        }
        merged.extend_from(read_geojson(&path)?)?;
    }
    Ok((merged, missing))
}

fn baseline_lines(shorelines: &FeatureCollection, year: i32) -> MultiLineString<f64> {
    let mut lines: Vec<LineString<f64>> = Vec::new();
    for feature in shorelines.iter() {
        if feature.get_property("year").and_then(AttributeValue::as_i64) != Some(year as i64) {
            continue;
        }
        match &feature.geometry {
            Some(Geometry::LineString(l)) => lines.push(l.clone()),
            Some(Geometry::MultiLineString(ml)) => lines.extend(ml.0.iter().cloned()),
            _ => {}
        }
    }
    MultiLineString::new(lines)
}

/// Rebuild hotspot inputs from written rate-of-change features
pub fn source_points(rates: &FeatureCollection) -> Vec<SourcePoint> {
    rates
        .iter()
        .filter_map(|f| {
            let Some(Geometry::Point(location)) = f.geometry else {
                return None;
            };
            let distances: BTreeMap<i32, f64> = f
                .properties
                .iter()
                .filter_map(|(k, v)| k.strip_prefix("dist_")?.parse().ok().map(|y| (y, v.as_f64())))
                .collect();
            let certainty = f.get_property("certainty")?.as_str()?.to_string();
            Some(SourcePoint {
                location,
                distances,
                certainty,
            })
        })
        .collect()
}

fn hotspot_feature(point: &HotspotPoint) -> Feature {
    let stats = &point.stats;
    let year_or_null = |y: Option<i32>| y.map_or(AttributeValue::Null, AttributeValue::from);
    let mut feature = Feature::new(point.location)
        .with_property("uid", point.uid.as_str())
        .with_property("rate_time", stats.fit.slope)
        .with_property("sig_time", stats.fit.p_value)
        .with_property("se_time", stats.fit.stderr)
        .with_property("outl_time", stats.outlier_string())
        .with_property("valid_obs", stats.valid_obs as i64)
        .with_property("valid_span", stats.valid_span as i64)
        .with_property("sce", stats.sce)
        .with_property("nsm", stats.nsm)
        .with_property("max_year", year_or_null(stats.max_year))
        .with_property("min_year", year_or_null(stats.min_year))
        .with_property("n", point.n as i64)
        .with_property("radius", point.radius)
        .with_property("certainty", point.certainty);
    for (year, distance) in &point.distances {
        feature.set_property(format!("dist_{}", year), *distance);
    }
    feature
}

fn write_layer(fc: &FeatureCollection, path: &std::path::Path) -> Result<()> {
    ensure_parent(path)?;
    write_geojson(fc, path)?;
    Ok(())
}

/// Merge the vector layers of `tiles` and write hotspot layers, one per
/// configured radius.
///
/// Hotspots are skipped with a warning when no tile has a baseline-year
/// shoreline or rate points.
pub fn merge_continental(config: &Config, layout: &OutputLayout, tiles: &[String]) -> Result<ContinentalSummary> {
    let (shorelines, missing) = merge_layer(layout, tiles, SHORELINES_LAYER)?;
    let (rates, _) = merge_layer(layout, tiles, RATES_LAYER)?;
    for tile in &missing {
        warn!("Tile {} has no vector outputs, left out of the merge", tile);
    }

    let mut summary = ContinentalSummary {
        tiles_merged: tiles.len() - missing.len(),
        tiles_missing: missing,
        shorelines: shorelines.len(),
        rate_points: rates.len(),
        hotspot_layers: 0,
    };
    write_layer(&shorelines, &layout.continental(SHORELINES_LAYER))?;
    write_layer(&rates, &layout.continental(RATES_LAYER))?;
    info!("Merged {} shorelines and {} rate points from {} tiles", summary.shorelines, summary.rate_points, summary.tiles_merged);

    let baseline = baseline_lines(&shorelines, config.baseline_year());
    let points = source_points(&rates);
    if baseline.0.is_empty() || points.is_empty() {
        warn!("No baseline shorelines or rate points, skipping hotspots");
        return Ok(summary);
    }
    let crs = rates
        .crs
        .clone()
        .ok_or_else(|| Error::UnsupportedCrs("merged rate points carry no CRS".into()))?;

    let layers = hotspots(&baseline, &points, &crs, &config.hotspot_params())?;
    for (i, layer) in layers.iter().enumerate() {
        let mut fc = FeatureCollection::new(crs.clone());
        for point in &layer.points {
            fc.push(hotspot_feature(point));
        }
        write_layer(&fc, &layout.hotspots(i + 1))?;
        info!("Hotspots at {} m: {} points", layer.radius, fc.len());
    }
    summary.hotspot_layers = layers.len();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coastlines_core::CRS;
    use geo_types::Point;

    #[test]
    fn test_source_points_from_features() {
        let mut fc = FeatureCollection::new(CRS::australian_albers());
        fc.push(
            Feature::new(Point::new(10.0, 20.0))
                .with_property("uid", "r3gx2f9tt5k")
                .with_property("dist_2000", 12.5)
                .with_property("dist_2001", AttributeValue::Null)
                .with_property("certainty", "good"),
        );
        fc.push(Feature::new(Point::new(0.0, 0.0)).with_property("dist_2000", 1.0));
        let points = source_points(&fc);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].distances[&2000], 12.5);
        assert!(points[0].distances[&2001].is_nan());
        assert_eq!(points[0].certainty, "good");
    }

    #[test]
    fn test_missing_tiles_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path(), "mndwi");
        let (fc, missing) = merge_layer(&layout, &["a".to_string(), "b".to_string()], SHORELINES_LAYER).unwrap();
        assert!(fc.is_empty());
        assert_eq!(missing, vec!["a".to_string(), "b".to_string()]);
    }
}
