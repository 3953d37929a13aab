//! Vector stage: shorelines, certainty polygons and rates of change for one
//! tile, read from the raster stage's composites

use std::collections::BTreeMap;
use std::path::Path;

use coastlines_algorithms::certainty::{label_shorelines, AerosolOverride};
use coastlines_algorithms::coastal::{
    certainty_polygons, coastal_masks, merge_gapfill, CoastalMasks, CoastalParams, MergedYear,
};
use coastlines_algorithms::rates::{rates_of_change, RatePoint, RatesInput};
use coastlines_algorithms::vectorize::extract_shorelines;
use coastlines_core::io::{read_geojson, read_geotiff, write_geojson};
use coastlines_core::{AttributeValue, Error, Feature, FeatureCollection, GeoBox, Projection, Raster};
use coastlines_parallel::TileOutcome;
use geo::{Centroid, Intersects};
use geo_types::{MultiLineString, MultiPolygon};
use ndarray::Array2;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::grid::Regions;
use crate::outputs::{ensure_parent, OutputLayout, Stage, RATES_LAYER, SHORELINES_LAYER};
use crate::raster::read_composite;

/// Static context shared by every tile of a vector run
pub struct VectorContext<'a> {
    pub config: &'a Config,
    pub layout: &'a OutputLayout,
    pub regions: &'a Regions,
    pub ocean: &'a Raster<u8>,
    pub geomorphology: Option<&'a FeatureCollection>,
}

/// Window of the static ocean raster covering `geobox`.
///
/// The ocean raster must share the stack's CRS and be at the same or a
/// coarser resolution; each stack pixel takes the ocean cell under its
/// centre. Cells outside the ocean raster are land.
pub fn ocean_window(ocean: &Raster<u8>, geobox: &GeoBox) -> Result<Array2<bool>> {
    if let Some(crs) = ocean.crs() {
        crs.ensure_same(&geobox.crs)?;
    }
    let src = ocean.transform();
    let dst = &geobox.transform;
    let tolerance = 1e-9 * dst.pixel_width.abs().max(1.0);
    if src.pixel_width.abs() + tolerance < dst.pixel_width.abs()
        || src.pixel_height.abs() + tolerance < dst.pixel_height.abs()
    {
        return Err(Error::Other(format!(
            "ocean raster pixel size ({}, {}) is finer than the stack ({}, {})",
            src.pixel_width, src.pixel_height, dst.pixel_width, dst.pixel_height
        ))
        .into());
    }
    let (rows, cols) = ocean.shape();

    Ok(Array2::from_shape_fn(geobox.shape(), |(r, c)| {
        let (x, y) = dst.pixel_to_geo(c, r);
        let (col_f, row_f) = src.geo_to_pixel(x, y);
        if !(col_f.is_finite() && row_f.is_finite()) || col_f < 0.0 || row_f < 0.0 {
            return false;
        }
        let (sr, sc) = (row_f.floor() as usize, col_f.floor() as usize);
        sr < rows && sc < cols && ocean.data()[(sr, sc)] != 0
    }))
}

/// Read the ocean raster, failing with [`PipelineError::MissingInput`]
pub fn load_ocean(path: &Path) -> Result<Raster<u8>> {
    if !path.is_file() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }
    Ok(read_geotiff(path)?)
}

/// Read the geomorphology layer when one is configured
pub fn load_geomorphology(path: Option<&Path>) -> Result<Option<FeatureCollection>> {
    match path {
        Some(p) if !p.is_file() => Err(PipelineError::MissingInput(p.to_path_buf())),
        Some(p) => Ok(Some(read_geojson(p)?)),
        None => Ok(None),
    }
}

/// Merge each year's annual composite with its gapfill composite
fn merged_years(ctx: &VectorContext<'_>, tile: &str) -> Result<(GeoBox, Vec<MergedYear>)> {
    let config = ctx.config;
    let max_nodata = CoastalParams::default().max_nodata_count;
    let mut geobox: Option<GeoBox> = None;
    let mut merged = Vec::new();

    for year in config.raster.start_year..=config.raster.end_year {
        let Some((gb, annual)) = read_composite(ctx.layout, tile, year, false)? else {
            debug!("Tile {}: no composite for {}", tile, year);
            continue;
        };
        match &geobox {
            Some(first) => first.ensure_compatible(&gb)?,
            None => geobox = Some(gb),
        }
        let gapfill = read_composite(ctx.layout, tile, year, true)?.map(|(_, c)| c);
        merged.push(merge_gapfill(
            year,
            &annual,
            gapfill.as_ref(),
            config.vector.min_observations,
            max_nodata,
        )?);
    }

    match geobox {
        Some(gb) => Ok((gb, merged)),
        None => Err(PipelineError::MissingInput(ctx.layout.tile_dir(Stage::Raster, tile))),
    }
}

fn shoreline_features(
    ctx: &VectorContext<'_>,
    shorelines: &BTreeMap<i32, MultiLineString<f64>>,
    masks: &CoastalMasks,
    geobox: &GeoBox,
    projection: &Projection,
) -> FeatureCollection {
    let aerosol = AerosolOverride::default();
    let datum = ctx.config.tide_datum();
    let mut fc = FeatureCollection::new(geobox.crs.clone());

    for masked in &masks.years {
        let Some(lines) = shorelines.get(&masked.year) else {
            continue;
        };
        for segment in label_shorelines(masked.year, lines, &masked.certainty, &geobox.transform, projection, &aerosol) {
            let id_primary = segment
                .geometry
                .centroid()
                .map(|c| ctx.regions.id_primary(&c))
                .unwrap_or_default();
            fc.push(
                Feature::new(segment.geometry)
                    .with_property("year", segment.year)
                    .with_property("certainty", segment.certainty)
                    .with_property("tide_datum", datum.as_str())
                    .with_property("id_primary", id_primary),
            );
        }
    }
    fc
}

fn write_certainty(ctx: &VectorContext<'_>, tile: &str, masks: &CoastalMasks, geobox: &GeoBox) -> Result<()> {
    for masked in &masks.years {
        let mut fc = FeatureCollection::new(geobox.crs.clone());
        for (class, polygon) in certainty_polygons(&masked.certainty, &geobox.transform) {
            fc.push(Feature::new(polygon).with_property("certainty", class.label()));
        }
        write_layer(&fc, &ctx.layout.certainty(tile, masked.year))?;
    }
    Ok(())
}

/// Attribute a rate point for output
pub fn rate_feature(point: &RatePoint, id_primary: String) -> Feature {
    let stats = &point.stats;
    let year_or_null = |y: Option<i32>| y.map_or(AttributeValue::Null, AttributeValue::from);
    // Bearings are reported in whole degrees
    let degrees = |v: f64| {
        if v.is_finite() {
            AttributeValue::Int(v.round() as i64)
        } else {
            AttributeValue::Null
        }
    };

    let mut feature = Feature::new(point.location)
        .with_property("uid", point.uid.as_str())
        .with_property("rate_time", stats.fit.slope)
        .with_property("sig_time", stats.fit.p_value)
        .with_property("se_time", stats.fit.stderr)
        .with_property("outl_time", stats.outlier_string())
        .with_property("angle_mean", degrees(point.angle_mean))
        .with_property("angle_std", degrees(point.angle_std))
        .with_property("valid_obs", stats.valid_obs as i64)
        .with_property("valid_span", stats.valid_span as i64)
        .with_property("sce", stats.sce)
        .with_property("nsm", stats.nsm)
        .with_property("max_year", year_or_null(stats.max_year))
        .with_property("min_year", year_or_null(stats.min_year))
        .with_property("certainty", point.certainty);
    for (year, distance) in &point.distances {
        feature.set_property(format!("dist_{}", year), *distance);
    }
    feature.set_property("id_primary", id_primary);
    feature
}

fn write_layer(fc: &FeatureCollection, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    write_geojson(fc, path)?;
    Ok(())
}

/// Build and write the vector layers of `tile`.
///
/// Rate points outside `clip` are dropped. When the baseline year has no
/// shoreline only the shoreline and certainty layers are written.
pub fn vectorize_tile(ctx: &VectorContext<'_>, tile: &str, clip: Option<&MultiPolygon<f64>>) -> Result<TileOutcome> {
    let config = ctx.config;
    if ctx.layout.is_done(Stage::Vector, tile) && !config.output.overwrite {
        return Ok(TileOutcome::Skipped("vector outputs exist".into()));
    }
    ctx.layout.clear(Stage::Vector, tile)?;

    let (geobox, merged) = merged_years(ctx, tile)?;
    let ocean = ocean_window(ctx.ocean, &geobox)?;
    let masks = coastal_masks(&merged, &ocean, &config.coastal_params(geobox.pixel_area()))?;
    let shorelines = extract_shorelines(&masks.years, &geobox.transform, &config.shoreline_params())?;
    let projection = Projection::from_crs(&geobox.crs)?;
    info!("Tile {}: shorelines for {} of {} years", tile, shorelines.len(), masks.years.len());

    let lines = shoreline_features(ctx, &shorelines, &masks, &geobox, &projection);
    write_layer(&lines, &ctx.layout.tile_layer(tile, SHORELINES_LAYER))?;
    write_certainty(ctx, tile, &masks, &geobox)?;

    let input = RatesInput {
        water_index: merged.iter().map(|y| (y.year, y.water_index.clone())).collect(),
        shorelines,
        transform: geobox.transform,
        crs: geobox.crs.clone(),
        geomorphology: ctx.geomorphology.cloned(),
    };
    match rates_of_change(&input, &config.rate_params()) {
        Ok(points) => {
            let mut fc = FeatureCollection::new(geobox.crs.clone());
            for point in points.iter().filter(|p| clip.map_or(true, |c| c.intersects(&p.location))) {
                fc.push(rate_feature(point, ctx.regions.id_primary(&point.location)));
            }
            info!("Tile {}: {} rate of change points", tile, fc.len());
            write_layer(&fc, &ctx.layout.tile_layer(tile, RATES_LAYER))?;
        }
        Err(Error::InvalidParameter { name: "baseline_year", .. }) => {
            warn!(
                "Tile {}: no shoreline in baseline year {}, writing shorelines only",
                tile,
                config.baseline_year()
            );
        }
        Err(e) => return Err(e.into()),
    }

    ctx.layout.mark_done(Stage::Vector, tile)?;
    Ok(TileOutcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coastlines_algorithms::rates::{rate_statistics, RateStatsParams};
    use coastlines_core::{GeoTransform, CRS};

    fn rate_point(angle_mean: f64, angle_std: f64) -> RatePoint {
        let distances: BTreeMap<i32, f64> = (2000..2010).map(|y| (y, (y - 2009) as f64 * -2.0)).collect();
        RatePoint {
            location: geo_types::Point::new(1_500_000.0, -3_900_000.0),
            uid: "r3gx2f".into(),
            stats: rate_statistics(&distances, &RateStatsParams::default()),
            distances,
            angle_mean,
            angle_std,
            certainty: "good",
        }
    }

    #[test]
    fn test_rate_feature_angles_are_integers() {
        let feature = rate_feature(&rate_point(97.0, 4.0), "ABC01".into());
        assert_eq!(feature.get_property("angle_mean"), Some(&AttributeValue::Int(97)));
        assert_eq!(feature.get_property("angle_std"), Some(&AttributeValue::Int(4)));
        assert_eq!(feature.get_property("id_primary"), Some(&AttributeValue::from("ABC01")));
        assert!(feature.get_property("dist_2005").is_some());

        let undefined = rate_feature(&rate_point(f64::NAN, f64::NAN), String::new());
        assert_eq!(undefined.get_property("angle_mean"), Some(&AttributeValue::Null));
    }

    #[test]
    fn test_ocean_window_offsets() {
        let mut ocean: Raster<u8> = Raster::new(20, 20);
        ocean.set_transform(GeoTransform::new(0.0, 600.0, 30.0, -30.0));
        ocean.set_crs(Some(CRS::australian_albers()));
        for c in 10..20 {
            ocean.data_mut().column_mut(c).fill(1);
        }
        // Window starting 5 columns and 2 rows in, running off the east edge
        let geobox = GeoBox::new(GeoTransform::new(150.0, 540.0, 30.0, -30.0), 5, 20, CRS::australian_albers());
        let window = ocean_window(&ocean, &geobox).unwrap();
        assert!(!window[(0, 4)]);
        assert!(window[(0, 5)]);
        assert!(window[(4, 14)]);
        assert!(!window[(0, 15)]);
    }

    #[test]
    fn test_ocean_window_coarser_grid() {
        // 60 m ocean cells, ocean east of x = 300
        let mut ocean: Raster<u8> = Raster::new(10, 10);
        ocean.set_transform(GeoTransform::new(0.0, 600.0, 60.0, -60.0));
        ocean.set_crs(Some(CRS::australian_albers()));
        for c in 5..10 {
            ocean.data_mut().column_mut(c).fill(1);
        }
        let geobox = GeoBox::new(GeoTransform::new(150.0, 540.0, 30.0, -30.0), 4, 20, CRS::australian_albers());
        let window = ocean_window(&ocean, &geobox).unwrap();
        assert_eq!(window.dim(), (4, 20));
        // Pixel centres at x = 285 and x = 315
        assert!(!window[(0, 4)]);
        assert!(window[(0, 5)]);
        assert!(window[(3, 14)]);
        // x = 615 lies past the ocean raster's east edge
        assert!(!window[(0, 15)]);
    }

    #[test]
    fn test_ocean_window_unaligned_grid() {
        let mut ocean: Raster<u8> = Raster::new(10, 10);
        ocean.set_transform(GeoTransform::new(0.0, 300.0, 30.0, -30.0));
        for c in 5..10 {
            ocean.data_mut().column_mut(c).fill(1);
        }
        // Stack origin 10 m off the ocean grid; centres at x = 115, 145, 175, ...
        let geobox = GeoBox::new(GeoTransform::new(100.0, 300.0, 30.0, -30.0), 5, 5, CRS::australian_albers());
        let window = ocean_window(&ocean, &geobox).unwrap();
        assert!(!window[(0, 0)]);
        assert!(!window[(2, 1)]);
        assert!(window[(2, 2)]);
        assert!(window[(4, 4)]);
    }

    #[test]
    fn test_ocean_window_finer_grid_rejected() {
        let mut ocean: Raster<u8> = Raster::new(10, 10);
        ocean.set_transform(GeoTransform::new(0.0, 300.0, 10.0, -10.0));
        let geobox = GeoBox::new(GeoTransform::new(0.0, 300.0, 30.0, -30.0), 5, 5, CRS::australian_albers());
        assert!(ocean_window(&ocean, &geobox).is_err());
    }

    #[test]
    fn test_ocean_window_crs_mismatch() {
        let mut ocean: Raster<u8> = Raster::new(10, 10);
        ocean.set_transform(GeoTransform::new(0.0, 300.0, 30.0, -30.0));
        ocean.set_crs(Some(CRS::wgs84()));
        let geobox = GeoBox::new(GeoTransform::new(0.0, 300.0, 30.0, -30.0), 5, 5, CRS::australian_albers());
        assert!(ocean_window(&ocean, &geobox).is_err());
    }
}
