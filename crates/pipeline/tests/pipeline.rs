//! End-to-end run of the three stages on a synthetic tile.
//!
//! The shoreline retreats 2 m a year over 2000-2004 with the sea to the
//! east. Each year has five scenes, three of them inside the tide band.

use std::fs;
use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use chrono::{DateTime, TimeZone, Utc};
use coastlines_core::io::{read_geojson, read_geotiff, write_geojson, write_geotiff};
use coastlines_core::{Feature, FeatureCollection, GeoBox, GeoTransform, Projection, Raster, CRS};
use coastlines_parallel::{ProcessingMode, TileStatus};
use coastlines_pipeline::{Config, Pipeline, PipelineError};
use geo_types::polygon;
use serde_json::json;

const ROWS: usize = 100;
const COLS: usize = 150;
const TILE: &str = "x0y0";
const TIDES: [f64; 5] = [-1.0, -0.3, 0.0, 0.3, 1.0];

fn geobox() -> GeoBox {
    GeoBox::new(
        GeoTransform::new(-1_500.0, -2_997_000.0, 30.0, -30.0),
        ROWS,
        COLS,
        CRS::australian_albers(),
    )
}

fn edge(year: i32) -> f64 {
    2.0 * (2004 - year) as f64
}

fn scene_times(year: i32) -> Vec<DateTime<Utc>> {
    [1, 3, 5, 7, 9]
        .iter()
        .map(|&m| Utc.with_ymd_and_hms(year, m, 10, 0, 0, 0).unwrap())
        .collect()
}

fn write_stack(dir: &Path) -> PathBuf {
    let gb = geobox();
    let mut scenes = Vec::new();
    for year in 2000..=2004 {
        let index = Raster::from_geobox_array(
            &gb,
            ndarray::Array2::from_shape_fn((ROWS, COLS), |(r, c)| {
                let (x, _) = gb.pixel_centre(c, r);
                ((x - edge(year)) / 300.0) as f32
            }),
        )
        .unwrap();
        let index_path = format!("{}_mndwi.tif", year);
        write_geotiff(&index, dir.join(&index_path), None).unwrap();
        let quality: Raster<u16> = Raster::from_geobox(&gb, 0);
        let quality_path = format!("{}_pq.tif", year);
        write_geotiff(&quality, dir.join(&quality_path), None).unwrap();

        for time in scene_times(year) {
            scenes.push(json!({
                "tile": TILE,
                "time": time.to_rfc3339(),
                "bands": {"mndwi": index_path, "quality": quality_path}
            }));
        }
    }
    let path = dir.join("stack.json");
    fs::write(&path, json!({"products": {"ls_annual": scenes}}).to_string()).unwrap();
    path
}

fn write_tides(dir: &Path) {
    write_tides_at(dir, 3);
}

/// Tide table with anchors at the first `count` tile corners
fn write_tides_at(dir: &Path, count: usize) {
    let gb = geobox();
    let projection = Projection::from_crs(&gb.crs).unwrap();
    let (min_x, min_y, max_x, max_y) = gb.bounds();
    let times: Vec<DateTime<Utc>> = (2000..=2004).flat_map(scene_times).collect();
    let heights: Vec<f64> = (0..times.len()).map(|i| TIDES[i % TIDES.len()]).collect();
    let anchors: Vec<_> = [(min_x, max_y), (max_x, max_y), (min_x, min_y)]
        .iter()
        .take(count)
        .map(|&(x, y)| {
            let (lon, lat) = projection.to_lonlat(x, y);
            json!({"lon": lon, "lat": lat, "heights": heights})
        })
        .collect();
    let tide_dir = dir.join("tides");
    fs::create_dir_all(&tide_dir).unwrap();
    let table = json!({
        "times": times.iter().map(|t| t.to_rfc3339()).collect::<Vec<_>>(),
        "anchors": anchors,
    });
    fs::write(tide_dir.join("tabulated.json"), table.to_string()).unwrap();
}

fn write_static(dir: &Path) {
    let gb = geobox();
    let (min_x, min_y, max_x, max_y) = gb.bounds();
    let mut grid = FeatureCollection::new(CRS::australian_albers());
    grid.push(
        Feature::new(polygon![
            (x: min_x, y: min_y), (x: max_x, y: min_y), (x: max_x, y: max_y), (x: min_x, y: max_y)
        ])
        .with_property("id", TILE),
    );
    write_geojson(&grid, dir.join("grid.geojson")).unwrap();

    let mut ocean: Raster<u8> = Raster::from_geobox(&gb, 0);
    for c in 70..COLS {
        ocean.data_mut().column_mut(c).fill(1);
    }
    write_geotiff(&ocean, dir.join("ocean.tif"), None).unwrap();
}

fn write_config(dir: &Path, radius: f64) -> PathBuf {
    let text = format!(
        r#"
[input]
grid_path = "grid.geojson"
ocean_path = "ocean.tif"

[virtual_product]
path = "stack.json"
name = "ls_annual"

[raster]
start_year = 2000
end_year = 2004

[vector]
baseline_year = 2004
min_observations = 3
river_area_m2 = 90000.0

[continental]
hotspots_radii = [{radius:.1}]

[tide]
model_id = "tabulated"
directory = "tides"

[output]
directory = "out"
"#
    );
    let path = dir.join("coastlines.toml");
    fs::write(&path, text).unwrap();
    path
}

fn setup(dir: &Path) -> Pipeline {
    write_stack(dir);
    write_tides(dir);
    write_static(dir);
    let config = Config::load(write_config(dir, 300.0)).unwrap();
    Pipeline::new(config, ProcessingMode::Sequential)
}

#[test]
fn full_run_produces_every_layer() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = setup(dir.path());
    let layout = pipeline.layout().clone();

    let reports = pipeline.run_raster(&[]).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].status, TileStatus::Completed);
    for year in 2000..=2004 {
        let count: Raster<i16> =
            read_geotiff(layout.composite(TILE, year, coastlines_pipeline::outputs::Variable::Count, false)).unwrap();
        // Only the three scenes inside the tide band are composited
        assert_eq!(count.data()[(50, 50)], 3);
    }
    let tide: Raster<f32> =
        read_geotiff(layout.composite(TILE, 2002, coastlines_pipeline::outputs::Variable::TideM, false)).unwrap();
    assert!(tide.data()[(50, 50)].abs() < 1e-3);

    let reports = pipeline.run_vector(&[]).unwrap();
    assert_eq!(reports[0].status, TileStatus::Completed);

    let shorelines = read_geojson(layout.tile_layer(TILE, "shorelines_annual")).unwrap();
    assert!(!shorelines.is_empty());
    let first = &shorelines.features[0];
    assert_eq!(first.get_property("tide_datum").and_then(|v| v.as_str()), Some("mean = 0 m"));
    assert_eq!(first.get_property("id_primary").and_then(|v| v.as_str()), Some(""));
    assert!(layout.certainty(TILE, 2000).is_file());

    let rates = read_geojson(layout.tile_layer(TILE, "rates_of_change")).unwrap();
    assert!(rates.len() > 50);
    let middle = &rates.features[rates.len() / 2];
    assert_relative_eq!(middle.get_property("rate_time").unwrap().as_f64(), -2.0, epsilon = 1e-6);
    assert_relative_eq!(middle.get_property("dist_2000").unwrap().as_f64(), 8.0, epsilon = 1e-6);
    assert_relative_eq!(middle.get_property("nsm").unwrap().as_f64(), -8.0, epsilon = 1e-6);
    assert_eq!(middle.get_property("certainty").and_then(|v| v.as_str()), Some("good"));
    assert_eq!(middle.get_property("valid_obs").and_then(|v| v.as_i64()), Some(5));

    let summary = pipeline.run_continental(&[]).unwrap();
    assert_eq!(summary.tiles_merged, 1);
    assert!(summary.tiles_missing.is_empty());
    assert_eq!(summary.hotspot_layers, 1);
    let hotspots = read_geojson(layout.hotspots(1)).unwrap();
    assert!(hotspots
        .iter()
        .any(|f| f.get_property("certainty").and_then(|v| v.as_str()) == Some("good")));
}

#[test]
fn sentinels_skip_finished_tiles() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = setup(dir.path());
    assert_eq!(pipeline.run_raster(&[]).unwrap()[0].status, TileStatus::Completed);
    assert!(matches!(
        pipeline.run_raster(&[TILE.to_string()]).unwrap()[0].status,
        TileStatus::Skipped(_)
    ));
}

#[test]
fn single_tide_anchor_skips_the_tile() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = setup(dir.path());
    write_tides_at(dir.path(), 1);
    let reports = pipeline.run_raster(&[]).unwrap();
    assert!(matches!(reports[0].status, TileStatus::Skipped(_)));
    assert!(!reports[0].is_failed());
    assert!(!pipeline.layout().is_done(coastlines_pipeline::outputs::Stage::Raster, TILE));
}

#[test]
fn missing_tide_files_are_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = setup(dir.path());
    fs::remove_dir_all(dir.path().join("tides")).unwrap();
    let err = pipeline.run_raster(&[]).unwrap_err();
    assert!(matches!(err, PipelineError::TideFilesMissing(_)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn vector_without_composites_fails_the_tile_only() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = setup(dir.path());
    let reports = pipeline.run_vector(&[]).unwrap();
    assert!(reports[0].is_failed());
    assert!(matches!(pipeline.run_vector(&["nowhere".to_string()]), Err(PipelineError::UnknownTile(_))));
}
