//! Pipeline configuration
//!
//! One TOML file drives every stage. Relative paths are resolved against the
//! directory holding the file. [`Config::load`] validates before returning,
//! and the stage parameter structs are built from the validated record.

use std::fs;
use std::path::{Path, PathBuf};

use coastlines_algorithms::certainty::RockyParams;
use coastlines_algorithms::coastal::{CertaintyParams, CoastalParams};
use coastlines_algorithms::composite::CutoffParams;
use coastlines_algorithms::hotspots::HotspotParams;
use coastlines_algorithms::rates::RateParams;
use coastlines_algorithms::statistics::OutlierParams;
use coastlines_algorithms::tide::TideFieldParams;
use coastlines_algorithms::vectorize::ShorelineParams;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Static inputs shared by every tile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// GeoJSON analysis grid; each polygon carries an `id` attribute
    pub grid_path: PathBuf,
    /// Boolean ocean raster (non-zero = ocean) on the stack grid
    pub ocean_path: PathBuf,
    /// GeoJSON geomorphology polygons for the rocky-coast rule
    #[serde(default)]
    pub geomorphology_path: Option<PathBuf>,
    /// GeoJSON region polygons carrying an `id_primary` attribute
    #[serde(default)]
    pub region_attributes_path: Option<PathBuf>,
}

/// Observation stack selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualProductConfig {
    /// JSON manifest of products
    pub path: PathBuf,
    /// Product to read from the manifest
    pub name: String,
    /// Band used as the water index
    #[serde(default = "default_water_index")]
    pub water_index: String,
}

fn default_water_index() -> String {
    "mndwi".to_string()
}

/// Raster (compositing) stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterConfig {
    pub start_year: i32,
    pub end_year: i32,
    /// Tide height the tide band is centred on (m)
    #[serde(default)]
    pub tide_centre: f64,
    #[serde(default = "default_buffer_fraction")]
    pub tide_buffer_fraction: f64,
    #[serde(default = "default_coarsen_factor")]
    pub coarsen_factor: usize,
    /// Buffer around the tile when selecting tide anchors (degrees)
    #[serde(default = "default_anchor_buffer")]
    pub anchor_buffer: f64,
}

fn default_buffer_fraction() -> f64 {
    0.25
}

fn default_coarsen_factor() -> usize {
    50
}

fn default_anchor_buffer() -> f64 {
    0.05
}

/// Vector (shoreline and rates) stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    pub baseline_year: Option<i32>,
    /// First year of the all-time statistics; the start year when unset
    pub initial_year: Option<i32>,
    pub index_threshold: f64,
    pub buffer_pixels: usize,
    pub max_valid_dist: f64,
    pub spacing: f64,
    pub min_vertices: usize,
    pub min_observations: usize,
    pub river_area_m2: f64,
    pub outlier_threshold: f64,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            baseline_year: None,
            initial_year: None,
            index_threshold: 0.0,
            buffer_pixels: 33,
            max_valid_dist: 1200.0,
            spacing: 30.0,
            min_vertices: 10,
            min_observations: 5,
            river_area_m2: 5_000_000.0,
            outlier_threshold: 3.5,
        }
    }
}

/// Continental (merge and hotspots) stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinentalConfig {
    pub hotspots_radii: Vec<f64>,
}

impl Default for ContinentalConfig {
    fn default() -> Self {
        Self {
            hotspots_radii: vec![10_000.0, 5_000.0, 1_000.0],
        }
    }
}

/// Tide model location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TideConfig {
    pub model_id: String,
    pub directory: PathBuf,
}

/// Output location and behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// Re-run stages whose sentinel already exists
    #[serde(default)]
    pub overwrite: bool,
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub input: InputConfig,
    pub virtual_product: VirtualProductConfig,
    pub raster: RasterConfig,
    #[serde(default)]
    pub vector: VectorConfig,
    #[serde(default)]
    pub continental: ContinentalConfig,
    pub tide: TideConfig,
    pub output: OutputConfig,
}

fn invalid(msg: impl Into<String>) -> PipelineError {
    PipelineError::Config(msg.into())
}

impl Config {
    /// Read, resolve and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|_| PipelineError::MissingInput(path.to_path_buf()))?;
        let mut config: Config = toml::from_str(&text)?;
        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.input.grid_path);
        resolve(&mut self.input.ocean_path);
        if let Some(p) = self.input.geomorphology_path.as_mut() {
            resolve(p);
        }
        if let Some(p) = self.input.region_attributes_path.as_mut() {
            resolve(p);
        }
        resolve(&mut self.virtual_product.path);
        resolve(&mut self.tide.directory);
        resolve(&mut self.output.directory);
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        let r = &self.raster;
        if r.start_year > r.end_year {
            return Err(invalid(format!("start_year {} is after end_year {}", r.start_year, r.end_year)));
        }
        let baseline = self.baseline_year();
        if !(r.start_year..=r.end_year).contains(&baseline) {
            return Err(invalid(format!(
                "baseline_year {} is outside {}..={}",
                baseline, r.start_year, r.end_year
            )));
        }
        if r.coarsen_factor == 0 {
            return Err(invalid("coarsen_factor must be at least 1"));
        }
        if !(r.tide_centre.is_finite() && r.tide_buffer_fraction >= 0.0) {
            return Err(invalid("tide_centre must be finite and tide_buffer_fraction non-negative"));
        }

        let v = &self.vector;
        if !v.index_threshold.is_finite() {
            return Err(invalid("index_threshold must be finite"));
        }
        if v.buffer_pixels == 0 {
            return Err(invalid("buffer_pixels must be positive"));
        }
        if !(v.spacing > 0.0 && v.max_valid_dist > 0.0) {
            return Err(invalid("spacing and max_valid_dist must be positive"));
        }
        if self.continental.hotspots_radii.is_empty() || self.continental.hotspots_radii.iter().any(|&x| !(x > 0.0)) {
            return Err(invalid("hotspots_radii must be a non-empty list of positive radii"));
        }
        if self.virtual_product.name.is_empty() || self.virtual_product.water_index.is_empty() {
            return Err(invalid("virtual_product name and water_index must be set"));
        }
        Ok(())
    }

    /// Baseline year; the end year when unset
    pub fn baseline_year(&self) -> i32 {
        self.vector.baseline_year.unwrap_or(self.raster.end_year)
    }

    pub fn initial_year(&self) -> i32 {
        self.vector.initial_year.unwrap_or(self.raster.start_year)
    }

    /// Datum attribute stored on shorelines
    pub fn tide_datum(&self) -> String {
        format!("mean = {} m", self.raster.tide_centre)
    }

    pub fn tide_field_params(&self) -> TideFieldParams {
        TideFieldParams {
            coarsen_factor: self.raster.coarsen_factor,
            anchor_buffer: self.raster.anchor_buffer,
        }
    }

    pub fn cutoff_params(&self) -> CutoffParams {
        CutoffParams {
            tide_centre: self.raster.tide_centre,
            buffer_fraction: self.raster.tide_buffer_fraction,
        }
    }

    /// Coastal masking parameters for rasters with `pixel_area_m2` pixels
    pub fn coastal_params(&self, pixel_area_m2: f64) -> CoastalParams {
        let v = &self.vector;
        CoastalParams {
            index_threshold: v.index_threshold,
            min_observations: v.min_observations,
            buffer_pixels: v.buffer_pixels,
            certainty: CertaintyParams {
                min_observations: v.min_observations,
                ..Default::default()
            },
            ..Default::default()
        }
        .with_river_min_area(v.river_area_m2, pixel_area_m2)
    }

    pub fn shoreline_params(&self) -> ShorelineParams {
        ShorelineParams {
            index_threshold: self.vector.index_threshold,
            min_vertices: self.vector.min_vertices,
        }
    }

    pub fn rate_params(&self) -> RateParams {
        RateParams {
            baseline_year: self.baseline_year(),
            initial_year: self.initial_year(),
            spacing: self.vector.spacing,
            max_valid_dist: self.vector.max_valid_dist,
            outliers: OutlierParams {
                threshold: self.vector.outlier_threshold,
            },
            rocky: RockyParams::default(),
            ..Default::default()
        }
    }

    pub fn hotspot_params(&self) -> HotspotParams {
        HotspotParams {
            radii: self.continental.hotspots_radii.clone(),
            initial_year: self.initial_year(),
            outliers: OutlierParams {
                threshold: self.vector.outlier_threshold,
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[input]
grid_path = "grid.geojson"
ocean_path = "/data/ocean.tif"

[virtual_product]
path = "stack.json"
name = "ls_annual"

[raster]
start_year = 2000
end_year = 2020

[tide]
model_id = "FES2014"
directory = "tides"

[output]
directory = "out"
"#;

    fn write(dir: &Path, text: &str) -> PathBuf {
        let path = dir.join("coastlines.toml");
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_defaults_and_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(write(dir.path(), MINIMAL)).unwrap();
        assert_eq!(config.baseline_year(), 2020);
        assert_eq!(config.initial_year(), 2000);
        assert_eq!(config.virtual_product.water_index, "mndwi");
        assert_eq!(config.vector.buffer_pixels, 33);
        assert_eq!(config.continental.hotspots_radii, vec![10_000.0, 5_000.0, 1_000.0]);
        assert_eq!(config.input.grid_path, dir.path().join("grid.geojson"));
        assert_eq!(config.input.ocean_path, PathBuf::from("/data/ocean.tif"));
        assert_eq!(config.tide_datum(), "mean = 0 m");
        // 5 km² of 30 m pixels
        assert_eq!(config.coastal_params(900.0).river_min_area_px, 5556);
    }

    #[test]
    fn test_baseline_outside_years_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let text = format!("{}\n[vector]\nbaseline_year = 2021\n", MINIMAL);
        let err = Config::load(write(dir.path(), &text)).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_bad_radii_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let text = format!("{}\n[continental]\nhotspots_radii = [1000.0, -5.0]\n", MINIMAL);
        assert!(Config::load(write(dir.path(), &text)).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::load("/nonexistent/coastlines.toml"),
            Err(PipelineError::MissingInput(_))
        ));
    }
}
