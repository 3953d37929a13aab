//! Observation stack adapter
//!
//! Scenes are listed in a JSON manifest:
//!
//! ```json
//! {
//!   "products": {
//!     "ls_annual": [
//!       { "tile": "x12y34", "time": "2000-01-05T00:00:00Z",
//!         "bands": { "mndwi": "2000/a_mndwi.tif", "quality": "2000/a_pq.tif" } }
//!     ]
//!   }
//! }
//! ```
//!
//! Band paths are relative to the manifest. A non-zero quality pixel is
//! cloud, shadow or snow and marks the water index as obscured.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Utc};
use coastlines_core::io::read_geotiff;
use coastlines_core::{GeoBox, Raster};
use ndarray::{Array2, Zip};
use serde::Deserialize;
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Band holding the pixel-quality flags
pub const QUALITY_BAND: &str = "quality";

/// One acquisition loaded from the stack
#[derive(Debug, Clone)]
pub struct Scene {
    pub time: DateTime<Utc>,
    /// Water index, NaN where the source is nodata
    pub water_index: Array2<f32>,
    pub obscured: Array2<bool>,
}

/// A time-ordered stack of scenes over one tile
pub trait ObservationSource {
    fn geobox(&self) -> &GeoBox;

    /// Acquisition instants, ascending
    fn times(&self) -> Vec<DateTime<Utc>>;

    /// Every scene acquired during `year`, ascending in time
    fn load_year(&self, year: i32) -> Result<Vec<Scene>>;
}

#[derive(Debug, Deserialize)]
struct Manifest {
    products: BTreeMap<String, Vec<ManifestScene>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ManifestScene {
    tile: String,
    time: DateTime<Utc>,
    bands: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Clone)]
struct SceneEntry {
    time: DateTime<Utc>,
    water_index: PathBuf,
    quality: PathBuf,
}

/// [`ObservationSource`] backed by a scene manifest and GeoTIFF bands
#[derive(Debug, Clone)]
pub struct ManifestStack {
    geobox: GeoBox,
    scenes: Vec<SceneEntry>,
}

impl ManifestStack {
    /// Open the scenes of `product` covering `tile`.
    ///
    /// The footprint is taken from the first scene's water-index band.
    pub fn open<P: AsRef<Path>>(manifest_path: P, product: &str, tile: &str, water_index: &str) -> Result<Self> {
        let manifest_path = manifest_path.as_ref();
        let text = fs::read_to_string(manifest_path)
            .map_err(|_| PipelineError::MissingInput(manifest_path.to_path_buf()))?;
        let manifest: Manifest = serde_json::from_str(&text)?;
        let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));

        let listed = manifest
            .products
            .get(product)
            .ok_or_else(|| PipelineError::Manifest(format!("product '{}' is not listed", product)))?;

        let mut scenes = Vec::new();
        for scene in listed.iter().filter(|s| s.tile == tile) {
            let band = |name: &str| {
                scene.bands.get(name).map(|p| base.join(p)).ok_or_else(|| {
                    PipelineError::Manifest(format!("scene {} of tile {} has no '{}' band", scene.time, tile, name))
                })
            };
            scenes.push(SceneEntry {
                time: scene.time,
                water_index: band(water_index)?,
                quality: band(QUALITY_BAND)?,
            });
        }
        if scenes.is_empty() {
            return Err(coastlines_core::Error::NoObservations.into());
        }
        scenes.sort_by_key(|s| s.time);

        let first: Raster<f32> = read_geotiff(&scenes[0].water_index)?;
        let geobox = first.geobox()?;
        debug!("Stack {} / {}: {} scenes on {:?}", product, tile, scenes.len(), geobox.shape());

        Ok(Self { geobox, scenes })
    }

    fn load(&self, entry: &SceneEntry) -> Result<Scene> {
        let index: Raster<f32> = read_geotiff(&entry.water_index)?;
        self.geobox.ensure_compatible(&index.geobox()?)?;
        let quality: Raster<u16> = read_geotiff(&entry.quality)?;
        self.geobox.ensure_compatible(&quality.geobox()?)?;

        let nodata = index.nodata();
        let water_index = index.data().mapv(|v| if v.is_nan() || Some(v) == nodata { f32::NAN } else { v });
        let mut obscured = Array2::from_elem(water_index.dim(), false);
        Zip::from(&mut obscured).and(quality.data()).for_each(|o, &q| *o = q != 0);

        Ok(Scene {
            time: entry.time,
            water_index,
            obscured,
        })
    }
}

impl ObservationSource for ManifestStack {
    fn geobox(&self) -> &GeoBox {
        &self.geobox
    }

    fn times(&self) -> Vec<DateTime<Utc>> {
        self.scenes.iter().map(|s| s.time).collect()
    }

    fn load_year(&self, year: i32) -> Result<Vec<Scene>> {
        self.scenes
            .iter()
            .filter(|s| s.time.year() == year)
            .map(|s| self.load(s))
            .collect()
    }
}
