//! Output layout and stage sentinels
//!
//! ```text
//! {out}/raster/{tile}/{year}_{variable}{suffix}.tif
//! {out}/raster/{tile}/.raster_done
//! {out}/vector/{tile}/shorelines_annual.geojson
//! {out}/vector/{tile}/rates_of_change.geojson
//! {out}/vector/{tile}/certainty_{year}.geojson
//! {out}/vector/{tile}/.vector_done
//! {out}/continental/{shorelines_annual,rates_of_change,hotspots_zoom_N}.geojson
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const SHORELINES_LAYER: &str = "shorelines_annual";
pub const RATES_LAYER: &str = "rates_of_change";
pub const GAPFILL_SUFFIX: &str = "_gapfill";

/// Per-pixel composite variables, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    /// The configured water index (e.g. `mndwi`)
    WaterIndex,
    Stdev,
    Count,
    TideM,
}

impl Variable {
    pub const ALL: [Variable; 4] = [Variable::WaterIndex, Variable::Stdev, Variable::Count, Variable::TideM];

    pub fn file_stem<'a>(&self, water_index: &'a str) -> &'a str {
        match self {
            Variable::WaterIndex => water_index,
            Variable::Stdev => "stdev",
            Variable::Count => "count",
            Variable::TideM => "tide_m",
        }
    }
}

/// Stage whose completion is recorded with a sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Raster,
    Vector,
}

impl Stage {
    fn dir(&self) -> &'static str {
        match self {
            Stage::Raster => "raster",
            Stage::Vector => "vector",
        }
    }
}

/// Paths of every pipeline output under one root
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    water_index: String,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, water_index: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            water_index: water_index.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tile_dir(&self, stage: Stage, tile: &str) -> PathBuf {
        self.root.join(stage.dir()).join(tile)
    }

    pub fn composite(&self, tile: &str, year: i32, variable: Variable, gapfill: bool) -> PathBuf {
        let suffix = if gapfill { GAPFILL_SUFFIX } else { "" };
        self.tile_dir(Stage::Raster, tile)
            .join(format!("{}_{}{}.tif", year, variable.file_stem(&self.water_index), suffix))
    }

    pub fn tile_layer(&self, tile: &str, layer: &str) -> PathBuf {
        self.tile_dir(Stage::Vector, tile).join(format!("{}.geojson", layer))
    }

    pub fn certainty(&self, tile: &str, year: i32) -> PathBuf {
        self.tile_layer(tile, &format!("certainty_{}", year))
    }

    pub fn continental(&self, layer: &str) -> PathBuf {
        self.root.join("continental").join(format!("{}.geojson", layer))
    }

    /// Hotspot layer for the `index`th radius, counted from 1
    pub fn hotspots(&self, index: usize) -> PathBuf {
        self.continental(&format!("hotspots_zoom_{}", index))
    }

    pub fn sentinel(&self, stage: Stage, tile: &str) -> PathBuf {
        self.tile_dir(stage, tile).join(format!(".{}_done", stage.dir()))
    }

    pub fn is_done(&self, stage: Stage, tile: &str) -> bool {
        self.sentinel(stage, tile).is_file()
    }

    /// Record a finished stage with an empty sentinel file
    pub fn mark_done(&self, stage: Stage, tile: &str) -> Result<()> {
        let path = self.sentinel(stage, tile);
        ensure_parent(&path)?;
        fs::write(path, b"")?;
        Ok(())
    }

    /// Remove a sentinel before a stage re-runs
    pub fn clear(&self, stage: Stage, tile: &str) -> Result<()> {
        let path = self.sentinel(stage, tile);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Create the parent directory of `path`
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = OutputLayout::new("/out", "mndwi");
        assert_eq!(
            layout.composite("x1y1", 2005, Variable::WaterIndex, false),
            PathBuf::from("/out/raster/x1y1/2005_mndwi.tif")
        );
        assert_eq!(
            layout.composite("x1y1", 2005, Variable::Count, true),
            PathBuf::from("/out/raster/x1y1/2005_count_gapfill.tif")
        );
        assert_eq!(
            layout.certainty("x1y1", 1999),
            PathBuf::from("/out/vector/x1y1/certainty_1999.geojson")
        );
        assert_eq!(layout.hotspots(2), PathBuf::from("/out/continental/hotspots_zoom_2.geojson"));
    }

    #[test]
    fn test_sentinel_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path(), "mndwi");
        assert!(!layout.is_done(Stage::Vector, "t"));
        layout.mark_done(Stage::Vector, "t").unwrap();
        assert!(layout.is_done(Stage::Vector, "t"));
        assert_eq!(fs::metadata(layout.sentinel(Stage::Vector, "t")).unwrap().len(), 0);
        assert!(!layout.is_done(Stage::Raster, "t"));
        layout.clear(Stage::Vector, "t").unwrap();
        assert!(!layout.is_done(Stage::Vector, "t"));
    }
}
