//! # Coastlines Pipeline
//!
//! Configuration, data adapters and stage orchestration.
//!
//! A run is three stages over the tiles of an analysis grid:
//! - **raster**: tide-filtered annual and gapfill composites per tile
//! - **vector**: shorelines, certainty polygons and rates of change per tile
//! - **continental**: merged layers and hotspot aggregates
//!
//! Tiles run independently; a failing tile is reported and the rest carry on.

pub mod config;
pub mod continental;
pub mod error;
pub mod grid;
pub mod outputs;
pub mod raster;
pub mod stack;
pub mod tides;
pub mod vector;

pub use config::Config;
pub use continental::ContinentalSummary;
pub use error::{PipelineError, Result};
pub use outputs::OutputLayout;

use coastlines_parallel::{run_tiles, ProcessingMode, TileReport};
use tracing::info;

use crate::grid::{Grid, Regions};
use crate::raster::{composite_tile, Tides};
use crate::stack::ManifestStack;
use crate::tides::TabulatedTideModel;
use crate::vector::{load_geomorphology, load_ocean, vectorize_tile, VectorContext};

/// Entry point holding the validated configuration
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
    layout: OutputLayout,
    mode: ProcessingMode,
}

impl Pipeline {
    pub fn new(config: Config, mode: ProcessingMode) -> Self {
        let layout = OutputLayout::new(&config.output.directory, &config.virtual_product.water_index);
        Self { config, layout, mode }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    fn grid(&self) -> Result<Grid> {
        Grid::load(&self.config.input.grid_path)
    }

    /// Requested tile ids, or every grid tile when none are given
    pub fn tile_ids(&self, requested: &[String]) -> Result<Vec<String>> {
        let grid = self.grid()?;
        Ok(grid.select(requested)?.into_iter().map(|t| t.id.clone()).collect())
    }

    /// Composite every requested tile.
    ///
    /// The tide model is opened once up front, so missing tide files fail the
    /// whole run rather than each tile.
    pub fn run_raster(&self, tiles: &[String]) -> Result<Vec<TileReport>> {
        let ids = self.tile_ids(tiles)?;
        let model = TabulatedTideModel::open(&self.config.tide.directory, &self.config.tide.model_id)?;
        let anchors = model.anchors();
        let vp = &self.config.virtual_product;
        info!("Raster stage: {} tiles, tide model {}", ids.len(), model.model_id());

        Ok(run_tiles(self.mode, &ids, |tile| {
            let stack = ManifestStack::open(&vp.path, &vp.name, tile, &vp.water_index)?;
            let tides = Tides {
                model: &model,
                anchors: &anchors,
            };
            composite_tile(&self.config, &self.layout, tile, &stack, tides)
        }))
    }

    /// Vectorise every requested tile from its composites
    pub fn run_vector(&self, tiles: &[String]) -> Result<Vec<TileReport>> {
        let grid = self.grid()?;
        let ids: Vec<String> = grid.select(tiles)?.into_iter().map(|t| t.id.clone()).collect();
        let input = &self.config.input;
        let ocean = load_ocean(&input.ocean_path)?;
        let geomorphology = load_geomorphology(input.geomorphology_path.as_deref())?;
        let regions = Regions::load_optional(input.region_attributes_path.as_deref())?;
        let ctx = VectorContext {
            config: &self.config,
            layout: &self.layout,
            regions: &regions,
            ocean: &ocean,
            geomorphology: geomorphology.as_ref(),
        };
        info!("Vector stage: {} tiles", ids.len());

        Ok(run_tiles(self.mode, &ids, |tile| {
            let extent = &grid.tile(tile)?.extent;
            vectorize_tile(&ctx, tile, Some(extent))
        }))
    }

    /// Merge tile layers and aggregate hotspots
    pub fn run_continental(&self, tiles: &[String]) -> Result<ContinentalSummary> {
        let ids = self.tile_ids(tiles)?;
        continental::merge_continental(&self.config, &self.layout, &ids)
    }
}
