//! Raster stage: tide-filtered annual and gapfill composites for one tile

use std::collections::HashMap;

use coastlines_algorithms::composite::{
    select_observation, tide_cutoffs, Composite, Observation, StreamingCompositor, YearBatch, YearComposites,
    COUNT_NODATA,
};
use coastlines_algorithms::tide::{TideAnchor, TideField, TideModel};
use coastlines_core::io::{read_geotiff, write_geotiff, GeoTiffOptions};
use coastlines_core::{Error, GeoBox, Raster, RasterElement};
use coastlines_parallel::TileOutcome;
use ndarray::Array2;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::outputs::{ensure_parent, OutputLayout, Stage, Variable};
use crate::stack::ObservationSource;

/// Tide model and the anchors it can be queried at
#[derive(Clone, Copy)]
pub struct Tides<'a> {
    pub model: &'a dyn TideModel,
    pub anchors: &'a [TideAnchor],
}

/// Build and write the composites of `tile`.
///
/// Skipped when the raster sentinel exists and `overwrite` is off, or when
/// fewer than two tide anchors lie near the tile.
pub fn composite_tile(
    config: &Config,
    layout: &OutputLayout,
    tile: &str,
    source: &dyn ObservationSource,
    tides: Tides<'_>,
) -> Result<TileOutcome> {
    if layout.is_done(Stage::Raster, tile) && !config.output.overwrite {
        return Ok(TileOutcome::Skipped("raster outputs exist".into()));
    }
    let geobox = source.geobox().clone();
    let field = match TideField::new(&geobox, tides.anchors, &config.tide_field_params()) {
        Ok(field) => field,
        Err(Error::InsufficientTideAnchors { found }) => {
            warn!("Tile {}: {} tide anchor(s) near the tile, skipping", tile, found);
            return Ok(TileOutcome::Skipped(format!("{} tide anchors", found)));
        }
        Err(e) => return Err(e.into()),
    };
    layout.clear(Stage::Raster, tile)?;

    let times = source.times();
    let heights = field.model_heights(tides.model, &times)?;
    let coarse: Vec<Array2<f64>> = heights
        .columns()
        .into_iter()
        .map(|h| field.coarse_field(h))
        .collect::<coastlines_core::Result<_>>()?;
    let cutoffs = tide_cutoffs(&coarse, &field, &config.cutoff_params())?;
    let column: HashMap<_, usize> = times.iter().enumerate().map(|(i, &t)| (t, i)).collect();
    info!("Tile {}: {} scenes, {} tide anchors", tile, times.len(), field.anchors().len());

    let (start, end) = (config.raster.start_year, config.raster.end_year);
    let mut compositor = StreamingCompositor::new(geobox.shape(), start, end)?;
    let mut written = 0usize;

    for year in (start - 1)..=(end + 1) {
        let scenes = source.load_year(year)?;
        let mut selected = Vec::with_capacity(scenes.len());
        for scene in scenes {
            let Some(&i) = column.get(&scene.time) else {
                continue;
            };
            let tide_m = field.upsample(&coarse[i])?.mapv(|v| v as f32);
            let obs = Observation {
                time: scene.time,
                water_index: scene.water_index,
                obscured: scene.obscured,
                tide_m,
            };
            selected.push(select_observation(obs, &cutoffs)?);
        }
        debug!("Tile {} year {}: {} observations", tile, year, selected.len());

        if let Some(composites) = compositor.push(YearBatch::new(year, selected))? {
            write_year(layout, tile, &geobox, &composites)?;
            written += 1;
        }
    }
    for composites in compositor.finish()? {
        write_year(layout, tile, &geobox, &composites)?;
        written += 1;
    }

    if written == 0 {
        return Err(Error::NoObservations.into());
    }
    layout.mark_done(Stage::Raster, tile)?;
    info!("Tile {}: wrote composites for {} years", tile, written);
    Ok(TileOutcome::Completed)
}

fn write_year(layout: &OutputLayout, tile: &str, geobox: &GeoBox, composites: &YearComposites) -> Result<()> {
    write_composite(layout, tile, geobox, composites.year, &composites.annual, false)?;
    if let Some(gapfill) = &composites.gapfill {
        write_composite(layout, tile, geobox, composites.year, gapfill, true)?;
    }
    Ok(())
}

fn write_band<T: RasterElement>(
    path: &std::path::Path,
    geobox: &GeoBox,
    data: &Array2<T>,
    nodata: Option<T>,
    options: Option<GeoTiffOptions>,
) -> Result<()> {
    ensure_parent(path)?;
    let mut raster = Raster::from_geobox_array(geobox, data.clone())?;
    raster.set_nodata(nodata);
    write_geotiff(&raster, path, options)?;
    Ok(())
}

/// Write the four bands of one composite
pub fn write_composite(
    layout: &OutputLayout,
    tile: &str,
    geobox: &GeoBox,
    year: i32,
    composite: &Composite,
    gapfill: bool,
) -> Result<()> {
    let path = |v| layout.composite(tile, year, v, gapfill);
    write_band(&path(Variable::WaterIndex), geobox, &composite.water_index, None, None)?;
    write_band(&path(Variable::Stdev), geobox, &composite.stdev, None, None)?;
    write_band(
        &path(Variable::Count),
        geobox,
        &composite.count,
        Some(COUNT_NODATA),
        Some(GeoTiffOptions::int16()),
    )?;
    write_band(&path(Variable::TideM), geobox, &composite.tide_m, None, None)?;
    Ok(())
}

fn read_band<T: RasterElement>(path: &std::path::Path) -> Result<Raster<T>> {
    Ok(read_geotiff(path)?)
}

/// Read one composite back; `None` when the year was never written
pub fn read_composite(
    layout: &OutputLayout,
    tile: &str,
    year: i32,
    gapfill: bool,
) -> Result<Option<(GeoBox, Composite)>> {
    let path = |v| layout.composite(tile, year, v, gapfill);
    let index_path = path(Variable::WaterIndex);
    if !index_path.is_file() {
        return Ok(None);
    }
    let water_index: Raster<f32> = read_band(&index_path)?;
    let geobox = water_index.geobox()?;
    let stdev: Raster<f32> = read_band(&path(Variable::Stdev))?;
    let count: Raster<i16> = read_band(&path(Variable::Count))?;
    let tide_m: Raster<f32> = read_band(&path(Variable::TideM))?;
    for other in [stdev.geobox()?, count.geobox()?, tide_m.geobox()?] {
        geobox.ensure_compatible(&other)?;
    }

    let composite = Composite {
        water_index: water_index.into_array(),
        stdev: stdev.into_array(),
        count: count.into_array(),
        tide_m: tide_m.into_array(),
    };
    Ok(Some((geobox, composite)))
}
