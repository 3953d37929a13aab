//! Coastal masking of merged annual composites
//!
//! Restricts each year's water index to the pixels where a shoreline can
//! meaningfully be traced: near the all-time coastline, connected to the
//! open ocean, away from rivers, and on land that persists between
//! consecutive years. Each year also gets a pixel certainty raster.

mod certainty;
mod merge;
mod ocean;
mod rivers;
mod temporal;

pub use certainty::{certainty_classes, certainty_polygons, CertaintyClass, CertaintyParams};
pub use merge::{merge_gapfill, MergedYear};
pub use ocean::{ocean_connected, ocean_seeds};
pub use rivers::{river_masks, RiverMasks};
pub use temporal::{all_time_land, land_mask, temporal_contiguity};

use coastlines_core::{Algorithm, Error, Result};
use ndarray::{Array2, Zip};
use tracing::{debug, info};

use crate::morphology::{boundary, dilate, StructuringElement};

/// Fraction of observed years a pixel must be land to count as all-time land
pub const ALL_TIME_LAND_FRACTION: f64 = 0.5;

/// Parameters for coastal masking
#[derive(Debug, Clone)]
pub struct CoastalParams {
    /// Water index separating land (below) from water
    pub index_threshold: f64,
    /// Annual count below which the gapfill composite is used
    pub min_observations: usize,
    /// Merged counts at or below this are nodata
    pub max_nodata_count: usize,
    /// Land components smaller than this are treated as water when finding
    /// rivers (5 km² at 30 m pixels by default)
    pub river_min_area_px: usize,
    /// Disk radius of the river black-top-hat
    pub river_radius: usize,
    /// Erosion of the static ocean raster, in pixels
    pub ocean_erosion: usize,
    /// Dilation of ocean-connected water, in pixels
    pub ocean_dilation: usize,
    /// Half-width of the coastal buffer, in pixels
    pub buffer_pixels: usize,
    pub certainty: CertaintyParams,
}

impl Default for CoastalParams {
    fn default() -> Self {
        Self {
            index_threshold: 0.0,
            min_observations: 5,
            max_nodata_count: 1,
            river_min_area_px: 5556,
            river_radius: 5,
            ocean_erosion: 10,
            ocean_dilation: 3,
            buffer_pixels: 33,
            certainty: CertaintyParams::default(),
        }
    }
}

impl CoastalParams {
    /// Set the river sieve area from square metres and the pixel area
    pub fn with_river_min_area(mut self, area_m2: f64, pixel_area_m2: f64) -> Self {
        if pixel_area_m2 > 0.0 {
            self.river_min_area_px = (area_m2 / pixel_area_m2).ceil() as usize;
        }
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.index_threshold.is_finite() {
            return Err(Error::InvalidParameter {
                name: "index_threshold",
                value: self.index_threshold.to_string(),
                reason: "must be finite".into(),
            });
        }
        if self.buffer_pixels == 0 {
            return Err(Error::InvalidParameter {
                name: "buffer_pixels",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.river_radius == 0 {
            return Err(Error::InvalidParameter {
                name: "river_radius",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Masked water index and certainty classes of one year
#[derive(Debug, Clone)]
pub struct MaskedYear {
    pub year: i32,
    /// Merged water index inside the analysis area, NaN elsewhere
    pub water_index: Array2<f64>,
    /// [`CertaintyClass`] codes
    pub certainty: Array2<u8>,
}

/// Output of the coastal masker
#[derive(Debug, Clone)]
pub struct CoastalMasks {
    pub years: Vec<MaskedYear>,
    pub all_time_land: Array2<bool>,
    pub rivers: Array2<bool>,
    pub coastal_buffer: Array2<bool>,
}

/// Input of the coastal masker: consecutive merged years and the static
/// ocean raster on the same grid
#[derive(Debug, Clone)]
pub struct CoastalInput {
    pub years: Vec<MergedYear>,
    pub ocean: Array2<bool>,
}

/// Coastal masking stage
#[derive(Debug, Clone, Default)]
pub struct CoastalMasker;

impl Algorithm for CoastalMasker {
    type Input = CoastalInput;
    type Output = CoastalMasks;
    type Params = CoastalParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "CoastalMasker"
    }

    fn description(&self) -> &'static str {
        "Restrict annual water index composites to ocean-connected coastal pixels"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        coastal_masks(&input.years, &input.ocean, &params)
    }
}

/// Mask every year of a sorted series of merged composites; years missing
/// from the series count as having no land
pub fn coastal_masks(years: &[MergedYear], ocean: &Array2<bool>, params: &CoastalParams) -> Result<CoastalMasks> {
    params.validate()?;
    let Some(first) = years.first() else {
        return Err(Error::NoObservations);
    };
    let shape = first.shape();
    for dim in years.iter().map(|y| y.shape()).chain(std::iter::once(ocean.dim())) {
        if dim != shape {
            return Err(Error::SizeMismatch {
                er: shape.0,
                ec: shape.1,
                ar: dim.0,
                ac: dim.1,
            });
        }
    }

    let land: Vec<Array2<bool>> = years
        .iter()
        .map(|y| land_mask(&y.water_index, params.index_threshold))
        .collect();
    let valid: Vec<Array2<bool>> = years.iter().map(|y| y.water_index.mapv(f64::is_finite)).collect();
    let year_labels: Vec<i32> = years.iter().map(|y| y.year).collect();
    let contiguous = temporal_contiguity(&year_labels, &land);

    let all_time = all_time_land(&contiguous, &valid, ALL_TIME_LAND_FRACTION);
    let RiverMasks { land: sieved, rivers } = river_masks(&all_time, params.river_min_area_px, params.river_radius)?;

    let filled = Zip::from(&sieved).and(&rivers).map_collect(|&l, &r| l || r);
    let coastal_buffer = dilate(&boundary(&filled), &StructuringElement::Disk(params.buffer_pixels))?;
    let seeds = ocean_seeds(ocean, params.ocean_erosion)?;
    debug!(
        rivers = rivers.iter().filter(|&&r| r).count(),
        buffer = coastal_buffer.iter().filter(|&&b| b).count(),
        "static coastal masks"
    );

    let mut out = Vec::with_capacity(years.len());
    for (i, merged) in years.iter().enumerate() {
        let water = Zip::from(&valid[i])
            .and(&land[i])
            .and(&rivers)
            .map_collect(|&v, &l, &r| v && !l && !r);
        let ocean_ok = ocean_connected(&water, &seeds, params.ocean_dilation)?;

        let mut water_index = merged.water_index.clone();
        Zip::from(&mut water_index)
            .and(&land[i])
            .and(&contiguous[i])
            .and(&ocean_ok)
            .and(&coastal_buffer)
            .and(&rivers)
            .for_each(|w, &l, &kept, &o, &b, &r| {
                let temporal_ok = !l || kept;
                if !(temporal_ok && o && b && !r) {
                    *w = f64::NAN;
                }
            });

        let certainty = certainty_classes(merged, &params.certainty)?;
        out.push(MaskedYear {
            year: merged.year,
            water_index,
            certainty,
        });
    }

    info!(years = out.len(), "coastal masks complete");
    Ok(CoastalMasks {
        years: out,
        all_time_land: all_time,
        rivers,
        coastal_buffer,
    })
}
