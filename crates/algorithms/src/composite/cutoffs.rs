//! Per-pixel tide cutoffs

use coastlines_core::{Error, Result};
use ndarray::{Array2, Zip};

use super::{Observation, SelectedObservation};
use crate::tide::TideField;

/// Parameters for the tide band
#[derive(Debug, Clone)]
pub struct CutoffParams {
    /// Tide height the band is centred on (m)
    pub tide_centre: f64,
    /// Half-width of the band as a fraction of the local tide range
    pub buffer_fraction: f64,
}

impl Default for CutoffParams {
    fn default() -> Self {
        Self {
            tide_centre: 0.0,
            buffer_fraction: 0.25,
        }
    }
}

/// Lower and upper tide limits at stack resolution
#[derive(Debug, Clone)]
pub struct TideCutoffs {
    pub low: Array2<f32>,
    pub high: Array2<f32>,
}

/// Compute tide cutoffs from the coarse tide fields of every timestep.
///
/// The band is `tide_centre ± buffer_fraction · (max − min)` where min and max
/// are taken per coarse cell over all timesteps, then bilinearly resampled to
/// the stack geobox. Cells without any modelled tide get NaN limits, which
/// exclude every observation.
pub fn tide_cutoffs(coarse_fields: &[Array2<f64>], field: &TideField, params: &CutoffParams) -> Result<TideCutoffs> {
    if params.buffer_fraction.is_nan() || params.buffer_fraction < 0.0 {
        return Err(Error::InvalidParameter {
            name: "buffer_fraction",
            value: params.buffer_fraction.to_string(),
            reason: "must be non-negative".into(),
        });
    }
    let shape = field.coarse_geobox().shape();
    if coarse_fields.iter().any(|f| f.dim() != shape) {
        return Err(Error::Algorithm("coarse tide field does not match the coarse grid".into()));
    }

    let mut min = Array2::from_elem(shape, f64::INFINITY);
    let mut max = Array2::from_elem(shape, f64::NEG_INFINITY);
    for f in coarse_fields {
        Zip::from(&mut min).and(&mut max).and(f).for_each(|lo, hi, &v| {
            if v.is_finite() {
                *lo = lo.min(v);
                *hi = hi.max(v);
            }
        });
    }

    let buffer = Zip::from(&min)
        .and(&max)
        .map_collect(|&lo, &hi| if lo <= hi { params.buffer_fraction * (hi - lo) } else { f64::NAN });

    let low = field.upsample(&buffer.mapv(|b| params.tide_centre - b))?;
    let high = field.upsample(&buffer.mapv(|b| params.tide_centre + b))?;
    Ok(TideCutoffs {
        low: low.mapv(|v| v as f32),
        high: high.mapv(|v| v as f32),
    })
}

/// Keep the pixels of `obs` that are unobscured, have data and were observed
/// within the tide band.
pub fn select_observation(obs: Observation, cutoffs: &TideCutoffs) -> Result<SelectedObservation> {
    let shape = obs.water_index.dim();
    for dim in [obs.obscured.dim(), obs.tide_m.dim(), cutoffs.low.dim()] {
        if dim != shape {
            return Err(Error::SizeMismatch {
                er: shape.0,
                ec: shape.1,
                ar: dim.0,
                ac: dim.1,
            });
        }
    }

    let mut water_index = obs.water_index;
    Zip::from(&mut water_index)
        .and(&obs.obscured)
        .and(&obs.tide_m)
        .and(&cutoffs.low)
        .and(&cutoffs.high)
        .for_each(|w, &obscured, &tide, &lo, &hi| {
            // NaN tide or limits fail the range test
            if obscured || !(tide >= lo && tide <= hi) {
                *w = f32::NAN;
            }
        });

    Ok(SelectedObservation {
        time: obs.time,
        water_index,
        tide_m: obs.tide_m,
    })
}
