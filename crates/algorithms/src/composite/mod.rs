//! Tidally constrained annual compositing
//!
//! Observations are kept only where the modelled tide lies within a per-pixel
//! band around the requested tide centre. The survivors of each calendar
//! year are reduced to a median water index, its standard deviation and the
//! number of contributing observations; a three-year "gapfill" composite is
//! built alongside from the neighbouring years.

mod cutoffs;
mod reduce;
mod stream;
mod window;

pub use cutoffs::{select_observation, tide_cutoffs, CutoffParams, TideCutoffs};
pub use reduce::{reduce, Composite, COUNT_NODATA};
pub use stream::{StreamingCompositor, YearComposites};
pub use window::{WindowState, YearBatch, YearWindow};

use chrono::{DateTime, Utc};
use ndarray::Array2;

/// One timestep of the observation stack
#[derive(Debug, Clone)]
pub struct Observation {
    pub time: DateTime<Utc>,
    /// Water index, NaN where nodata
    pub water_index: Array2<f32>,
    /// Cloud, shadow or snow
    pub obscured: Array2<bool>,
    /// Modelled tide height (m)
    pub tide_m: Array2<f32>,
}

/// An observation reduced to the pixels that pass tide and quality filtering
#[derive(Debug, Clone)]
pub struct SelectedObservation {
    pub time: DateTime<Utc>,
    /// Water index, NaN where excluded
    pub water_index: Array2<f32>,
    pub tide_m: Array2<f32>,
}
