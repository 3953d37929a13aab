//! Per-timestep tide height fields
//!
//! Tide heights are modelled at a sparse set of anchor locations, then
//! spread over the stack footprint by RBF interpolation on a coarse grid
//! followed by bilinear up-sampling to the stack resolution.

mod anchors;
mod field;

pub use anchors::{select_anchors, TideAnchor};
pub use field::{TideField, TideFieldParams};

use chrono::{DateTime, Utc};
use coastlines_core::Result;
use ndarray::Array2;

/// A tide model predicting heights (m above mean sea level) at locations and
/// instants.
pub trait TideModel: Send + Sync {
    /// Heights for every anchor × time, shaped `(anchors, times)`.
    ///
    /// Locations or instants the model cannot predict give NaN.
    fn predict(&self, lons: &[f64], lats: &[f64], times: &[DateTime<Utc>]) -> Result<Array2<f64>>;
}
