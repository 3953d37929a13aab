//! Spatial interpolation
//!
//! - RBF: multiquadric radial basis functions for scattered samples (tide
//!   anchors onto a coarse grid)
//! - Bilinear: point sampling and grid-to-grid resampling

mod rbf;
mod resample;

pub use rbf::RbfInterpolator;
pub use resample::{bilinear_at, bilinear_at_point, resample_bilinear};

/// A sample point with x, y coordinates and a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl SamplePoint {
    pub fn new(x: f64, y: f64, value: f64) -> Self {
        Self { x, y, value }
    }
}
