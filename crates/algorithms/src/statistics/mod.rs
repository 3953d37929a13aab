//! Statistics for shoreline change series
//!
//! - **robust**: NaN-aware median / standard deviation and MAD outliers
//! - **regression**: ordinary least squares with a Student-t p-value
//! - **circular**: mean and spread of axial (mod 180°) bearings

pub mod circular;
pub mod regression;
pub mod robust;

pub use circular::{circular_mean_std, CircularSummary};
pub use regression::{linear_regression, LinearFit};
pub use robust::{mad_outliers, median, nan_median, nan_std, OutlierParams};
