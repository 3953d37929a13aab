//! Cell value types for rasters

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// A numeric type that can be stored in a raster band.
///
/// Composites are written as `f32` with NaN gaps and observation counts as
/// `i16` with a sentinel; masks read from disk are `u8`.
pub trait RasterElement:
    Copy + Debug + PartialOrd + NumCast + Zero + Send + Sync + 'static
{
    /// Fill value when a band declares no sentinel of its own
    fn default_nodata() -> Self;

    /// Whether the value is a gap, either NaN or equal to `nodata`
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Widen to f64 with gaps (and unrepresentable values) as NaN
    fn to_f64_or_nan(self, nodata: Option<Self>) -> f64 {
        if self.is_nodata(nodata) {
            f64::NAN
        } else {
            NumCast::from(self).unwrap_or(f64::NAN)
        }
    }
}

macro_rules! sentinel_element {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::MIN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                nodata == Some(*self)
            }
        }
    )*};
}

macro_rules! nan_element {
    ($($t:ty),*) => {$(
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::NAN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                self.is_nan() || nodata.is_some_and(|nd| (self - nd).abs() <= <$t>::EPSILON * 100.0)
            }
        }
    )*};
}

sentinel_element!(u8, u16, i16, i32);
nan_element!(f32, f64);
