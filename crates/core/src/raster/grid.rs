//! Georeferenced raster band

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoBox, GeoTransform, RasterElement};
use ndarray::Array2;

/// A single georeferenced band.
///
/// Holds the cell array together with the affine transform, an optional CRS
/// and an optional no-data sentinel. Bands written by the pipeline always
/// carry a CRS, so [`Raster::geobox`] succeeds for anything read back from
/// an output directory.
///
/// ```ignore
/// use coastlines_core::{GeoBox, Raster};
///
/// let mut composite: Raster<f32> = Raster::from_geobox(&geobox, f32::NAN);
/// composite.data_mut()[(10, 20)] = 0.42;
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    data: Array2<T>,
    transform: GeoTransform,
    crs: Option<CRS>,
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Zero-filled band with an identity transform and no CRS
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::wrap(Array2::zeros((rows, cols)), GeoTransform::default(), None)
    }

    fn wrap(data: Array2<T>, transform: GeoTransform, crs: Option<CRS>) -> Self {
        Self {
            data,
            transform,
            crs,
            nodata: None,
        }
    }

    /// Band covering `geobox`, every cell set to `value`
    pub fn from_geobox(geobox: &GeoBox, value: T) -> Self {
        Self::wrap(
            Array2::from_elem(geobox.shape(), value),
            geobox.transform,
            Some(geobox.crs.clone()),
        )
    }

    /// Wrap an array whose shape matches `geobox`
    pub fn from_geobox_array(geobox: &GeoBox, data: Array2<T>) -> Result<Self> {
        if data.dim() != geobox.shape() {
            return Err(Error::SizeMismatch {
                er: geobox.rows,
                ec: geobox.cols,
                ar: data.nrows(),
                ac: data.ncols(),
            });
        }
        Ok(Self::wrap(data, geobox.transform, Some(geobox.crs.clone())))
    }

    /// Row-major cell values as decoded from a file
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        let array = Array2::from_shape_vec((rows, cols), data).map_err(|_| Error::InvalidDimensions {
            width: cols,
            height: rows,
        })?;
        Ok(Self::wrap(array, GeoTransform::default(), None))
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    pub fn into_array(self) -> Array2<T> {
        self.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    /// Footprint of the band; fails when no CRS is attached
    pub fn geobox(&self) -> Result<GeoBox> {
        let crs = self
            .crs
            .clone()
            .ok_or_else(|| Error::UnsupportedCrs("raster has no CRS".into()))?;
        Ok(GeoBox::new(self.transform, self.rows(), self.cols(), crs))
    }

    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Value at (row, col) as f64; no-data and out-of-range cells are NaN
    pub fn value_f64(&self, row: usize, col: usize) -> f64 {
        self.data
            .get((row, col))
            .map_or(f64::NAN, |&v| v.to_f64_or_nan(self.nodata))
    }
}
