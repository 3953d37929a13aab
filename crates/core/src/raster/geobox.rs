//! Spatial footprint shared by every raster in an observation stack

use crate::crs::{Projection, CRS};
use crate::error::{Error, Result};
use crate::raster::GeoTransform;
use serde::{Deserialize, Serialize};

/// The tuple (CRS, affine transform, width, height) defining a raster footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoBox {
    pub transform: GeoTransform,
    pub rows: usize,
    pub cols: usize,
    pub crs: CRS,
}

impl GeoBox {
    pub fn new(transform: GeoTransform, rows: usize, cols: usize, crs: CRS) -> Self {
        Self {
            transform,
            rows,
            cols,
            crs,
        }
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Map bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols, self.rows)
    }

    /// Bounds in geographic degrees (min_lon, min_lat, max_lon, max_lat).
    ///
    /// Edges are densified so curved parallels of conic projections are
    /// enclosed.
    pub fn lonlat_bounds(&self) -> Result<(f64, f64, f64, f64)> {
        let projection = Projection::from_crs(&self.crs)?;
        let (min_x, min_y, max_x, max_y) = self.bounds();
        let steps = 16;
        let mut out = (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let x = min_x + t * (max_x - min_x);
            let y = min_y + t * (max_y - min_y);
            for &(px, py) in &[(x, min_y), (x, max_y), (min_x, y), (max_x, y)] {
                let (lon, lat) = projection.to_lonlat(px, py);
                out.0 = out.0.min(lon);
                out.1 = out.1.min(lat);
                out.2 = out.2.max(lon);
                out.3 = out.3.max(lat);
            }
        }
        Ok(out)
    }

    /// A coarser geobox covering the same extent, `factor` pixels per coarse pixel
    pub fn coarsened(&self, factor: usize) -> Self {
        let factor = factor.max(1);
        Self {
            transform: self.transform.coarsened(factor),
            rows: self.rows.div_ceil(factor).max(1),
            cols: self.cols.div_ceil(factor).max(1),
            crs: self.crs.clone(),
        }
    }

    /// Map coordinates of a pixel centre
    pub fn pixel_centre(&self, col: usize, row: usize) -> (f64, f64) {
        self.transform.pixel_to_geo(col, row)
    }

    /// Area of one pixel in CRS units squared
    pub fn pixel_area(&self) -> f64 {
        (self.transform.pixel_width * self.transform.pixel_height).abs()
    }

    /// Fail unless `other` has the same shape, transform and CRS
    pub fn ensure_compatible(&self, other: &GeoBox) -> Result<()> {
        self.crs.ensure_same(&other.crs)?;
        if self.shape() != other.shape() {
            return Err(Error::SizeMismatch {
                er: self.rows,
                ec: self.cols,
                ar: other.rows,
                ac: other.cols,
            });
        }
        if self.transform != other.transform {
            return Err(Error::Other(format!(
                "geobox transform mismatch: {:?} vs {:?}",
                self.transform, other.transform
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn albers_box() -> GeoBox {
        GeoBox::new(
            GeoTransform::new(1_700_000.0, -3_800_000.0, 30.0, -30.0),
            200,
            120,
            CRS::australian_albers(),
        )
    }

    #[test]
    fn test_coarsened_covers_extent() {
        let gb = albers_box().coarsened(50);
        assert_eq!(gb.shape(), (4, 3));
        let (min_x, min_y, max_x, max_y) = gb.bounds();
        let (fmin_x, fmin_y, fmax_x, fmax_y) = albers_box().bounds();
        assert!(min_x <= fmin_x && max_x >= fmax_x);
        assert!(min_y <= fmin_y && max_y >= fmax_y);
    }

    #[test]
    fn test_lonlat_bounds() {
        let (min_lon, min_lat, max_lon, max_lat) = albers_box().lonlat_bounds().unwrap();
        assert!(min_lon < max_lon && min_lat < max_lat);
        assert!(min_lon > 140.0 && max_lon < 160.0);
        assert!(min_lat > -40.0 && max_lat < -30.0);
    }

    #[test]
    fn test_compatibility() {
        let a = albers_box();
        let mut b = albers_box();
        assert!(a.ensure_compatible(&b).is_ok());
        b.crs = CRS::wgs84();
        assert!(matches!(a.ensure_compatible(&b), Err(Error::CrsMismatch(_, _))));
        assert_relative_eq!(a.pixel_area(), 900.0);
    }
}
