//! Bilinear sampling and grid-to-grid resampling

use crate::maybe_rayon::*;
use coastlines_core::{Error, GeoBox, GeoTransform, Result};
use ndarray::Array2;

/// Bilinear interpolation at fractional (col, row) pixel-centre coordinates.
///
/// Integer coordinates fall on pixel centres. Locations outside the span of
/// centres, or touching a NaN neighbour, give NaN.
pub fn bilinear_at(values: &Array2<f64>, col_f: f64, row_f: f64) -> f64 {
    let (rows, cols) = values.dim();
    if rows == 0 || cols == 0 || !col_f.is_finite() || !row_f.is_finite() {
        return f64::NAN;
    }
    const EPS: f64 = 1e-9;
    let max_c = (cols - 1) as f64;
    let max_r = (rows - 1) as f64;
    if col_f < -EPS || row_f < -EPS || col_f > max_c + EPS || row_f > max_r + EPS {
        return f64::NAN;
    }
    let col_f = col_f.clamp(0.0, max_c);
    let row_f = row_f.clamp(0.0, max_r);

    let c0 = (col_f.floor() as usize).min(cols.saturating_sub(2));
    let r0 = (row_f.floor() as usize).min(rows.saturating_sub(2));
    let c1 = (c0 + 1).min(cols - 1);
    let r1 = (r0 + 1).min(rows - 1);
    let tx = col_f - c0 as f64;
    let ty = row_f - r0 as f64;

    let v00 = values[(r0, c0)];
    let v01 = values[(r0, c1)];
    let v10 = values[(r1, c0)];
    let v11 = values[(r1, c1)];

    let top = v00 * (1.0 - tx) + v01 * tx;
    let bottom = v10 * (1.0 - tx) + v11 * tx;
    top * (1.0 - ty) + bottom * ty
}

/// Bilinear interpolation at map coordinates
pub fn bilinear_at_point(values: &Array2<f64>, transform: &GeoTransform, x: f64, y: f64) -> f64 {
    let (col_f, row_f) = transform.geo_to_fractional(x, y);
    bilinear_at(values, col_f, row_f)
}

/// Resample `source` (on `source_transform`) onto `target`'s grid.
///
/// Target pixel centres beyond the outermost source centres take the edge
/// value, so a coarse grid covering the same extent fills every target cell.
pub fn resample_bilinear(
    source: &Array2<f64>,
    source_transform: &GeoTransform,
    target: &GeoBox,
) -> Result<Array2<f64>> {
    let (src_rows, src_cols) = source.dim();
    if src_rows == 0 || src_cols == 0 {
        return Err(Error::InvalidDimensions {
            width: src_cols,
            height: src_rows,
        });
    }
    let (rows, cols) = target.shape();
    let max_c = (src_cols - 1) as f64;
    let max_r = (src_rows - 1) as f64;

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let (x, y) = target.transform.pixel_to_geo(col, row);
                let (cf, rf) = source_transform.geo_to_fractional(x, y);
                *out = bilinear_at(source, cf.clamp(0.0, max_c), rf.clamp(0.0, max_r));
            }
            row_data
        })
        .collect();

    Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use coastlines_core::CRS;

    #[test]
    fn test_bilinear_centre_and_midpoint() {
        let v = ndarray::array![[0.0, 1.0], [2.0, 3.0]];
        assert_relative_eq!(bilinear_at(&v, 0.0, 0.0), 0.0);
        assert_relative_eq!(bilinear_at(&v, 1.0, 1.0), 3.0);
        assert_relative_eq!(bilinear_at(&v, 0.5, 0.5), 1.5);
        assert!(bilinear_at(&v, 1.5, 0.0).is_nan());
    }

    #[test]
    fn test_bilinear_nan_propagates() {
        let v = ndarray::array![[0.0, f64::NAN], [2.0, 3.0]];
        assert!(bilinear_at(&v, 0.5, 0.5).is_nan());
    }

    #[test]
    fn test_resample_linear_field_is_exact() {
        // Coarse grid of a planar field f = x + 2y, 10 m pixels
        let coarse_t = GeoTransform::new(0.0, 100.0, 10.0, -10.0);
        let coarse = Array2::from_shape_fn((10, 10), |(r, c)| {
            let (x, y) = coarse_t.pixel_to_geo(c, r);
            x + 2.0 * y
        });
        let fine = GeoBox::new(GeoTransform::new(0.0, 100.0, 2.0, -2.0), 50, 50, CRS::australian_albers());
        let out = resample_bilinear(&coarse, &coarse_t, &fine).unwrap();
        let (x, y) = fine.transform.pixel_to_geo(20, 20);
        assert_relative_eq!(out[(20, 20)], x + 2.0 * y, epsilon = 1e-9);
        // Edge cells are clamped, never NaN
        assert!(out.iter().all(|v| v.is_finite()));
    }
}
