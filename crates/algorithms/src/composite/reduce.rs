//! Per-pixel reduction of selected observations

use coastlines_core::{Error, Result};
use ndarray::Array2;

use super::SelectedObservation;
use crate::maybe_rayon::*;
use crate::statistics::median;

/// Count value marking pixels without a single valid observation
pub const COUNT_NODATA: i16 = -999;

/// Median water index with its spread and support
#[derive(Debug, Clone)]
pub struct Composite {
    pub water_index: Array2<f32>,
    /// Population standard deviation of the contributing water index values
    pub stdev: Array2<f32>,
    /// Number of contributing observations, [`COUNT_NODATA`] where none
    pub count: Array2<i16>,
    /// Median tide height of the contributing observations (m)
    pub tide_m: Array2<f32>,
}

impl Composite {
    pub fn shape(&self) -> (usize, usize) {
        self.water_index.dim()
    }

    /// Valid observation count as a float, NaN where nodata
    pub fn count_f64(&self, row: usize, col: usize) -> f64 {
        match self.count[(row, col)] {
            COUNT_NODATA => f64::NAN,
            n => n as f64,
        }
    }
}

type RowReduction = (Vec<f32>, Vec<f32>, Vec<f32>, Vec<i16>);

/// Reduce observations to a composite of the given shape.
///
/// An empty slice gives an all-nodata composite.
pub fn reduce(observations: &[&SelectedObservation], shape: (usize, usize)) -> Result<Composite> {
    if let Some(bad) = observations.iter().find(|o| o.water_index.dim() != shape || o.tide_m.dim() != shape) {
        let (ar, ac) = bad.water_index.dim();
        return Err(Error::SizeMismatch {
            er: shape.0,
            ec: shape.1,
            ar,
            ac,
        });
    }

    let (rows, cols) = shape;
    let per_row: Vec<RowReduction> = (0..rows)
        .into_par_iter()
        .map(|row| {
            let mut index_row = vec![f32::NAN; cols];
            let mut stdev_row = vec![f32::NAN; cols];
            let mut tide_row = vec![f32::NAN; cols];
            let mut count_row = vec![COUNT_NODATA; cols];
            let mut values = Vec::with_capacity(observations.len());
            let mut tides = Vec::with_capacity(observations.len());

            for col in 0..cols {
                values.clear();
                tides.clear();
                for obs in observations {
                    let v = obs.water_index[(row, col)];
                    if v.is_finite() {
                        values.push(v as f64);
                        tides.push(obs.tide_m[(row, col)] as f64);
                    }
                }
                if values.is_empty() {
                    continue;
                }

                count_row[col] = values.len().min(i16::MAX as usize) as i16;
                let n = values.len() as f64;
                let mean = values.iter().sum::<f64>() / n;
                let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                index_row[col] = median(&values) as f32;
                stdev_row[col] = var.sqrt() as f32;
                tides.retain(|t| t.is_finite());
                tide_row[col] = median(&tides) as f32;
            }
            (index_row, stdev_row, tide_row, count_row)
        })
        .collect();

    let mut water_index = Array2::from_elem(shape, f32::NAN);
    let mut stdev = Array2::from_elem(shape, f32::NAN);
    let mut tide_m = Array2::from_elem(shape, f32::NAN);
    let mut count = Array2::from_elem(shape, COUNT_NODATA);
    for (row, (i, s, t, n)) in per_row.into_iter().enumerate() {
        for col in 0..cols {
            water_index[(row, col)] = i[col];
            stdev[(row, col)] = s[col];
            tide_m[(row, col)] = t[col];
            count[(row, col)] = n[col];
        }
    }

    Ok(Composite {
        water_index,
        stdev,
        count,
        tide_m,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{DateTime, Utc};

    fn obs(values: [f32; 2]) -> SelectedObservation {
        SelectedObservation {
            time: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
            water_index: Array2::from_shape_vec((1, 2), values.to_vec()).unwrap(),
            tide_m: Array2::from_elem((1, 2), 0.2),
        }
    }

    #[test]
    fn test_median_stdev_count() {
        let a = obs([0.1, f32::NAN]);
        let b = obs([0.3, f32::NAN]);
        let c = obs([0.8, f32::NAN]);
        let comp = reduce(&[&a, &b, &c], (1, 2)).unwrap();
        assert_relative_eq!(comp.water_index[(0, 0)], 0.3, epsilon = 1e-6);
        // Mean 0.4, deviations -0.3, -0.1, 0.4
        let expected = ((0.09 + 0.01 + 0.16) / 3.0f64).sqrt();
        assert_relative_eq!(comp.stdev[(0, 0)] as f64, expected, epsilon = 1e-6);
        assert_eq!(comp.count[(0, 0)], 3);
        assert_relative_eq!(comp.tide_m[(0, 0)], 0.2);
    }

    #[test]
    fn test_no_observations_is_nodata() {
        let a = obs([0.1, f32::NAN]);
        let comp = reduce(&[&a], (1, 2)).unwrap();
        assert_eq!(comp.count[(0, 1)], COUNT_NODATA);
        assert!(comp.water_index[(0, 1)].is_nan());
        assert!(comp.count_f64(0, 1).is_nan());

        let empty = reduce(&[], (3, 3)).unwrap();
        assert!(empty.count.iter().all(|&c| c == COUNT_NODATA));
    }

    #[test]
    fn test_shape_mismatch() {
        let a = obs([0.1, 0.2]);
        assert!(reduce(&[&a], (2, 2)).is_err());
    }
}
