//! Radial basis function interpolation
//!
//! Multiquadric interpolant without polynomial term:
//! ```text
//! f(x,y) = Σᵢ wᵢ · φ(‖(x,y) - (xᵢ,yᵢ)‖),   φ(r) = √((r/ε)² + 1)
//! ```
//! The shape parameter ε defaults to the mean spacing of the centres,
//! (area of their bounding box / n)^(1/d) over the non-degenerate axes.
//!
//! The interpolation matrix depends only on the centre locations, so it is
//! inverted once and reused for every set of values (one per timestep when
//! building tide fields).
//!
//! Reference:
//! Hardy, R.L. (1971). Multiquadric equations of topography and other
//! irregular surfaces. J. Geophys. Res. 76(8), 1905–1915.

use coastlines_core::{Error, Result};
use ndarray::{Array1, Array2};

use super::SamplePoint;

/// Multiquadric basis function
#[inline]
fn multiquadric(r: f64, epsilon: f64) -> f64 {
    ((r / epsilon).powi(2) + 1.0).sqrt()
}

/// A multiquadric RBF fitted to a fixed set of centres
#[derive(Debug, Clone)]
pub struct RbfInterpolator {
    centres: Vec<(f64, f64)>,
    epsilon: f64,
    /// Inverse of the n × n interpolation matrix
    inverse: Array2<f64>,
}

impl RbfInterpolator {
    /// Prepare an interpolator for the given centres
    ///
    /// # Errors
    /// - fewer than 2 centres
    /// - singular interpolation matrix (duplicate centres)
    pub fn new(centres: &[(f64, f64)]) -> Result<Self> {
        let n = centres.len();
        if n < 2 {
            return Err(Error::Algorithm(
                "RBF interpolation requires at least 2 distinct centres".into(),
            ));
        }

        let epsilon = default_epsilon(centres);
        let mut mat = vec![0.0_f64; n * n];
        for i in 0..n {
            for j in 0..n {
                let dx = centres[i].0 - centres[j].0;
                let dy = centres[i].1 - centres[j].1;
                mat[i * n + j] = multiquadric((dx * dx + dy * dy).sqrt(), epsilon);
            }
        }

        let inverse = gauss_jordan_inverse(n, &mut mat)?;
        Ok(Self {
            centres: centres.to_vec(),
            epsilon,
            inverse,
        })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn len(&self) -> usize {
        self.centres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centres.is_empty()
    }

    /// Basis function values φ(‖p - cᵢ‖) for every centre
    pub fn basis(&self, x: f64, y: f64) -> Array1<f64> {
        self.centres
            .iter()
            .map(|&(cx, cy)| {
                let (dx, dy) = (x - cx, y - cy);
                multiquadric((dx * dx + dy * dy).sqrt(), self.epsilon)
            })
            .collect()
    }

    /// Weights reproducing `values` at the centres
    pub fn weights(&self, values: &[f64]) -> Result<Array1<f64>> {
        if values.len() != self.centres.len() {
            return Err(Error::Algorithm(format!(
                "RBF expects {} values, got {}",
                self.centres.len(),
                values.len()
            )));
        }
        Ok(self.inverse.dot(&Array1::from(values.to_vec())))
    }

    /// Evaluate the interpolant fitted to `values` at one location
    pub fn evaluate(&self, values: &[f64], x: f64, y: f64) -> Result<f64> {
        Ok(self.basis(x, y).dot(&self.weights(values)?))
    }

    /// Linear operator mapping centre values to values at `targets`
    /// (targets × centres).
    pub fn projector(&self, targets: &[(f64, f64)]) -> Array2<f64> {
        let n = self.centres.len();
        let mut basis = Array2::<f64>::zeros((targets.len(), n));
        for (mut row, &(x, y)) in basis.rows_mut().into_iter().zip(targets) {
            row.assign(&self.basis(x, y));
        }
        basis.dot(&self.inverse)
    }
}

impl RbfInterpolator {
    /// Fit and evaluate in one call, for scattered samples
    pub fn interpolate(points: &[SamplePoint], targets: &[(f64, f64)]) -> Result<Vec<f64>> {
        let centres: Vec<(f64, f64)> = points.iter().map(|p| (p.x, p.y)).collect();
        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        let rbf = Self::new(&centres)?;
        let out = rbf.projector(targets).dot(&Array1::from(values));
        Ok(out.to_vec())
    }
}

/// Mean centre spacing: (Π non-zero bbox edges / n)^(1 / #edges)
fn default_epsilon(centres: &[(f64, f64)]) -> f64 {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for &(x, y) in centres {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    let edges: Vec<f64> = [max_x - min_x, max_y - min_y]
        .into_iter()
        .filter(|&e| e > 0.0)
        .collect();
    if edges.is_empty() {
        return 1.0;
    }
    let product: f64 = edges.iter().product();
    (product / centres.len() as f64).powf(1.0 / edges.len() as f64)
}

/// Invert an n × n row-major matrix by Gauss–Jordan elimination with
/// partial pivoting. `mat` is destroyed.
fn gauss_jordan_inverse(n: usize, mat: &mut [f64]) -> Result<Array2<f64>> {
    let mut inv = Array2::<f64>::eye(n);

    for col in 0..n {
        // Find pivot (max absolute value in column)
        let mut max_val = mat[col * n + col].abs();
        let mut max_row = col;
        for row in (col + 1)..n {
            let val = mat[row * n + col].abs();
            if val > max_val {
                max_val = val;
                max_row = row;
            }
        }

        if max_val < 1e-14 {
            return Err(Error::Algorithm(
                "RBF: singular matrix (centres may be duplicated)".into(),
            ));
        }

        if max_row != col {
            for j in 0..n {
                mat.swap(col * n + j, max_row * n + j);
                inv.swap((col, j), (max_row, j));
            }
        }

        let pivot = mat[col * n + col];
        for j in 0..n {
            mat[col * n + j] /= pivot;
            inv[(col, j)] /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = mat[row * n + col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n {
                mat[row * n + j] -= factor * mat[col * n + j];
                let v = inv[(col, j)];
                inv[(row, j)] -= factor * v;
            }
        }
    }

    Ok(inv)
}
