//! Exact Euclidean distance transform
//!
//! Separable lower-envelope algorithm: a 1-D squared distance transform is
//! run down every column, then along every row of the intermediate result.
//!
//! Reference:
//! Felzenszwalb, P.F. & Huttenlocher, D.P. (2012). Distance Transforms of
//! Sampled Functions. Theory of Computing 8, 415–428.

use crate::maybe_rayon::*;
use ndarray::Array2;

/// 1-D squared distance transform of `f` (in place through `out`)
fn dt_1d(f: &[f64], out: &mut [f64], v: &mut [usize], z: &mut [f64]) {
    let n = f.len();
    if n == 0 {
        return;
    }
    // Skip leading infinities so parabola intersections stay finite
    let Some(first) = f.iter().position(|x| x.is_finite()) else {
        out.iter_mut().for_each(|o| *o = f64::INFINITY);
        return;
    };

    let mut k = 0usize;
    v[0] = first;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;

    for q in (first + 1)..n {
        if !f[q].is_finite() {
            continue;
        }
        let intersect = |p: usize| {
            ((f[q] + (q * q) as f64) - (f[p] + (p * p) as f64)) / (2.0 * (q as f64 - p as f64))
        };
        let mut s = intersect(v[k]);
        // z[0] is -inf, so this stops at k == 0
        while s <= z[k] {
            k -= 1;
            s = intersect(v[k]);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    k = 0;
    for (q, o) in out.iter_mut().enumerate() {
        while z[k + 1] < q as f64 {
            k += 1;
        }
        let d = q as f64 - v[k] as f64;
        *o = d * d + f[v[k]];
    }
}

/// Squared Euclidean distance (in pixels) from every cell to the nearest
/// `true` cell; infinity when the mask is empty.
pub fn squared_distance_to(mask: &Array2<bool>) -> Array2<f64> {
    let (rows, cols) = mask.dim();
    if rows == 0 || cols == 0 {
        return Array2::zeros((rows, cols));
    }

    // Column pass
    let columns: Vec<Vec<f64>> = (0..cols)
        .into_par_iter()
        .map(|col| {
            let f: Vec<f64> = (0..rows)
                .map(|row| if mask[(row, col)] { 0.0 } else { f64::INFINITY })
                .collect();
            let mut out = vec![0.0; rows];
            let mut v = vec![0usize; rows];
            let mut z = vec![0.0; rows + 1];
            dt_1d(&f, &mut out, &mut v, &mut z);
            out
        })
        .collect();

    // Row pass
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let f: Vec<f64> = (0..cols).map(|col| columns[col][row]).collect();
            let mut out = vec![0.0; cols];
            let mut v = vec![0usize; cols];
            let mut z = vec![0.0; cols + 1];
            dt_1d(&f, &mut out, &mut v, &mut z);
            out
        })
        .collect();

    // Shape is (rows, cols) by construction
    Array2::from_shape_vec((rows, cols), data).unwrap_or_else(|_| Array2::zeros((rows, cols)))
}
