//! Sub-pixel iso-line extraction via marching squares
//!
//! Cells of the dual grid join four neighbouring pixel centres. Each edge
//! whose end values straddle the level gets a crossing point by linear
//! interpolation, and every cell emits zero, one or two segments between its
//! crossings. Saddles are resolved with the mean of the four corners.
//!
//! Segments are oriented so that values at or above the level lie on the
//! left in map coordinates (north-up grids), which lets them be chained into
//! polylines by matching shared edge crossings.

use std::collections::HashMap;

use crate::maybe_rayon::*;
use coastlines_core::GeoTransform;
use geo_types::{Coord, LineString, MultiLineString};
use ndarray::Array2;

/// Identity of a grid edge carrying a crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EdgeId {
    /// Between (r, c) and (r, c + 1)
    Horizontal(usize, usize),
    /// Between (r, c) and (r + 1, c)
    Vertical(usize, usize),
}

#[derive(Debug, Clone, Copy)]
struct Crossing {
    id: EdgeId,
    /// (col, row) in fractional pixel coordinates
    at: (f64, f64),
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    start: Crossing,
    end: Crossing,
}

/// Fractional position of `level` between `a` and `b`
#[inline]
fn fraction(a: f64, b: f64, level: f64) -> f64 {
    let d = b - a;
    if d.abs() < 1e-15 {
        0.5
    } else {
        ((level - a) / d).clamp(0.0, 1.0)
    }
}

#[inline]
fn cross(p: (f64, f64), q: (f64, f64), h: (f64, f64)) -> f64 {
    (q.0 - p.0) * (h.1 - p.1) - (q.1 - p.1) * (h.0 - p.0)
}

/// Orient a segment so `reference` is on the wanted side: `high` true means
/// the reference is a high corner (cross < 0 in pixel space).
fn oriented(a: Crossing, b: Crossing, reference: (f64, f64), high: bool) -> Segment {
    let c = cross(a.at, b.at, reference);
    let keep = if high { c < 0.0 } else { c > 0.0 };
    if keep {
        Segment { start: a, end: b }
    } else {
        Segment { start: b, end: a }
    }
}

/// Segments of the dual cell with top-left pixel (r, c)
fn cell_segments(values: &Array2<f64>, r: usize, c: usize, level: f64) -> Vec<Segment> {
    let tl = values[(r, c)];
    let tr = values[(r, c + 1)];
    let br = values[(r + 1, c + 1)];
    let bl = values[(r + 1, c)];
    if tl.is_nan() || tr.is_nan() || br.is_nan() || bl.is_nan() {
        return Vec::new();
    }

    let (rf, cf) = (r as f64, c as f64);
    // Corner positions as (col, row)
    let corners = [(cf, rf), (cf + 1.0, rf), (cf + 1.0, rf + 1.0), (cf, rf + 1.0)];
    let vals = [tl, tr, br, bl];
    let high = vals.map(|v| v >= level);
    let n_high = high.iter().filter(|&&h| h).count();
    if n_high == 0 || n_high == 4 {
        return Vec::new();
    }

    let top = Crossing {
        id: EdgeId::Horizontal(r, c),
        at: (cf + fraction(tl, tr, level), rf),
    };
    let right = Crossing {
        id: EdgeId::Vertical(r, c + 1),
        at: (cf + 1.0, rf + fraction(tr, br, level)),
    };
    let bottom = Crossing {
        id: EdgeId::Horizontal(r + 1, c),
        at: (cf + fraction(bl, br, level), rf + 1.0),
    };
    let left = Crossing {
        id: EdgeId::Vertical(r, c),
        at: (cf, rf + fraction(tl, bl, level)),
    };

    let saddle = n_high == 2 && high[0] == high[2];
    if saddle {
        let centre_high = (tl + tr + br + bl) / 4.0 >= level;
        // The corners cut off by the two segments are the ones whose state
        // differs from the centre
        let (k1, k2) = if high[0] != centre_high { (0, 2) } else { (1, 3) };
        let around = |k: usize| match k {
            0 => (top, left),
            1 => (top, right),
            2 => (right, bottom),
            _ => (bottom, left),
        };
        return [k1, k2]
            .iter()
            .map(|&k| {
                let (a, b) = around(k);
                oriented(a, b, corners[k], high[k])
            })
            .collect();
    }

    let mut crossings = Vec::with_capacity(2);
    if high[0] != high[1] {
        crossings.push(top);
    }
    if high[1] != high[2] {
        crossings.push(right);
    }
    if high[3] != high[2] {
        crossings.push(bottom);
    }
    if high[0] != high[3] {
        crossings.push(left);
    }
    if crossings.len() != 2 {
        return Vec::new();
    }

    let (sx, sy) = corners
        .iter()
        .zip(high.iter())
        .filter(|(_, &h)| h)
        .fold((0.0, 0.0), |acc, (p, _)| (acc.0 + p.0, acc.1 + p.1));
    let reference = (sx / n_high as f64, sy / n_high as f64);
    vec![oriented(crossings[0], crossings[1], reference, true)]
}

/// Chain oriented segments into polylines in fractional pixel coordinates
fn chain(segments: Vec<Segment>) -> Vec<Vec<(f64, f64)>> {
    let mut by_start: HashMap<EdgeId, usize> = HashMap::with_capacity(segments.len());
    let mut by_end: HashMap<EdgeId, usize> = HashMap::with_capacity(segments.len());
    for (i, s) in segments.iter().enumerate() {
        by_start.insert(s.start.id, i);
        by_end.insert(s.end.id, i);
    }

    let mut used = vec![false; segments.len()];
    let mut lines = Vec::new();

    for seed in 0..segments.len() {
        if used[seed] {
            continue;
        }

        // Walk backwards to the head of the chain (or all the way round a loop)
        let mut head = seed;
        while let Some(&prev) = by_end.get(&segments[head].start.id) {
            if used[prev] || prev == seed {
                break;
            }
            head = prev;
            if head == seed {
                break;
            }
        }

        let mut line = vec![segments[head].start.at];
        let mut current = head;
        loop {
            used[current] = true;
            let end = segments[current].end;
            line.push(end.at);
            match by_start.get(&end.id) {
                Some(&next) if !used[next] => current = next,
                _ => break,
            }
        }
        line.dedup_by(|a, b| (a.0 - b.0).abs() < 1e-12 && (a.1 - b.1).abs() < 1e-12);
        lines.push(line);
    }
    lines
}

/// Extract iso-lines of `values` at `level`.
///
/// NaN cells are nodata. Returned polylines are in map coordinates of
/// `transform` (pixel centres at half-pixel offsets) and have at least
/// `min_vertices` vertices.
pub fn contour_lines(
    values: &Array2<f64>,
    transform: &GeoTransform,
    level: f64,
    min_vertices: usize,
) -> MultiLineString<f64> {
    let (rows, cols) = values.dim();
    if rows < 2 || cols < 2 {
        return MultiLineString::new(Vec::new());
    }

    let segments: Vec<Segment> = (0..rows - 1)
        .into_par_iter()
        .flat_map(|r| {
            let mut row_segments = Vec::new();
            for c in 0..cols - 1 {
                row_segments.extend(cell_segments(values, r, c, level));
            }
            row_segments
        })
        .collect();

    let lines = chain(segments)
        .into_iter()
        .filter(|l| l.len() >= min_vertices.max(2))
        .map(|l| {
            LineString::new(
                l.into_iter()
                    .map(|(col, row)| {
                        let (x, y) = transform.fractional_to_geo(col, row);
                        Coord { x, y }
                    })
                    .collect(),
            )
        })
        .collect();

    MultiLineString::new(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn transform() -> GeoTransform {
        GeoTransform::new(0.0, 0.0, 1.0, -1.0)
    }

    /// Water (positive) on the right half, land on the left, crossing at
    /// `edge` (pixel column, fractional)
    fn step(rows: usize, cols: usize, edge: f64) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |(_, c)| (c as f64 - edge) / 10.0)
    }

    #[test]
    fn test_vertical_line_subpixel() {
        let values = step(20, 20, 9.3);
        let lines = contour_lines(&values, &transform(), 0.0, 10);
        assert_eq!(lines.0.len(), 1);
        let line = &lines.0[0];
        assert_eq!(line.0.len(), 20);
        for p in &line.0 {
            // Pixel centre offset: column 9.3 maps to x = 9.8
            assert_relative_eq!(p.x, 9.8, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_water_on_left() {
        let values = step(20, 20, 9.5);
        let lines = contour_lines(&values, &transform(), 0.0, 2);
        let line = &lines.0[0];
        let (a, b) = (line.0[0], line.0[1]);
        // Water lies east (x larger); walking along the line it must be on the left
        let water = Coord { x: a.x + 3.0, y: a.y };
        let cross = (b.x - a.x) * (water.y - a.y) - (b.y - a.y) * (water.x - a.x);
        assert!(cross > 0.0);
    }

    #[test]
    fn test_short_lines_dropped() {
        let values = step(5, 20, 9.5);
        assert!(contour_lines(&values, &transform(), 0.0, 10).0.is_empty());
        assert_eq!(contour_lines(&values, &transform(), 0.0, 5).0.len(), 1);
    }

    #[test]
    fn test_closed_ring_around_island() {
        let values = Array2::from_shape_fn((21, 21), |(r, c)| {
            let d = ((r as f64 - 10.0).powi(2) + (c as f64 - 10.0).powi(2)).sqrt();
            d - 6.0
        });
        let lines = contour_lines(&values, &transform(), 0.0, 10);
        assert_eq!(lines.0.len(), 1);
        let ring = &lines.0[0];
        assert_eq!(ring.0.first(), ring.0.last());
    }

    #[test]
    fn test_nodata_splits_line() {
        let mut values = step(30, 20, 9.5);
        for c in 0..20 {
            values[(15, c)] = f64::NAN;
        }
        let lines = contour_lines(&values, &transform(), 0.0, 5);
        assert_eq!(lines.0.len(), 2);
    }

    #[test]
    fn test_saddle_produces_two_segments() {
        let values = ndarray::array![[1.0, -1.0], [-1.0, 1.0]];
        let segs = cell_segments(&values, 0, 0, 0.0);
        assert_eq!(segs.len(), 2);
    }
}
