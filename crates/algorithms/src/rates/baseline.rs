//! Points spaced evenly along a shoreline

use coastlines_core::{Error, Result};
use geo_types::{MultiLineString, Point};

/// Points at every multiple of `spacing` of arc length along `lines`.
///
/// The lines are walked in order as one path, so arc length carries over from
/// the end of one line to the start of the next.
pub fn sample_along(lines: &MultiLineString<f64>, spacing: f64) -> Result<Vec<Point<f64>>> {
    if !(spacing.is_finite() && spacing > 0.0) {
        return Err(Error::InvalidParameter {
            name: "spacing",
            value: spacing.to_string(),
            reason: "must be positive".into(),
        });
    }

    let mut points = Vec::new();
    let mut travelled = 0.0;
    let mut next_at = 0.0;

    for line in &lines.0 {
        for seg in line.lines() {
            let (dx, dy) = (seg.end.x - seg.start.x, seg.end.y - seg.start.y);
            let length = (dx * dx + dy * dy).sqrt();
            if length <= 0.0 {
                continue;
            }
            while next_at <= travelled + length {
                let t = (next_at - travelled) / length;
                points.push(Point::new(seg.start.x + t * dx, seg.start.y + t * dy));
                next_at += spacing;
            }
            travelled += length;
        }
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo_types::{line_string, LineString};

    #[test]
    fn test_regular_spacing() {
        let line: LineString<f64> = line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)];
        let pts = sample_along(&MultiLineString::new(vec![line]), 30.0).unwrap();
        let xs: Vec<f64> = pts.iter().map(|p| p.x()).collect();
        assert_eq!(xs, vec![0.0, 30.0, 60.0, 90.0]);
    }

    #[test]
    fn test_arc_length_carries_across_vertices_and_lines() {
        let a: LineString<f64> = line_string![(x: 0.0, y: 0.0), (x: 20.0, y: 0.0), (x: 20.0, y: 20.0)];
        let b: LineString<f64> = line_string![(x: 500.0, y: 0.0), (x: 500.0, y: 50.0)];
        let pts = sample_along(&MultiLineString::new(vec![a, b]), 30.0).unwrap();
        assert_eq!(pts.len(), 4);
        assert_relative_eq!(pts[1].x(), 20.0);
        assert_relative_eq!(pts[1].y(), 10.0);
        // 40 m travelled on the first line, so the next point is 20 m into the second
        assert_relative_eq!(pts[2].x(), 500.0);
        assert_relative_eq!(pts[2].y(), 20.0);
        assert_relative_eq!(pts[3].y(), 50.0);
    }

    #[test]
    fn test_invalid_spacing() {
        assert!(sample_along(&MultiLineString::new(vec![]), 0.0).is_err());
    }
}
