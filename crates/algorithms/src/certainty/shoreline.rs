//! Annual shoreline certainty overlay

use std::collections::BTreeMap;

use coastlines_core::{GeoTransform, Projection};
use geo::Centroid;
use geo_types::{Coord, LineString, MultiLineString};
use ndarray::Array2;

use crate::coastal::CertaintyClass;

/// Years and area affected by volcanic aerosol contamination
#[derive(Debug, Clone)]
pub struct AerosolOverride {
    pub years: Vec<i32>,
    /// Segments whose centroid lies north of this latitude are affected
    pub min_latitude: f64,
    pub label: &'static str,
}

impl Default for AerosolOverride {
    fn default() -> Self {
        Self {
            years: vec![1991, 1992],
            min_latitude: -23.0,
            label: "aerosol issues",
        }
    }
}

impl AerosolOverride {
    fn applies(&self, year: i32, line: &LineString<f64>, projection: &Projection) -> bool {
        if !self.years.contains(&year) {
            return false;
        }
        line.centroid().map_or(false, |c| {
            let (_, lat) = projection.to_lonlat(c.x(), c.y());
            lat > self.min_latitude
        })
    }
}

/// Shorelines of one year sharing a certainty label
#[derive(Debug, Clone, PartialEq)]
pub struct ShorelineSegment {
    pub year: i32,
    pub certainty: &'static str,
    pub geometry: MultiLineString<f64>,
}

/// Class of the pixel containing a map location; outside the grid counts as
/// insufficient data
fn class_at(classes: &Array2<u8>, transform: &GeoTransform, x: f64, y: f64) -> CertaintyClass {
    let (col, row) = transform.geo_to_pixel(x, y);
    let (rows, cols) = classes.dim();
    if !(col >= 0.0 && row >= 0.0) || col as usize >= cols || row as usize >= rows {
        return CertaintyClass::InsufficientData;
    }
    CertaintyClass::from_code(classes[(row as usize, col as usize)]).unwrap_or(CertaintyClass::InsufficientData)
}

/// Split a line where the certainty class under it changes.
///
/// Each segment takes the class at its midpoint; consecutive segments of the
/// same class form one piece.
fn split_by_class(line: &LineString<f64>, classes: &Array2<u8>, transform: &GeoTransform) -> Vec<(CertaintyClass, LineString<f64>)> {
    let mut pieces: Vec<(CertaintyClass, Vec<Coord<f64>>)> = Vec::new();
    for seg in line.lines() {
        let mid = (seg.start + seg.end) / 2.0;
        let class = class_at(classes, transform, mid.x, mid.y);
        match pieces.last_mut() {
            Some((c, coords)) if *c == class => coords.push(seg.end),
            _ => pieces.push((class, vec![seg.start, seg.end])),
        }
    }
    pieces
        .into_iter()
        .map(|(c, coords)| (c, LineString::new(coords)))
        .collect()
}

/// Label a year's shorelines from its certainty raster, then apply the
/// aerosol override, which takes precedence over every raster class.
///
/// Pieces are grouped by label, in label order.
pub fn label_shorelines(
    year: i32,
    lines: &MultiLineString<f64>,
    classes: &Array2<u8>,
    transform: &GeoTransform,
    projection: &Projection,
    aerosol: &AerosolOverride,
) -> Vec<ShorelineSegment> {
    let mut grouped: BTreeMap<&'static str, Vec<LineString<f64>>> = BTreeMap::new();
    for line in &lines.0 {
        for (class, piece) in split_by_class(line, classes, transform) {
            let label = if aerosol.applies(year, &piece, projection) {
                aerosol.label
            } else {
                class.label()
            };
            grouped.entry(label).or_default().push(piece);
        }
    }

    grouped
        .into_iter()
        .map(|(certainty, pieces)| ShorelineSegment {
            year,
            certainty,
            geometry: MultiLineString::new(pieces),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use coastlines_core::CRS;
    use geo_types::line_string;

    fn setup() -> (Array2<u8>, GeoTransform) {
        // 10 × 10 grid of 30 m pixels; the southern half is unstable
        let mut classes = Array2::zeros((10, 10));
        for r in 5..10 {
            for c in 0..10 {
                classes[(r, c)] = CertaintyClass::UnstableData.code();
            }
        }
        (classes, GeoTransform::new(0.0, 300.0, 30.0, -30.0))
    }

    #[test]
    fn test_line_split_at_class_change() {
        let (classes, t) = setup();
        let line = line_string![(x: 150.0, y: 290.0), (x: 150.0, y: 200.0), (x: 150.0, y: 100.0), (x: 150.0, y: 10.0)];
        let projection = Projection::from_crs(&CRS::australian_albers()).unwrap();
        let segs = label_shorelines(
            2005,
            &MultiLineString::new(vec![line]),
            &classes,
            &t,
            &projection,
            &AerosolOverride::default(),
        );
        assert_eq!(segs.len(), 2);
        let good = segs.iter().find(|s| s.certainty == "good").unwrap();
        let unstable = segs.iter().find(|s| s.certainty == "unstable data").unwrap();
        assert_eq!(good.geometry.0[0].0.len(), 2);
        assert_eq!(unstable.geometry.0[0].0.len(), 3);
    }

    #[test]
    fn test_aerosol_overrides_in_north_only() {
        let (classes, _) = setup();
        let projection = Projection::from_crs(&CRS::wgs84()).unwrap();
        let line = line_string![(x: 130.1, y: -12.2), (x: 130.1, y: -12.3)];
        let north = GeoTransform::new(130.0, -12.0, 0.1, -0.1);
        let labelled = |year, t: &GeoTransform, l: &LineString<f64>| {
            label_shorelines(
                year,
                &MultiLineString::new(vec![l.clone()]),
                &classes,
                t,
                &projection,
                &AerosolOverride::default(),
            )
        };
        assert_eq!(labelled(1991, &north, &line)[0].certainty, "aerosol issues");
        assert_eq!(labelled(1993, &north, &line)[0].certainty, "good");

        let south_line = line_string![(x: 130.1, y: -30.2), (x: 130.1, y: -30.3)];
        let south = GeoTransform::new(130.0, -30.0, 0.1, -0.1);
        assert_eq!(labelled(1992, &south, &south_line)[0].certainty, "good");
    }
}
