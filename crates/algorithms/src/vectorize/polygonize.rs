//! Class raster to polygon conversion
//!
//! Every 4-connected region of equal class value becomes one polygon whose
//! rings follow pixel edges. Boundary edges are emitted with the region on
//! their right (in row/column space) and chained into rings; at pinch
//! vertices, where a region touches itself diagonally, the walk turns right
//! so rings stay simple. Output rings follow the GeoJSON winding rule
//! (exterior counter-clockwise, holes clockwise) in map coordinates.

use std::collections::HashMap;

use coastlines_core::GeoTransform;
use geo::{Contains, InteriorPoint};
use geo_types::{Coord, LineString, Polygon};
use ndarray::Array2;

use crate::morphology::{label_classes, Connectivity};

type Vertex = (usize, usize);

#[derive(Debug, Clone, Copy)]
struct Edge {
    from: Vertex,
    to: Vertex,
}

impl Edge {
    fn direction(&self) -> (isize, isize) {
        (
            self.to.0 as isize - self.from.0 as isize,
            self.to.1 as isize - self.from.1 as isize,
        )
    }
}

/// Polygonise a class raster; cells whose class is in `skip` produce nothing
pub fn polygonize(
    classes: &Array2<u8>,
    transform: &GeoTransform,
    skip: &[u8],
) -> Vec<(u8, Polygon<f64>)> {
    let (rows, cols) = classes.dim();
    let labels = label_classes(classes, Connectivity::Four);
    let mut edges: Vec<Vec<Edge>> = vec![Vec::new(); labels.sizes.len()];
    let mut class_of = vec![0u8; labels.sizes.len()];

    for ((r, c), &id) in labels.ids.indexed_iter() {
        let class = classes[(r, c)];
        if skip.contains(&class) {
            continue;
        }
        let id = id as usize;
        class_of[id] = class;
        let same = |nr: isize, nc: isize| {
            nr >= 0
                && nc >= 0
                && (nr as usize) < rows
                && (nc as usize) < cols
                && labels.ids[(nr as usize, nc as usize)] as usize == id
        };
        let (ri, ci) = (r as isize, c as isize);
        if !same(ri - 1, ci) {
            edges[id].push(Edge { from: (r, c), to: (r, c + 1) });
        }
        if !same(ri, ci + 1) {
            edges[id].push(Edge { from: (r, c + 1), to: (r + 1, c + 1) });
        }
        if !same(ri + 1, ci) {
            edges[id].push(Edge { from: (r + 1, c + 1), to: (r + 1, c) });
        }
        if !same(ri, ci - 1) {
            edges[id].push(Edge { from: (r + 1, c), to: (r, c) });
        }
    }

    let mut out = Vec::new();
    for (id, component) in edges.into_iter().enumerate() {
        if component.is_empty() {
            continue;
        }
        let rings = trace_rings(&component);
        out.extend(
            assemble(rings, transform)
                .into_iter()
                .map(|p| (class_of[id], p)),
        );
    }
    out
}

fn trace_rings(edges: &[Edge]) -> Vec<Vec<Vertex>> {
    let mut outgoing: HashMap<Vertex, Vec<usize>> = HashMap::new();
    for (i, e) in edges.iter().enumerate() {
        outgoing.entry(e.from).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut rings = Vec::new();

    for start in 0..edges.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let origin = edges[start].from;
        let mut ring = vec![origin];
        let mut current = start;

        loop {
            let edge = edges[current];
            if edge.to == origin {
                break;
            }
            ring.push(edge.to);

            let (dr, dc) = edge.direction();
            let candidates = outgoing.get(&edge.to).map(Vec::as_slice).unwrap_or(&[]);
            // Right turn first, then straight, then left
            let preference = [(dc, -dr), (dr, dc), (-dc, dr)];
            let next = preference.iter().find_map(|&dir| {
                candidates
                    .iter()
                    .copied()
                    .find(|&i| !used[i] && edges[i].direction() == dir)
            });
            match next {
                Some(i) => {
                    used[i] = true;
                    current = i;
                }
                None => break,
            }
        }
        rings.push(ring);
    }
    rings
}

/// Drop vertices lying on a straight run
fn simplify(ring: &[Vertex]) -> Vec<Vertex> {
    let n = ring.len();
    let dir = |a: Vertex, b: Vertex| {
        (
            (b.0 as isize - a.0 as isize).signum(),
            (b.1 as isize - a.1 as isize).signum(),
        )
    };
    (0..n)
        .filter(|&i| {
            let prev = ring[(i + n - 1) % n];
            let next = ring[(i + 1) % n];
            dir(prev, ring[i]) != dir(ring[i], next)
        })
        .map(|i| ring[i])
        .collect()
}

fn to_linestring(ring: &[Vertex], transform: &GeoTransform) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = ring
        .iter()
        .map(|&(r, c)| {
            let (x, y) = transform.pixel_to_geo_corner(c, r);
            Coord { x, y }
        })
        .collect();
    if let Some(&first) = coords.first() {
        coords.push(first);
    }
    LineString::new(coords)
}

fn signed_area(ls: &LineString<f64>) -> f64 {
    ls.0.windows(2)
        .map(|w| w[0].x * w[1].y - w[1].x * w[0].y)
        .sum::<f64>()
        / 2.0
}

fn assemble(rings: Vec<Vec<Vertex>>, transform: &GeoTransform) -> Vec<Polygon<f64>> {
    // Traced rings keep the region on their right in row/column space. With
    // a north-up transform that is clockwise on the map for exteriors.
    let north_up = transform.pixel_height < 0.0;
    let mut exteriors = Vec::new();
    let mut holes = Vec::new();

    for ring in rings {
        let ring = simplify(&ring);
        if ring.len() < 3 {
            continue;
        }
        let mut ls = to_linestring(&ring, transform);
        let area = signed_area(&ls);
        let is_exterior = if north_up { area < 0.0 } else { area > 0.0 };
        // Exterior CCW, holes CW
        if (is_exterior && area < 0.0) || (!is_exterior && area > 0.0) {
            ls.0.reverse();
        }
        if is_exterior {
            exteriors.push(ls);
        } else {
            holes.push(ls);
        }
    }

    let mut interiors: Vec<Vec<LineString<f64>>> = vec![Vec::new(); exteriors.len()];
    for hole in holes {
        let target = if exteriors.len() == 1 {
            Some(0)
        } else {
            Polygon::new(hole.clone(), vec![])
                .interior_point()
                .and_then(|p| {
                    exteriors
                        .iter()
                        .position(|e| Polygon::new(e.clone(), vec![]).contains(&p))
                })
        };
        if let Some(i) = target {
            interiors[i].push(hole);
        }
    }

    exteriors
        .into_iter()
        .zip(interiors)
        .map(|(e, h)| Polygon::new(e, h))
        .collect()
}
