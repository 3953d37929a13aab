//! 2D k-d tree over rate point locations
//!
//! Reference:
//! Bentley, J.L. (1975). Multidimensional binary search trees used
//! for associative searching. CACM, 18(9).

use geo_types::Point;

#[derive(Debug)]
struct Node {
    /// Index into the caller's point slice
    point: usize,
    /// Split dimension: 0 = x, 1 = y
    axis: u8,
    left: Option<usize>,
    right: Option<usize>,
}

/// Static spatial index answering fixed-radius queries
#[derive(Debug)]
pub struct PointIndex {
    nodes: Vec<Node>,
    coords: Vec<(f64, f64)>,
}

impl PointIndex {
    /// Build with median splits, O(n log² n)
    pub fn build(points: &[Point<f64>]) -> Self {
        let coords: Vec<(f64, f64)> = points.iter().map(|p| (p.x(), p.y())).collect();
        let mut nodes = Vec::with_capacity(coords.len());
        let mut order: Vec<usize> = (0..coords.len()).collect();
        if !order.is_empty() {
            build(&coords, &mut order, 0, &mut nodes);
        }
        Self { nodes, coords }
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Indices of the points within `radius` of (x, y), ascending
    pub fn within_radius(&self, x: f64, y: f64, radius: f64) -> Vec<usize> {
        let mut found = Vec::new();
        if !self.nodes.is_empty() && radius >= 0.0 {
            self.search(0, (x, y), radius * radius, &mut found);
        }
        found.sort_unstable();
        found
    }

    fn search(&self, node: usize, q: (f64, f64), radius_sq: f64, found: &mut Vec<usize>) {
        let node = &self.nodes[node];
        let p = self.coords[node.point];
        let (dx, dy) = (q.0 - p.0, q.1 - p.1);
        if dx * dx + dy * dy <= radius_sq {
            found.push(node.point);
        }

        // Signed offset of the query from the splitting plane
        let diff = if node.axis == 0 { dx } else { dy };
        let plane_in_reach = diff * diff <= radius_sq;
        if let Some(left) = node.left {
            if diff <= 0.0 || plane_in_reach {
                self.search(left, q, radius_sq, found);
            }
        }
        if let Some(right) = node.right {
            if diff >= 0.0 || plane_in_reach {
                self.search(right, q, radius_sq, found);
            }
        }
    }
}

fn build(coords: &[(f64, f64)], order: &mut [usize], depth: usize, nodes: &mut Vec<Node>) -> usize {
    let axis = (depth % 2) as u8;
    let key = |i: usize| if axis == 0 { coords[i].0 } else { coords[i].1 };
    order.sort_by(|&a, &b| key(a).partial_cmp(&key(b)).unwrap_or(std::cmp::Ordering::Equal));

    let median = order.len() / 2;
    let idx = nodes.len();
    nodes.push(Node {
        point: order[median],
        axis,
        left: None,
        right: None,
    });

    let (below, rest) = order.split_at_mut(median);
    let above = &mut rest[1..];
    if !below.is_empty() {
        let left = build(coords, below, depth + 1, nodes);
        nodes[idx].left = Some(left);
    }
    if !above.is_empty() {
        let right = build(coords, above, depth + 1, nodes);
        nodes[idx].right = Some(right);
    }
    idx
}
