//! Connected-component labelling and sieving
//!
//! Labels are assigned in raster scan order starting from 1; 0 marks
//! background. Components are grown with an explicit stack so large water
//! bodies do not recurse.

use ndarray::Array2;

/// Pixel adjacency used when growing components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// Edge neighbours only
    #[default]
    Four,
    /// Edge and corner neighbours
    Eight,
}

impl Connectivity {
    fn offsets(self) -> &'static [(isize, isize)] {
        const FOUR: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        const EIGHT: [(isize, isize); 8] = [
            (-1, -1),
            (-1, 0),
            (-1, 1),
            (0, -1),
            (0, 1),
            (1, -1),
            (1, 0),
            (1, 1),
        ];
        match self {
            Connectivity::Four => &FOUR,
            Connectivity::Eight => &EIGHT,
        }
    }
}

/// Result of labelling a mask
#[derive(Debug, Clone)]
pub struct Labels {
    /// Component id per cell, 0 for background
    pub ids: Array2<u32>,
    /// Cell count per component; index 0 is unused
    pub sizes: Vec<usize>,
}

impl Labels {
    pub fn count(&self) -> usize {
        self.sizes.len().saturating_sub(1)
    }
}

fn neighbours(
    (r, c): (usize, usize),
    (rows, cols): (usize, usize),
    connectivity: Connectivity,
) -> impl Iterator<Item = (usize, usize)> {
    connectivity.offsets().iter().filter_map(move |&(dr, dc)| {
        let nr = r as isize + dr;
        let nc = c as isize + dc;
        if nr < 0 || nc < 0 || nr as usize >= rows || nc as usize >= cols {
            None
        } else {
            Some((nr as usize, nc as usize))
        }
    })
}

/// Label cells that share a key; `key` returns `None` for background
fn label_by<K, F>(shape: (usize, usize), connectivity: Connectivity, key: F) -> Labels
where
    K: PartialEq,
    F: Fn((usize, usize)) -> Option<K>,
{
    let mut ids = Array2::<u32>::zeros(shape);
    let mut sizes = vec![0usize];
    let mut stack = Vec::new();

    for r in 0..shape.0 {
        for c in 0..shape.1 {
            if ids[(r, c)] != 0 {
                continue;
            }
            let Some(k) = key((r, c)) else { continue };

            let id = sizes.len() as u32;
            let mut size = 0usize;
            ids[(r, c)] = id;
            stack.push((r, c));

            while let Some(cell) = stack.pop() {
                size += 1;
                for n in neighbours(cell, shape, connectivity) {
                    if ids[n] == 0 && key(n).as_ref() == Some(&k) {
                        ids[n] = id;
                        stack.push(n);
                    }
                }
            }
            sizes.push(size);
        }
    }

    Labels { ids, sizes }
}

/// Label the `true` regions of a mask
pub fn label(mask: &Array2<bool>, connectivity: Connectivity) -> Labels {
    label_by(mask.dim(), connectivity, |idx| mask[idx].then_some(()))
}

/// Label regions of equal class value
pub fn label_classes(classes: &Array2<u8>, connectivity: Connectivity) -> Labels {
    label_by(classes.dim(), connectivity, |idx| Some(classes[idx]))
}

/// Drop `true` components smaller than `min_size` cells
pub fn sieve(mask: &Array2<bool>, min_size: usize, connectivity: Connectivity) -> Array2<bool> {
    let labels = label(mask, connectivity);
    labels.ids.mapv(|id| id != 0 && labels.sizes[id as usize] >= min_size)
}

/// Keep only the `true` components that touch at least one `seed` cell
pub fn select_touching(
    mask: &Array2<bool>,
    seed: &Array2<bool>,
    connectivity: Connectivity,
) -> Array2<bool> {
    let labels = label(mask, connectivity);
    let mut keep = vec![false; labels.sizes.len()];
    for (&id, &s) in labels.ids.iter().zip(seed.iter()) {
        if id != 0 && s {
            keep[id as usize] = true;
        }
    }
    labels.ids.mapv(|id| id != 0 && keep[id as usize])
}

/// Merge class regions smaller than `min_size` cells into the neighbouring
/// class they share the longest border with.
///
/// Regions are visited smallest first; a region with no neighbours (the
/// whole grid) is left alone.
pub fn sieve_classes(classes: &Array2<u8>, min_size: usize, connectivity: Connectivity) -> Array2<u8> {
    let shape = classes.dim();
    let mut out = classes.clone();
    let labels = label_classes(classes, connectivity);

    let mut members: Vec<Vec<(usize, usize)>> = vec![Vec::new(); labels.sizes.len()];
    for (idx, &id) in labels.ids.indexed_iter() {
        members[id as usize].push(idx);
    }

    let mut small: Vec<usize> = (1..labels.sizes.len())
        .filter(|&id| labels.sizes[id] < min_size)
        .collect();
    small.sort_by_key(|&id| labels.sizes[id]);

    for id in small {
        let mut votes = [0usize; 256];
        let own = out[members[id][0]];
        for &cell in &members[id] {
            for n in neighbours(cell, shape, Connectivity::Four) {
                if labels.ids[n] as usize != id {
                    votes[out[n] as usize] += 1;
                }
            }
        }
        votes[own as usize] = 0;
        let (best, &count) = votes
            .iter()
            .enumerate()
            .max_by_key(|&(class, &v)| (v, std::cmp::Reverse(class)))
            .unwrap_or((own as usize, &0));
        if count > 0 {
            for &cell in &members[id] {
                out[cell] = best as u8;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(rows: &[&str]) -> Array2<bool> {
        let h = rows.len();
        let w = rows[0].len();
        Array2::from_shape_fn((h, w), |(r, c)| rows[r].as_bytes()[c] == b'#')
    }

    #[test]
    fn test_label_connectivity() {
        let m = mask_from(&["#..", ".#.", "..#"]);
        assert_eq!(label(&m, Connectivity::Four).count(), 3);
        assert_eq!(label(&m, Connectivity::Eight).count(), 1);
    }

    #[test]
    fn test_sieve_drops_small() {
        let m = mask_from(&["##...", "##...", ".....", "....#"]);
        let s = sieve(&m, 2, Connectivity::Four);
        assert!(s[(0, 0)] && s[(1, 1)]);
        assert!(!s[(3, 4)]);
    }

    #[test]
    fn test_select_touching() {
        let m = mask_from(&["##..#", "##..#", "....#"]);
        let mut seed = Array2::from_elem((3, 5), false);
        seed[(2, 4)] = true;
        let kept = select_touching(&m, &seed, Connectivity::Four);
        assert!(kept[(0, 4)]);
        assert!(!kept[(0, 0)]);
    }

    #[test]
    fn test_sieve_classes_merges_into_majority() {
        let mut classes = Array2::from_elem((6, 6), 0u8);
        classes[(2, 2)] = 1;
        for c in 0..6 {
            classes[(5, c)] = 2;
        }
        let out = sieve_classes(&classes, 3, Connectivity::Four);
        assert_eq!(out[(2, 2)], 0);
        // Large enough to survive
        assert_eq!(out[(5, 0)], 2);
    }
}
