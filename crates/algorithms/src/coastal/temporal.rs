//! Temporal contiguity of land between consecutive years

use std::collections::HashMap;

use ndarray::{Array2, Zip};

use crate::morphology::{select_touching, Connectivity};

/// Land cells (water index below `threshold`); nodata is not land
pub fn land_mask(water_index: &Array2<f64>, threshold: f64) -> Array2<bool> {
    water_index.mapv(|v| v < threshold)
}

/// Keep, for each year, the 4-connected land components that overlap land
/// in year Y-1 or year Y+1.
///
/// `years[i]` labels `land[i]`. Neighbours are matched by year, not by
/// position: a year missing from the series contributes no land, so a
/// component next to a gap has to be confirmed by its other neighbour. A
/// lone year is returned unchanged.
pub fn temporal_contiguity(years: &[i32], land: &[Array2<bool>]) -> Vec<Array2<bool>> {
    if land.len() < 2 {
        return land.to_vec();
    }
    let by_year: HashMap<i32, &Array2<bool>> = years.iter().copied().zip(land).collect();
    years
        .iter()
        .zip(land)
        .map(|(&year, current)| {
            let prev = by_year.get(&(year - 1));
            let next = by_year.get(&(year + 1));
            let seed = match (prev, next) {
                (Some(p), Some(n)) => Zip::from(*p).and(*n).map_collect(|&a, &b| a || b),
                (Some(only), None) | (None, Some(only)) => (*only).clone(),
                (None, None) => Array2::from_elem(current.dim(), false),
            };
            select_touching(current, &seed, Connectivity::Four)
        })
        .collect()
}

/// Cells that are land in more than `fraction` of the years they were
/// observed in
pub fn all_time_land(land: &[Array2<bool>], valid: &[Array2<bool>], fraction: f64) -> Array2<bool> {
    let Some(first) = land.first() else {
        return Array2::from_elem((0, 0), false);
    };
    let shape = first.dim();
    let mut land_years = Array2::<u32>::zeros(shape);
    let mut valid_years = Array2::<u32>::zeros(shape);
    for (l, v) in land.iter().zip(valid) {
        Zip::from(&mut land_years)
            .and(&mut valid_years)
            .and(l)
            .and(v)
            .for_each(|ly, vy, &is_land, &is_valid| {
                if is_valid {
                    *vy += 1;
                    if is_land {
                        *ly += 1;
                    }
                }
            });
    }
    Zip::from(&land_years)
        .and(&valid_years)
        .map_collect(|&l, &v| v > 0 && l as f64 / v as f64 > fraction)
}
