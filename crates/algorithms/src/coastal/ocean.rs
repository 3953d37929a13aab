//! Connectivity of water to the open ocean

use coastlines_core::{Error, Result};
use ndarray::Array2;

use crate::morphology::{dilate, erode, select_touching, Connectivity, StructuringElement};

/// Seeds of definite ocean: the static ocean raster eroded by `erosion`
/// pixels so coastal misclassification in it does not leak inland.
pub fn ocean_seeds(ocean: &Array2<bool>, erosion: usize) -> Result<Array2<bool>> {
    if erosion == 0 {
        return Ok(ocean.clone());
    }
    erode(ocean, &StructuringElement::Disk(erosion))
}

/// Cells within `dilation` pixels of a water component touching `seeds`
pub fn ocean_connected(water: &Array2<bool>, seeds: &Array2<bool>, dilation: usize) -> Result<Array2<bool>> {
    if water.dim() != seeds.dim() {
        let ((er, ec), (ar, ac)) = (water.dim(), seeds.dim());
        return Err(Error::SizeMismatch { er, ec, ar, ac });
    }
    let connected = select_touching(water, seeds, Connectivity::Four);
    if dilation == 0 {
        return Ok(connected);
    }
    dilate(&connected, &StructuringElement::Disk(dilation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inland_lake_excluded() {
        // Sea in the right half, lake inland
        let mut water = Array2::from_elem((40, 60), false);
        let mut ocean = Array2::from_elem((40, 60), false);
        for r in 0..40 {
            for c in 35..60 {
                water[(r, c)] = true;
                ocean[(r, c)] = true;
            }
        }
        for r in 10..15 {
            for c in 5..10 {
                water[(r, c)] = true;
            }
        }
        let seeds = ocean_seeds(&ocean, 10).unwrap();
        assert!(seeds[(20, 50)]);
        assert!(!seeds[(20, 40)]);

        let connected = ocean_connected(&water, &seeds, 3).unwrap();
        assert!(connected[(20, 36)]);
        // Dilation reaches onto the beach
        assert!(connected[(20, 33)]);
        assert!(!connected[(20, 30)]);
        assert!(!connected[(12, 7)]);
    }
}
