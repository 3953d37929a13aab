//! River and narrow-channel detection

use coastlines_core::Result;
use ndarray::Array2;

use crate::morphology::{black_hat, sieve, Connectivity, StructuringElement};

/// All-time land with small islands removed, and the narrow water features
/// it encloses.
#[derive(Debug, Clone)]
pub struct RiverMasks {
    /// Land components of at least the minimum area
    pub land: Array2<bool>,
    /// Water narrower than the structuring disk, enclosed by land
    pub rivers: Array2<bool>,
}

/// Sieve land components smaller than `min_area_px` into water, then take the
/// black-top-hat of the remaining land with a disk of `radius` pixels.
pub fn river_masks(all_time_land: &Array2<bool>, min_area_px: usize, radius: usize) -> Result<RiverMasks> {
    let land = sieve(all_time_land, min_area_px, Connectivity::Four);
    let rivers = black_hat(&land, &StructuringElement::Disk(radius))?;
    Ok(RiverMasks { land, rivers })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_is_river_and_islet_is_dropped() {
        // Land block split by a 2-pixel channel, sea on the right
        let mut land = Array2::from_elem((40, 60), false);
        for r in 0..40 {
            for c in 0..30 {
                if !(19..21).contains(&r) {
                    land[(r, c)] = true;
                }
            }
        }
        land[(5, 50)] = true;
        let masks = river_masks(&land, 10, 5).unwrap();
        assert!(!masks.land[(5, 50)]);
        assert!(masks.rivers[(19, 10)]);
        assert!(masks.rivers[(20, 10)]);
        // Open sea is not a river
        assert!(!masks.rivers[(10, 45)]);
    }
}
