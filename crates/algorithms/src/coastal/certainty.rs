//! Per-year pixel certainty classes and their polygons

use coastlines_core::{GeoTransform, Result};
use geo_types::Polygon;
use ndarray::{Array2, Zip};

use super::MergedYear;
use crate::morphology::{dilate, sieve_classes, Connectivity, StructuringElement};
use crate::vectorize::polygonize;

/// Certainty of a composite pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CertaintyClass {
    Good = 0,
    UnstableData = 1,
    InsufficientData = 2,
}

impl CertaintyClass {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(CertaintyClass::Good),
            1 => Some(CertaintyClass::UnstableData),
            2 => Some(CertaintyClass::InsufficientData),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CertaintyClass::Good => "good",
            CertaintyClass::UnstableData => "unstable data",
            CertaintyClass::InsufficientData => "insufficient data",
        }
    }
}

/// Parameters for pixel certainty
#[derive(Debug, Clone)]
pub struct CertaintyParams {
    /// Standard deviation above which a pixel is unstable
    pub unstable_stdev: f64,
    /// Count below which a pixel has insufficient data
    pub min_observations: usize,
    /// Regions smaller than this many pixels merge into their neighbours
    pub min_region_pixels: usize,
    /// Disk radius by which flagged classes grow
    pub dilation: usize,
}

impl Default for CertaintyParams {
    fn default() -> Self {
        Self {
            unstable_stdev: 0.3,
            min_observations: 5,
            min_region_pixels: 128,
            dilation: 3,
        }
    }
}

/// Classify each pixel of a merged year.
///
/// Insufficient data (count below the minimum, or nodata) overrides unstable
/// data. After sieving small regions, both flagged classes are dilated, with
/// insufficient data winning where they meet.
pub fn certainty_classes(merged: &MergedYear, params: &CertaintyParams) -> Result<Array2<u8>> {
    let min_obs = params.min_observations as f64;
    let raw = Zip::from(&merged.count).and(&merged.stdev).map_collect(|&n, &s| {
        if n.is_nan() || n < min_obs {
            CertaintyClass::InsufficientData.code()
        } else if s > params.unstable_stdev {
            CertaintyClass::UnstableData.code()
        } else {
            CertaintyClass::Good.code()
        }
    });

    let sieved = if params.min_region_pixels > 1 {
        sieve_classes(&raw, params.min_region_pixels, Connectivity::Four)
    } else {
        raw
    };
    if params.dilation == 0 {
        return Ok(sieved);
    }

    let element = StructuringElement::Disk(params.dilation);
    let insufficient = dilate(&sieved.mapv(|c| c == CertaintyClass::InsufficientData.code()), &element)?;
    let unstable = dilate(&sieved.mapv(|c| c == CertaintyClass::UnstableData.code()), &element)?;

    Ok(Zip::from(&insufficient).and(&unstable).map_collect(|&i, &u| {
        if i {
            CertaintyClass::InsufficientData.code()
        } else if u {
            CertaintyClass::UnstableData.code()
        } else {
            CertaintyClass::Good.code()
        }
    }))
}

/// Polygons partitioning the grid by certainty class
pub fn certainty_polygons(classes: &Array2<u8>, transform: &GeoTransform) -> Vec<(CertaintyClass, Polygon<f64>)> {
    polygonize(classes, transform, &[])
        .into_iter()
        .filter_map(|(code, poly)| CertaintyClass::from_code(code).map(|c| (c, poly)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::Area;

    fn merged(count: f64, stdev: f64) -> MergedYear {
        MergedYear {
            year: 2010,
            water_index: Array2::zeros((40, 40)),
            stdev: Array2::from_elem((40, 40), stdev),
            count: Array2::from_elem((40, 40), count),
        }
    }

    #[test]
    fn test_insufficient_overrides_unstable() {
        let mut m = merged(10.0, 0.05);
        for r in 0..20 {
            for c in 0..20 {
                m.stdev[(r, c)] = 0.5;
            }
        }
        for r in 10..30 {
            for c in 10..30 {
                m.count[(r, c)] = 2.0;
            }
        }
        let classes = certainty_classes(&m, &CertaintyParams::default()).unwrap();
        assert_eq!(classes[(15, 15)], CertaintyClass::InsufficientData.code());
        assert_eq!(classes[(2, 2)], CertaintyClass::UnstableData.code());
        assert_eq!(classes[(38, 38)], CertaintyClass::Good.code());
        // Insufficient region grows by the dilation radius
        assert_eq!(classes[(32, 20)], CertaintyClass::InsufficientData.code());
        assert_eq!(classes[(34, 20)], CertaintyClass::Good.code());
    }

    #[test]
    fn test_small_flagged_region_sieved_away() {
        let mut m = merged(10.0, 0.05);
        m.stdev[(20, 20)] = 0.9;
        let classes = certainty_classes(&m, &CertaintyParams::default()).unwrap();
        assert!(classes.iter().all(|&c| c == CertaintyClass::Good.code()));
    }

    #[test]
    fn test_noisy_year_is_entirely_unstable() {
        let m = merged(20.0, 0.6);
        let classes = certainty_classes(&m, &CertaintyParams::default()).unwrap();
        let t = GeoTransform::new(0.0, 1200.0, 30.0, -30.0);
        let polys = certainty_polygons(&classes, &t);
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].0, CertaintyClass::UnstableData);
        assert_relative_eq!(polys[0].1.unsigned_area(), 1600.0 * 900.0);
    }
}
