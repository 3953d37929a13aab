//! Annual / gapfill merge

use coastlines_core::{Error, Result};
use ndarray::{Array2, Zip};

use crate::composite::{Composite, COUNT_NODATA};

/// Water index, spread and support of one year after gapfilling
#[derive(Debug, Clone)]
pub struct MergedYear {
    pub year: i32,
    /// NaN where nodata
    pub water_index: Array2<f64>,
    pub stdev: Array2<f64>,
    /// Valid observation count, NaN where nodata
    pub count: Array2<f64>,
}

impl MergedYear {
    pub fn shape(&self) -> (usize, usize) {
        self.water_index.dim()
    }
}

fn count_value(c: i16) -> f64 {
    if c == COUNT_NODATA {
        f64::NAN
    } else {
        c as f64
    }
}

/// Replace poorly observed pixels of `annual` with the gapfill composite.
///
/// Pixels with fewer than `min_observations` annual observations take all
/// three gapfill bands. Pixels whose merged count is `max_nodata_count` or
/// less lose their water index.
pub fn merge_gapfill(
    year: i32,
    annual: &Composite,
    gapfill: Option<&Composite>,
    min_observations: usize,
    max_nodata_count: usize,
) -> Result<MergedYear> {
    if let Some(g) = gapfill {
        if g.shape() != annual.shape() {
            let ((er, ec), (ar, ac)) = (annual.shape(), g.shape());
            return Err(Error::SizeMismatch { er, ec, ar, ac });
        }
    }

    let mut water_index = annual.water_index.mapv(|v| v as f64);
    let mut stdev = annual.stdev.mapv(|v| v as f64);
    let mut count = annual.count.mapv(count_value);

    if let Some(g) = gapfill {
        let min_obs = min_observations as f64;
        Zip::from(&mut water_index)
            .and(&mut stdev)
            .and(&mut count)
            .and(&g.water_index)
            .and(&g.stdev)
            .and(&g.count)
            .for_each(|w, s, n, &gw, &gs, &gn| {
                let annual_count = if n.is_nan() { 0.0 } else { *n };
                if annual_count < min_obs {
                    *w = gw as f64;
                    *s = gs as f64;
                    *n = count_value(gn);
                }
            });
    }

    let limit = max_nodata_count as f64;
    Zip::from(&mut water_index).and(&count).for_each(|w, &n| {
        if n.is_nan() || n <= limit {
            *w = f64::NAN;
        }
    });

    Ok(MergedYear {
        year,
        water_index,
        stdev,
        count,
    })
}
