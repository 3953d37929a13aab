//! Annual shoreline extraction

use std::collections::BTreeMap;

use coastlines_core::{Algorithm, Error, GeoTransform, Result};
use geo_types::MultiLineString;
use tracing::{debug, warn};

use super::contour_lines;
use crate::coastal::MaskedYear;
use crate::maybe_rayon::*;

/// Parameters for shoreline extraction
#[derive(Debug, Clone)]
pub struct ShorelineParams {
    /// Water index level traced as the shoreline
    pub index_threshold: f64,
    /// Lines with fewer vertices are discarded as noise
    pub min_vertices: usize,
}

impl Default for ShorelineParams {
    fn default() -> Self {
        Self {
            index_threshold: 0.0,
            min_vertices: 10,
        }
    }
}

/// Masked years on a common grid
#[derive(Debug, Clone)]
pub struct ShorelineInput {
    pub years: Vec<MaskedYear>,
    pub transform: GeoTransform,
}

/// Shoreline extraction stage
#[derive(Debug, Clone, Default)]
pub struct ShorelineExtraction;

impl Algorithm for ShorelineExtraction {
    type Input = ShorelineInput;
    type Output = BTreeMap<i32, MultiLineString<f64>>;
    type Params = ShorelineParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "ShorelineExtraction"
    }

    fn description(&self) -> &'static str {
        "Trace sub-pixel annual shorelines from masked water index rasters"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        extract_shorelines(&input.years, &input.transform, &params)
    }
}

/// Contour every masked year at the index threshold.
///
/// Years without any line are skipped with a warning.
///
/// # Errors
/// [`Error::NoShorelines`] when no year yields a line.
pub fn extract_shorelines(
    years: &[MaskedYear],
    transform: &GeoTransform,
    params: &ShorelineParams,
) -> Result<BTreeMap<i32, MultiLineString<f64>>> {
    let traced: Vec<(i32, MultiLineString<f64>)> = years
        .into_par_iter()
        .map(|y| {
            let lines = contour_lines(&y.water_index, transform, params.index_threshold, params.min_vertices);
            (y.year, lines)
        })
        .collect();

    let mut out = BTreeMap::new();
    for (year, lines) in traced {
        if lines.0.is_empty() {
            warn!(year, "no shorelines extracted, skipping year");
            continue;
        }
        debug!(year, lines = lines.0.len(), "extracted shorelines");
        out.insert(year, lines);
    }

    if out.is_empty() {
        return Err(Error::NoShorelines {
            threshold: params.index_threshold,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn masked(year: i32, values: Array2<f64>) -> MaskedYear {
        let shape = values.dim();
        MaskedYear {
            year,
            water_index: values,
            certainty: Array2::zeros(shape),
        }
    }

    #[test]
    fn test_empty_year_skipped() {
        let t = GeoTransform::new(0.0, 600.0, 30.0, -30.0);
        let step = Array2::from_shape_fn((20, 20), |(_, c)| c as f64 - 9.5);
        let flat = Array2::from_elem((20, 20), f64::NAN);
        let lines = extract_shorelines(
            &[masked(2000, step), masked(2001, flat)],
            &t,
            &ShorelineParams::default(),
        )
        .unwrap();
        assert_eq!(lines.keys().copied().collect::<Vec<_>>(), vec![2000]);
    }

    #[test]
    fn test_no_lines_at_all() {
        let t = GeoTransform::new(0.0, 600.0, 30.0, -30.0);
        let flat = Array2::from_elem((20, 20), 0.3);
        let err = extract_shorelines(&[masked(2000, flat)], &t, &ShorelineParams::default()).unwrap_err();
        assert!(matches!(err, Error::NoShorelines { .. }));
    }
}
