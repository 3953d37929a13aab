//! Tide field construction on the stack geobox

use chrono::{DateTime, Utc};
use coastlines_core::{Error, GeoBox, Projection, Result};
use ndarray::{Array1, Array2, ArrayView1};
use tracing::debug;

use super::{select_anchors, TideAnchor, TideModel};
use crate::interpolation::{resample_bilinear, RbfInterpolator};

/// Parameters for tide field construction
#[derive(Debug, Clone)]
pub struct TideFieldParams {
    /// Stack pixels per coarse interpolation cell along each axis
    pub coarsen_factor: usize,
    /// Degrees added around the stack extent when selecting anchors
    pub anchor_buffer: f64,
}

impl Default for TideFieldParams {
    fn default() -> Self {
        Self {
            coarsen_factor: 50,
            anchor_buffer: 0.05,
        }
    }
}

/// Interpolates anchor tide heights over one stack geobox.
///
/// The RBF system depends only on anchor positions, so it is solved once and
/// the coarse-grid projector is reused for every timestep.
#[derive(Debug, Clone)]
pub struct TideField {
    geobox: GeoBox,
    coarse: GeoBox,
    anchors: Vec<TideAnchor>,
    /// Anchor positions in the stack CRS
    centres: Vec<(f64, f64)>,
    /// Coarse pixel centres in the stack CRS
    targets: Vec<(f64, f64)>,
    /// (coarse cells × anchors)
    projector: Array2<f64>,
}

impl TideField {
    /// Select anchors for `geobox` and prepare the interpolation.
    ///
    /// # Errors
    /// - [`Error::InsufficientTideAnchors`] with fewer than two unique anchors
    /// - [`Error::UnsupportedCrs`] when the geobox CRS cannot be projected
    pub fn new(geobox: &GeoBox, anchors: &[TideAnchor], params: &TideFieldParams) -> Result<Self> {
        if params.coarsen_factor == 0 {
            return Err(Error::InvalidParameter {
                name: "coarsen_factor",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        let anchors = select_anchors(anchors, geobox, params.anchor_buffer)?;
        let projection = Projection::from_crs(&geobox.crs)?;
        let centres: Vec<(f64, f64)> = anchors
            .iter()
            .map(|a| projection.from_lonlat(a.lon, a.lat))
            .collect();

        let coarse = geobox.coarsened(params.coarsen_factor);
        let targets: Vec<(f64, f64)> = (0..coarse.rows)
            .flat_map(|r| (0..coarse.cols).map(move |c| (c, r)))
            .map(|(c, r)| coarse.pixel_centre(c, r))
            .collect();

        let rbf = RbfInterpolator::new(&centres)?;
        let projector = rbf.projector(&targets);
        debug!(
            anchors = anchors.len(),
            coarse_rows = coarse.rows,
            coarse_cols = coarse.cols,
            "prepared tide interpolation"
        );

        Ok(Self {
            geobox: geobox.clone(),
            coarse,
            anchors,
            centres,
            targets,
            projector,
        })
    }

    pub fn anchors(&self) -> &[TideAnchor] {
        &self.anchors
    }

    pub fn geobox(&self) -> &GeoBox {
        &self.geobox
    }

    pub fn coarse_geobox(&self) -> &GeoBox {
        &self.coarse
    }

    /// Query `model` at every anchor, giving heights shaped (anchors, times)
    pub fn model_heights(&self, model: &dyn TideModel, times: &[DateTime<Utc>]) -> Result<Array2<f64>> {
        let lons: Vec<f64> = self.anchors.iter().map(|a| a.lon).collect();
        let lats: Vec<f64> = self.anchors.iter().map(|a| a.lat).collect();
        let heights = model.predict(&lons, &lats, times)?;
        if heights.dim() != (self.anchors.len(), times.len()) {
            return Err(Error::SizeMismatch {
                er: self.anchors.len(),
                ec: times.len(),
                ar: heights.nrows(),
                ac: heights.ncols(),
            });
        }
        Ok(heights)
    }

    /// Tide heights on the coarse grid for one timestep's anchor heights.
    ///
    /// Anchors with NaN heights are left out; with fewer than two remaining
    /// the whole field is NaN.
    pub fn coarse_field(&self, heights: ArrayView1<'_, f64>) -> Result<Array2<f64>> {
        if heights.len() != self.anchors.len() {
            return Err(Error::Algorithm(format!(
                "expected {} anchor heights, got {}",
                self.anchors.len(),
                heights.len()
            )));
        }

        let values = if heights.iter().all(|h| h.is_finite()) {
            self.projector.dot(&heights)
        } else {
            let (centres, finite): (Vec<(f64, f64)>, Vec<f64>) = self
                .centres
                .iter()
                .zip(heights.iter())
                .filter(|(_, h)| h.is_finite())
                .map(|(&c, &h)| (c, h))
                .unzip();
            if centres.len() < 2 {
                Array1::from_elem(self.targets.len(), f64::NAN)
            } else {
                let rbf = RbfInterpolator::new(&centres)?;
                rbf.projector(&self.targets).dot(&Array1::from(finite))
            }
        };

        values
            .into_shape_with_order((self.coarse.rows, self.coarse.cols))
            .map_err(|e| Error::Other(e.to_string()))
    }

    /// Up-sample a coarse field to the stack resolution
    pub fn upsample(&self, coarse: &Array2<f64>) -> Result<Array2<f64>> {
        resample_bilinear(coarse, &self.coarse.transform, &self.geobox)
    }

    /// Full-resolution tide field for one timestep
    pub fn field(&self, heights: ArrayView1<'_, f64>) -> Result<Array2<f64>> {
        self.upsample(&self.coarse_field(heights)?)
    }
}
