//! # Coastlines Algorithms
//!
//! Stages of the annual shoreline and rates-of-change pipeline.
//!
//! ## Stage Modules
//!
//! - **tide**: tide anchors, tide model seam, per-timestep tide height fields
//! - **composite**: tide cutoffs, annual and three-year gapfill composites
//! - **coastal**: merge, temporal, river, ocean and buffer masks; pixel certainty
//! - **vectorize**: sub-pixel contours and class polygons
//! - **rates**: baseline points, annual movements, rate statistics
//! - **certainty**: point and shoreline certainty labels
//! - **hotspots**: neighbourhood aggregates of rates of change
//!
//! ## Building Blocks
//!
//! - **morphology**: binary morphology and connected components
//! - **interpolation**: RBF and bilinear resampling
//! - **statistics**: robust, regression and circular statistics
//! - **geodesy**: Vincenty bearings and geohash identifiers

pub mod certainty;
pub mod coastal;
pub mod composite;
pub mod geodesy;
pub mod hotspots;
pub mod interpolation;
pub(crate) mod maybe_rayon;
pub mod morphology;
pub mod rates;
pub mod statistics;
pub mod tide;
pub mod vectorize;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::certainty::{
        classify_point, label_shorelines, AerosolOverride, PointFacts, RockyParams, ShorelineSegment,
    };
    pub use crate::coastal::{
        coastal_masks, merge_gapfill, CertaintyClass, CoastalInput, CoastalMasker, CoastalMasks, CoastalParams,
        MaskedYear, MergedYear,
    };
    pub use crate::composite::{
        select_observation, tide_cutoffs, Composite, CutoffParams, Observation, StreamingCompositor,
        YearBatch, YearComposites,
    };
    pub use crate::hotspots::{hotspots, HotspotLayer, HotspotParams, HotspotPoint, Hotspots, SourcePoint};
    pub use crate::rates::{rates_of_change, RateParams, RatePoint, RatesInput, RatesOfChange};
    pub use crate::tide::{select_anchors, TideAnchor, TideField, TideFieldParams, TideModel};
    pub use crate::vectorize::{extract_shorelines, ShorelineExtraction, ShorelineInput, ShorelineParams};
    pub use coastlines_core::prelude::*;
}
