//! Certainty labels for rate points and annual shorelines
//!
//! - **point**: ordered predicate → label rules for rate-of-change points,
//!   and the rocky-coast lookup feeding them
//! - **shoreline**: annual shoreline segments labelled from the year's
//!   certainty raster, with the 1991/1992 aerosol override

mod point;
mod shoreline;

pub use point::{
    classify_point, rocky_coast_flags, CertaintyRule, PointFacts, RockyParams, GOOD, POINT_CERTAINTY_RULES,
};
pub use shoreline::{label_shorelines, AerosolOverride, ShorelineSegment};
