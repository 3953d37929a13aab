//! Raster to vector conversion
//!
//! - **contour**: sub-pixel iso-lines by marching squares
//! - **polygonize**: class regions to polygons along pixel edges
//! - **shoreline**: annual shorelines from masked water index rasters

mod contour;
mod polygonize;
mod shoreline;

pub use contour::contour_lines;
pub use polygonize::polygonize;
pub use shoreline::{extract_shorelines, ShorelineExtraction, ShorelineInput, ShorelineParams};
