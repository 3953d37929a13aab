//! Raster data structures and operations

mod element;
mod geobox;
mod geotransform;
mod grid;

pub use element::RasterElement;
pub use geobox::GeoBox;
pub use geotransform::GeoTransform;
pub use grid::Raster;
