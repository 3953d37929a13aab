//! Ellipsoidal geodesy and spatial identifiers

pub mod geohash;
mod vincenty;

pub use vincenty::{axial_bearing, inverse, Ellipsoid, Geodesic};
