//! Forward and inverse map projections for the supported analysis CRS
//!
//! Only the handful of CRS the pipeline actually meets are implemented:
//! - EPSG:4326 geographic (identity)
//! - EPSG:3577 GDA94 / Australian Albers (ellipsoidal Albers equal-area conic)
//!
//! GDA94 and WGS84 are treated as coincident (sub-metre difference).
//!
//! Reference:
//! Snyder, J.P. (1987). Map Projections: A Working Manual. USGS PP 1395, §14.

use super::CRS;
use crate::error::{Error, Result};

/// GRS80 semi-major axis (m)
const GRS80_A: f64 = 6_378_137.0;
/// GRS80 flattening
const GRS80_F: f64 = 1.0 / 298.257_222_101;

/// Parameters of an ellipsoidal Albers equal-area conic projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlbersEqualArea {
    pub semi_major: f64,
    pub flattening: f64,
    /// First standard parallel (degrees)
    pub lat_1: f64,
    /// Second standard parallel (degrees)
    pub lat_2: f64,
    /// Latitude of origin (degrees)
    pub lat_0: f64,
    /// Central meridian (degrees)
    pub lon_0: f64,
    pub false_easting: f64,
    pub false_northing: f64,
}

impl AlbersEqualArea {
    /// EPSG:3577 parameters
    pub fn australian() -> Self {
        Self {
            semi_major: GRS80_A,
            flattening: GRS80_F,
            lat_1: -18.0,
            lat_2: -36.0,
            lat_0: 0.0,
            lon_0: 132.0,
            false_easting: 0.0,
            false_northing: 0.0,
        }
    }

    fn eccentricity(&self) -> f64 {
        (2.0 * self.flattening - self.flattening * self.flattening).sqrt()
    }

    fn q(&self, phi: f64) -> f64 {
        let e = self.eccentricity();
        let e2 = e * e;
        let s = phi.sin();
        (1.0 - e2)
            * (s / (1.0 - e2 * s * s) - (1.0 / (2.0 * e)) * ((1.0 - e * s) / (1.0 + e * s)).ln())
    }

    fn m(&self, phi: f64) -> f64 {
        let e2 = self.eccentricity().powi(2);
        let s = phi.sin();
        phi.cos() / (1.0 - e2 * s * s).sqrt()
    }

    /// Cone constants (n, C, rho_0)
    fn constants(&self) -> (f64, f64, f64) {
        let phi1 = self.lat_1.to_radians();
        let phi2 = self.lat_2.to_radians();
        let phi0 = self.lat_0.to_radians();
        let (m1, m2) = (self.m(phi1), self.m(phi2));
        let (q1, q2, q0) = (self.q(phi1), self.q(phi2), self.q(phi0));
        let n = (m1 * m1 - m2 * m2) / (q2 - q1);
        let c = m1 * m1 + n * q1;
        let rho0 = self.semi_major * (c - n * q0).sqrt() / n;
        (n, c, rho0)
    }

    fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (n, c, rho0) = self.constants();
        let q = self.q(lat.to_radians());
        let rho = self.semi_major * (c - n * q).max(0.0).sqrt() / n;
        let theta = n * (lon - self.lon_0).to_radians();
        (
            self.false_easting + rho * theta.sin(),
            self.false_northing + rho0 - rho * theta.cos(),
        )
    }

    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let (n, c, rho0) = self.constants();
        let e = self.eccentricity();
        let e2 = e * e;
        let dx = x - self.false_easting;
        let dy = rho0 - (y - self.false_northing);

        // rho and theta take the sign of n (southern-hemisphere cones have n < 0)
        let sign = n.signum();
        let rho = sign * (dx * dx + dy * dy).sqrt();
        let theta = (sign * dx).atan2(sign * dy);
        let q = (c - (rho * n / self.semi_major).powi(2)) / n;

        let mut phi = (q / 2.0).clamp(-1.0, 1.0).asin();
        for _ in 0..25 {
            let s = phi.sin();
            let one_minus = 1.0 - e2 * s * s;
            let delta = one_minus * one_minus / (2.0 * phi.cos())
                * (q / (1.0 - e2) - s / one_minus
                    + (1.0 / (2.0 * e)) * ((1.0 - e * s) / (1.0 + e * s)).ln());
            phi += delta;
            if delta.abs() < 1e-12 {
                break;
            }
        }

        let lon = self.lon_0 + (theta / n).to_degrees();
        (lon, phi.to_degrees())
    }
}

/// A projection between a map CRS and geographic longitude/latitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Coordinates already are longitude/latitude degrees
    Geographic,
    /// Ellipsoidal Albers equal-area conic
    Albers(AlbersEqualArea),
}

impl Projection {
    /// Resolve the projection for a CRS
    pub fn from_crs(crs: &CRS) -> Result<Self> {
        match crs.epsg() {
            4326 | 4283 => Ok(Projection::Geographic),
            3577 => Ok(Projection::Albers(AlbersEqualArea::australian())),
            _ => Err(Error::UnsupportedCrs(crs.identifier())),
        }
    }

    /// Map coordinates to (longitude, latitude) in degrees
    pub fn to_lonlat(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Projection::Geographic => (x, y),
            Projection::Albers(p) => p.inverse(x, y),
        }
    }

    /// (longitude, latitude) in degrees to map coordinates
    pub fn from_lonlat(&self, lon: f64, lat: f64) -> (f64, f64) {
        match self {
            Projection::Geographic => (lon, lat),
            Projection::Albers(p) => p.forward(lon, lat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_albers_origin() {
        let p = Projection::from_crs(&CRS::australian_albers()).unwrap();
        let (x, y) = p.from_lonlat(132.0, 0.0);
        assert_relative_eq!(x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_albers_quadrants() {
        let p = Projection::from_crs(&CRS::australian_albers()).unwrap();
        // Sydney lies east of the central meridian and well south of the equator
        let (x, y) = p.from_lonlat(151.2, -33.9);
        assert!(x > 1_500_000.0 && x < 2_000_000.0, "x = {}", x);
        assert!(y < -3_500_000.0 && y > -4_200_000.0, "y = {}", y);
    }

    #[test]
    fn test_albers_roundtrip() {
        let p = Projection::from_crs(&CRS::australian_albers()).unwrap();
        for &(lon, lat) in &[(115.86, -31.95), (153.4, -28.0), (130.8, -12.46), (147.3, -42.9)] {
            let (x, y) = p.from_lonlat(lon, lat);
            let (lon2, lat2) = p.to_lonlat(x, y);
            assert_relative_eq!(lon, lon2, epsilon = 1e-8);
            assert_relative_eq!(lat, lat2, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_unsupported_crs() {
        assert!(Projection::from_crs(&CRS::from_epsg(32755)).is_err());
        assert!(Projection::from_crs(&CRS::from_epsg(3857)).is_err());
    }
}
