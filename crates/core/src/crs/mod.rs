//! Coordinate Reference System handling

mod projection;

pub use projection::{AlbersEqualArea, Projection};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate reference system, identified by its EPSG code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CRS {
    epsg: u32,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self { epsg: code }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// GDA94 / Australian Albers (EPSG:3577), the continental analysis CRS
    pub fn australian_albers() -> Self {
        Self::from_epsg(3577)
    }

    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// GDA94 geographic and WGS84 are treated as the same datum
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        let canonical = |code: u32| if code == 4283 { 4326 } else { code };
        canonical(self.epsg) == canonical(other.epsg)
    }

    /// Fail with [`Error::CrsMismatch`] unless both CRS are equivalent
    pub fn ensure_same(&self, other: &CRS) -> Result<()> {
        if self.is_equivalent(other) {
            Ok(())
        } else {
            Err(Error::CrsMismatch(self.identifier(), other.identifier()))
        }
    }

    pub fn identifier(&self) -> String {
        format!("EPSG:{}", self.epsg)
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for CRS {
    fn default() -> Self {
        Self::australian_albers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_epsg() {
        let crs = CRS::from_epsg(4326);
        assert_eq!(crs.epsg(), 4326);
        assert_eq!(crs.identifier(), "EPSG:4326");
    }

    #[test]
    fn test_crs_equivalence() {
        let a = CRS::from_epsg(4326);
        let b = CRS::wgs84();
        assert!(a.is_equivalent(&b));
        assert!(a.ensure_same(&CRS::australian_albers()).is_err());
        assert!(CRS::from_epsg(4283).is_equivalent(&b));
    }
}
