//! Tide anchor selection

use coastlines_core::{Error, GeoBox, Result};

/// A location at which the tide model is queried
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TideAnchor {
    pub lon: f64,
    pub lat: f64,
}

impl TideAnchor {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Anchors inside the geobox's lon/lat extent grown by `buffer_deg`, with
/// duplicate locations removed.
///
/// # Errors
/// [`Error::InsufficientTideAnchors`] when fewer than two unique locations
/// remain.
pub fn select_anchors(anchors: &[TideAnchor], geobox: &GeoBox, buffer_deg: f64) -> Result<Vec<TideAnchor>> {
    let (min_lon, min_lat, max_lon, max_lat) = geobox.lonlat_bounds()?;
    let inside = |a: &TideAnchor| {
        a.lon >= min_lon - buffer_deg
            && a.lon <= max_lon + buffer_deg
            && a.lat >= min_lat - buffer_deg
            && a.lat <= max_lat + buffer_deg
    };

    let mut selected: Vec<TideAnchor> = Vec::new();
    for a in anchors.iter().filter(|a| a.lon.is_finite() && a.lat.is_finite() && inside(a)) {
        let duplicate = selected
            .iter()
            .any(|s| (s.lon - a.lon).abs() < 1e-9 && (s.lat - a.lat).abs() < 1e-9);
        if !duplicate {
            selected.push(*a);
        }
    }

    if selected.len() < 2 {
        return Err(Error::InsufficientTideAnchors {
            found: selected.len(),
        });
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coastlines_core::{GeoTransform, CRS};

    fn geobox() -> GeoBox {
        GeoBox::new(GeoTransform::new(150.0, -30.0, 0.01, -0.01), 20, 20, CRS::wgs84())
    }

    #[test]
    fn test_buffer_and_duplicates() {
        let anchors = [
            TideAnchor::new(150.1, -30.1),
            TideAnchor::new(150.1, -30.1),
            TideAnchor::new(149.97, -30.05), // inside the 0.05° buffer
            TideAnchor::new(149.90, -30.05), // outside
        ];
        let selected = select_anchors(&anchors, &geobox(), 0.05).unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_single_unique_anchor_is_insufficient() {
        let anchors = [TideAnchor::new(150.1, -30.1), TideAnchor::new(150.1, -30.1)];
        let err = select_anchors(&anchors, &geobox(), 0.05).unwrap_err();
        assert!(matches!(err, Error::InsufficientTideAnchors { found: 1 }));
    }
}
