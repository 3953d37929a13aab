//! Polygon lookup layers: the analysis grid and region attributes

use std::path::Path;

use coastlines_core::io::read_geojson;
use coastlines_core::{AttributeValue, Feature, CRS};
use geo::{Contains, Intersects};
use geo_types::{Geometry, MultiPolygon, Point};

use crate::error::{PipelineError, Result};

fn polygonal(feature: &Feature) -> Option<MultiPolygon<f64>> {
    match feature.geometry.as_ref()? {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        _ => None,
    }
}

fn text(value: &AttributeValue) -> Option<String> {
    match value {
        AttributeValue::String(s) => Some(s.clone()),
        AttributeValue::Int(i) => Some(i.to_string()),
        AttributeValue::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        _ => None,
    }
}

/// Keyed polygons read from a GeoJSON layer
fn keyed_polygons(path: &Path, key: &str) -> Result<(Vec<(String, MultiPolygon<f64>)>, Option<CRS>)> {
    if !path.is_file() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }
    let fc = read_geojson(path)?;
    let crs = fc.crs.clone();
    let mut out = Vec::with_capacity(fc.len());
    for feature in fc.iter() {
        let (Some(id), Some(geometry)) = (feature.get_property(key).and_then(text), polygonal(feature)) else {
            return Err(coastlines_core::Error::Vector(format!(
                "{}: every feature needs a polygon and a '{}' attribute",
                path.display(),
                key
            ))
            .into());
        };
        out.push((id, geometry));
    }
    Ok((out, crs))
}

/// One cell of the analysis grid
#[derive(Debug, Clone)]
pub struct Tile {
    pub id: String,
    pub extent: MultiPolygon<f64>,
}

impl Tile {
    pub fn contains(&self, point: &Point<f64>) -> bool {
        self.extent.intersects(point)
    }
}

/// The analysis grid, one independent job per tile
#[derive(Debug, Clone)]
pub struct Grid {
    tiles: Vec<Tile>,
    crs: Option<CRS>,
}

impl Grid {
    /// Read a grid layer whose polygons carry an `id` attribute
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let (cells, crs) = keyed_polygons(path.as_ref(), "id")?;
        let tiles = cells.into_iter().map(|(id, extent)| Tile { id, extent }).collect();
        Ok(Self { tiles, crs })
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    pub fn tile(&self, id: &str) -> Result<&Tile> {
        self.tiles
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| PipelineError::UnknownTile(id.to_string()))
    }

    /// The requested tiles, or every tile when none are named
    pub fn select(&self, ids: &[String]) -> Result<Vec<&Tile>> {
        if ids.is_empty() {
            return Ok(self.tiles.iter().collect());
        }
        ids.iter().map(|id| self.tile(id)).collect()
    }
}

/// Region polygons assigning `id_primary` to features
#[derive(Debug, Clone, Default)]
pub struct Regions {
    regions: Vec<(String, MultiPolygon<f64>)>,
}

impl Regions {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let (regions, _) = keyed_polygons(path.as_ref(), "id_primary")?;
        Ok(Self { regions })
    }

    /// Regions from an optional layer; empty when none is configured
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Identifier of the first region containing `point`, empty if none
    pub fn id_primary(&self, point: &Point<f64>) -> String {
        self.regions
            .iter()
            .find(|(_, area)| area.contains(point))
            .map(|(id, _)| id.clone())
            .unwrap_or_default()
    }
}
