//! Attributed vector features
//!
//! Geometries are `geo-types` values in the layer's CRS; attributes keep
//! insertion order so written layers have a stable column order.

use crate::crs::CRS;
use geo_types::Geometry;
use serde::{Deserialize, Serialize};

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Float view; NaN for null/non-numeric values
    pub fn as_f64(&self) -> f64 {
        match self {
            AttributeValue::Int(v) => *v as f64,
            AttributeValue::Float(v) => *v,
            _ => f64::NAN,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(v) => Some(*v),
            AttributeValue::Float(v) if v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }

    /// Float attribute with NaN written as null
    pub fn float(v: f64) -> Self {
        if v.is_finite() {
            AttributeValue::Float(v)
        } else {
            AttributeValue::Null
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<i32> for AttributeValue {
    fn from(v: i32) -> Self {
        AttributeValue::Int(v as i64)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::float(v)
    }
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes, in insertion order
    pub properties: Vec<(String, AttributeValue)>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: Some(geometry.into()),
            properties: Vec::new(),
        }
    }

    /// Set an attribute, replacing any existing value under the same key
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        let key = key.into();
        let value = value.into();
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.properties.push((key, value)),
        }
    }

    /// Builder-style [`Feature::set_property`]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set_property(key, value);
        self
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Collection of features sharing one CRS
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    pub crs: Option<CRS>,
}

impl FeatureCollection {
    pub fn new(crs: CRS) -> Self {
        Self {
            features: Vec::new(),
            crs: Some(crs),
        }
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Append another collection; both must share a CRS
    pub fn extend_from(&mut self, other: FeatureCollection) -> crate::Result<()> {
        match (&self.crs, &other.crs) {
            (Some(a), Some(b)) => a.ensure_same(b)?,
            (None, Some(b)) => self.crs = Some(b.clone()),
            _ => {}
        }
        self.features.extend(other.features);
        Ok(())
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::Point;

    #[test]
    fn test_set_property_replaces() {
        let mut f = Feature::new(Point::new(1.0, 2.0));
        f.set_property("year", 2001);
        f.set_property("certainty", "good");
        f.set_property("year", 2002);
        assert_eq!(f.properties.len(), 2);
        assert_eq!(f.get_property("year"), Some(&AttributeValue::Int(2002)));
        assert_eq!(f.properties[0].0, "year");
    }

    #[test]
    fn test_nan_float_is_null() {
        assert_eq!(AttributeValue::from(f64::NAN), AttributeValue::Null);
        assert!(AttributeValue::Null.as_f64().is_nan());
    }

    #[test]
    fn test_extend_requires_same_crs() {
        let mut a = FeatureCollection::new(CRS::australian_albers());
        let b = FeatureCollection::new(CRS::wgs84());
        assert!(a.extend_from(b).is_err());
    }
}
