//! GeoJSON layer reading/writing
//!
//! Layers are written as a FeatureCollection with the (legacy) named `crs`
//! member so projected coordinates round-trip through GDAL-based tools.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature, FeatureCollection};
use geo_types::{
    Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon,
};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

/// Write a feature collection to a GeoJSON file
pub fn write_geojson<P: AsRef<Path>>(collection: &FeatureCollection, path: P) -> Result<()> {
    let text = write_geojson_to_string(collection)?;
    fs::write(path.as_ref(), text)?;
    Ok(())
}

/// Serialize a feature collection to a GeoJSON string
pub fn write_geojson_to_string(collection: &FeatureCollection) -> Result<String> {
    let features: Vec<Value> = collection.features.iter().map(feature_to_json).collect();

    let mut root = Map::new();
    root.insert("type".into(), json!("FeatureCollection"));
    if let Some(code) = collection.crs.as_ref().map(|c| c.epsg()) {
        root.insert(
            "crs".into(),
            json!({
                "type": "name",
                "properties": { "name": format!("urn:ogc:def:crs:EPSG::{}", code) }
            }),
        );
    }
    root.insert("features".into(), Value::Array(features));

    Ok(serde_json::to_string(&Value::Object(root))?)
}

/// Read a GeoJSON FeatureCollection file
pub fn read_geojson<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let text = fs::read_to_string(path.as_ref())?;
    let root: Value = serde_json::from_str(&text)?;

    let crs = root
        .pointer("/crs/properties/name")
        .and_then(Value::as_str)
        .and_then(parse_crs_name);

    let features = root
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::Vector("missing `features` array".into()))?
        .iter()
        .map(feature_from_json)
        .collect::<Result<Vec<_>>>()?;

    Ok(FeatureCollection { features, crs })
}

fn parse_crs_name(name: &str) -> Option<CRS> {
    let code = name.rsplit(':').next()?.parse::<u32>().ok()?;
    Some(CRS::from_epsg(code))
}

fn feature_to_json(feature: &Feature) -> Value {
    let properties: Map<String, Value> = feature
        .properties
        .iter()
        .map(|(k, v)| (k.clone(), attribute_to_json(v)))
        .collect();
    json!({
        "type": "Feature",
        "properties": properties,
        "geometry": feature.geometry.as_ref().map_or(Value::Null, geometry_to_json),
    })
}

fn attribute_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Null => Value::Null,
        AttributeValue::Bool(b) => json!(b),
        AttributeValue::Int(i) => json!(i),
        AttributeValue::Float(f) if f.is_finite() => json!(f),
        AttributeValue::Float(_) => Value::Null,
        AttributeValue::String(s) => json!(s),
    }
}

fn attribute_from_json(value: &Value) -> AttributeValue {
    match value {
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => AttributeValue::float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => AttributeValue::String(s.clone()),
        _ => AttributeValue::Null,
    }
}

fn coords_json(ls: &LineString<f64>) -> Value {
    Value::Array(ls.0.iter().map(|c| json!([c.x, c.y])).collect())
}

fn polygon_json(p: &Polygon<f64>) -> Value {
    let mut rings = vec![coords_json(p.exterior())];
    rings.extend(p.interiors().iter().map(coords_json));
    Value::Array(rings)
}

fn geometry_to_json(geometry: &Geometry<f64>) -> Value {
    match geometry {
        Geometry::Point(p) => json!({ "type": "Point", "coordinates": [p.x(), p.y()] }),
        Geometry::MultiPoint(mp) => json!({
            "type": "MultiPoint",
            "coordinates": mp.0.iter().map(|p| json!([p.x(), p.y()])).collect::<Vec<_>>(),
        }),
        Geometry::LineString(ls) => json!({ "type": "LineString", "coordinates": coords_json(ls) }),
        Geometry::MultiLineString(mls) => json!({
            "type": "MultiLineString",
            "coordinates": mls.0.iter().map(coords_json).collect::<Vec<_>>(),
        }),
        Geometry::Polygon(p) => json!({ "type": "Polygon", "coordinates": polygon_json(p) }),
        Geometry::MultiPolygon(mp) => json!({
            "type": "MultiPolygon",
            "coordinates": mp.0.iter().map(polygon_json).collect::<Vec<_>>(),
        }),
        _ => Value::Null,
    }
}

fn parse_coord(v: &Value) -> Result<Coord<f64>> {
    let arr = v
        .as_array()
        .filter(|a| a.len() >= 2)
        .ok_or_else(|| Error::Vector(format!("invalid position: {}", v)))?;
    let x = arr[0].as_f64().ok_or_else(|| Error::Vector("non-numeric x".into()))?;
    let y = arr[1].as_f64().ok_or_else(|| Error::Vector("non-numeric y".into()))?;
    Ok(Coord { x, y })
}

fn parse_array<'a>(v: &'a Value, what: &str) -> Result<&'a Vec<Value>> {
    v.as_array()
        .ok_or_else(|| Error::Vector(format!("expected array of {}", what)))
}

fn parse_line(v: &Value) -> Result<LineString<f64>> {
    parse_array(v, "positions")?
        .iter()
        .map(parse_coord)
        .collect::<Result<Vec<_>>>()
        .map(LineString::from)
}

fn parse_polygon(v: &Value) -> Result<Polygon<f64>> {
    let mut rings = parse_array(v, "rings")?
        .iter()
        .map(parse_line)
        .collect::<Result<Vec<_>>>()?;
    if rings.is_empty() {
        return Err(Error::Vector("polygon without rings".into()));
    }
    let exterior = rings.remove(0);
    Ok(Polygon::new(exterior, rings))
}

fn geometry_from_json(v: &Value) -> Result<Option<Geometry<f64>>> {
    if v.is_null() {
        return Ok(None);
    }
    let kind = v
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Vector("geometry without type".into()))?;
    let coords = v
        .get("coordinates")
        .ok_or_else(|| Error::Vector("geometry without coordinates".into()))?;

    let geometry = match kind {
        "Point" => Geometry::Point(Point::from(parse_coord(coords)?)),
        "MultiPoint" => Geometry::MultiPoint(MultiPoint::new(
            parse_array(coords, "positions")?
                .iter()
                .map(|c| parse_coord(c).map(Point::from))
                .collect::<Result<Vec<_>>>()?,
        )),
        "LineString" => Geometry::LineString(parse_line(coords)?),
        "MultiLineString" => Geometry::MultiLineString(MultiLineString::new(
            parse_array(coords, "lines")?
                .iter()
                .map(parse_line)
                .collect::<Result<Vec<_>>>()?,
        )),
        "Polygon" => Geometry::Polygon(parse_polygon(coords)?),
        "MultiPolygon" => Geometry::MultiPolygon(MultiPolygon::new(
            parse_array(coords, "polygons")?
                .iter()
                .map(parse_polygon)
                .collect::<Result<Vec<_>>>()?,
        )),
        other => return Err(Error::Vector(format!("unsupported geometry type {}", other))),
    };
    Ok(Some(geometry))
}

fn feature_from_json(v: &Value) -> Result<Feature> {
    let geometry = geometry_from_json(v.get("geometry").unwrap_or(&Value::Null))?;
    let properties = v
        .get("properties")
        .and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .map(|(k, v)| (k.clone(), attribute_from_json(v)))
                .collect()
        })
        .unwrap_or_default();
    Ok(Feature {
        geometry,
        properties,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{line_string, polygon};

    #[test]
    fn test_roundtrip_preserves_order_and_crs() {
        let mut fc = FeatureCollection::new(CRS::australian_albers());
        fc.push(
            Feature::new(line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 5.0)])
                .with_property("year", 2001)
                .with_property("certainty", "good")
                .with_property("rate_time", f64::NAN),
        );
        fc.push(Feature::new(polygon![
            (x: 0.0, y: 0.0),
            (x: 4.0, y: 0.0),
            (x: 4.0, y: 4.0),
            (x: 0.0, y: 0.0),
        ]));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layer.geojson");
        write_geojson(&fc, &path).unwrap();
        let back = read_geojson(&path).unwrap();

        assert_eq!(back.crs.as_ref().map(|c| c.epsg()), Some(3577));
        assert_eq!(back.len(), 2);
        let keys: Vec<&str> = back.features[0].properties.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["year", "certainty", "rate_time"]);
        assert_eq!(back.features[0].get_property("rate_time"), Some(&AttributeValue::Null));
        assert_eq!(back.features[1].geometry, fc.features[1].geometry);
    }

    #[test]
    fn test_rejects_missing_features() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.geojson");
        fs::write(&path, r#"{"type":"FeatureCollection"}"#).unwrap();
        assert!(matches!(read_geojson(&path), Err(Error::Vector(_))));
    }
}
