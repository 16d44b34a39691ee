use serde_json::Value;

use crate::key::province_key;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoPoint {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl GeoPoint {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }
}

/// A ring of positions; the first ring of a polygon is the exterior, the rest are holes.
pub type Ring = Vec<GeoPoint>;

#[derive(Debug, Clone, PartialEq)]
pub enum ProvinceGeometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl ProvinceGeometry {
    /// Iterates polygons uniformly, one slice of rings per polygon.
    pub fn polygons(&self) -> Box<dyn Iterator<Item = &[Ring]> + '_> {
        match self {
            ProvinceGeometry::Polygon(rings) => Box::new(std::iter::once(rings.as_slice())),
            ProvinceGeometry::MultiPolygon(polys) => Box::new(polys.iter().map(Vec::as_slice)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProvinceFeature {
    pub id: Option<String>,
    pub name: String,
    pub geometry: ProvinceGeometry,
}

impl ProvinceFeature {
    pub fn key(&self) -> String {
        province_key(&self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProvinceCollection {
    pub features: Vec<ProvinceFeature>,
    /// Features dropped because they had no geometry, no name, or a non-areal geometry.
    pub skipped: usize,
}

#[derive(Debug)]
pub enum GeoJsonError {
    NotAFeatureCollection,
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for GeoJsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoJsonError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
            GeoJsonError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for GeoJsonError {}

impl ProvinceCollection {
    pub fn from_geojson_str(payload: &str) -> Result<Self, GeoJsonError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| GeoJsonError::InvalidFeature {
                index: 0,
                reason: format!("JSON parse error: {e}"),
            })?;
        Self::from_geojson_value(value)
    }

    pub fn from_geojson_value(value: Value) -> Result<Self, GeoJsonError> {
        let obj = value.as_object().ok_or(GeoJsonError::NotAFeatureCollection)?;
        let ty = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or(GeoJsonError::NotAFeatureCollection)?;
        if ty != "FeatureCollection" {
            return Err(GeoJsonError::NotAFeatureCollection);
        }

        let features_val = obj
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or(GeoJsonError::NotAFeatureCollection)?;

        let mut out = ProvinceCollection::default();
        for (index, feat_val) in features_val.iter().enumerate() {
            let feat_obj = feat_val.as_object().ok_or(GeoJsonError::InvalidFeature {
                index,
                reason: "feature must be an object".to_string(),
            })?;

            let name = feat_obj
                .get("properties")
                .and_then(|p| p.get("name"))
                .and_then(|n| n.as_str())
                .map(str::trim)
                .unwrap_or_default();
            let geometry_val = feat_obj.get("geometry").filter(|g| !g.is_null());

            let (Some(geometry_val), false) = (geometry_val, name.is_empty()) else {
                out.skipped += 1;
                continue;
            };

            let geometry = match parse_geometry(geometry_val) {
                Ok(Some(g)) => g,
                Ok(None) => {
                    out.skipped += 1;
                    continue;
                }
                Err(reason) => return Err(GeoJsonError::InvalidFeature { index, reason }),
            };

            let id = match feat_obj.get("id") {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };

            out.features.push(ProvinceFeature {
                id,
                name: name.to_string(),
                geometry,
            });
        }

        Ok(out)
    }

    pub fn find_by_name(&self, name: &str) -> Option<(usize, &ProvinceFeature)> {
        let key = province_key(name);
        self.features
            .iter()
            .enumerate()
            .find(|(_, f)| f.key() == key)
    }
}

/// Returns `Ok(None)` for well-formed geometries that cannot be extruded.
fn parse_geometry(value: &Value) -> Result<Option<ProvinceGeometry>, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;

    match ty {
        "Polygon" => {
            let coords = coordinates(obj)?;
            Ok(Some(ProvinceGeometry::Polygon(parse_polygon(coords)?)))
        }
        "MultiPolygon" => {
            let coords = coordinates(obj)?;
            Ok(Some(ProvinceGeometry::MultiPolygon(parse_multi_polygon(
                coords,
            )?)))
        }
        _ => Ok(None),
    }
}

fn coordinates(obj: &serde_json::Map<String, Value>) -> Result<&Value, String> {
    obj.get("coordinates")
        .ok_or("geometry missing coordinates".to_string())
}

fn parse_point(coords: &Value) -> Result<GeoPoint, String> {
    let arr = coords
        .as_array()
        .ok_or("position must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("position must have [lon, lat]".to_string());
    }
    let lon = arr[0].as_f64().ok_or("lon must be a number".to_string())?;
    let lat = arr[1].as_f64().ok_or("lat must be a number".to_string())?;
    Ok(GeoPoint::new(lon, lat))
}

fn parse_ring(coords: &Value) -> Result<Ring, String> {
    let arr = coords
        .as_array()
        .ok_or("ring must be an array of positions".to_string())?;
    arr.iter().map(parse_point).collect()
}

fn parse_polygon(coords: &Value) -> Result<Vec<Ring>, String> {
    let rings = coords
        .as_array()
        .ok_or("Polygon coordinates must be an array of rings".to_string())?;
    rings.iter().map(parse_ring).collect()
}

fn parse_multi_polygon(coords: &Value) -> Result<Vec<Vec<Ring>>, String> {
    let polys = coords
        .as_array()
        .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
    polys.iter().map(parse_polygon).collect()
}

#[cfg(test)]
mod tests {
    use super::{GeoJsonError, ProvinceCollection, ProvinceGeometry};
    use serde_json::json;

    #[test]
    fn parses_bundled_provinces() {
        let payload = include_str!("../../apps/viewer_web/assets/indonesia.geojson");
        let provinces = ProvinceCollection::from_geojson_str(payload).expect("parse provinces");
        assert!(provinces.features.len() >= 5);
        assert!(provinces.find_by_name("DKI Jakarta").is_some());
        assert!(
            provinces
                .features
                .iter()
                .any(|f| matches!(f.geometry, ProvinceGeometry::MultiPolygon(_)))
        );
    }

    #[test]
    fn skips_features_without_name_or_area() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": { "name": "Bali" },
                  "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]] } },
                { "type": "Feature", "properties": {},
                  "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]] } },
                { "type": "Feature", "properties": { "name": "Nowhere" }, "geometry": null },
                { "type": "Feature", "properties": { "name": "Dot" },
                  "geometry": { "type": "Point", "coordinates": [1, 2] } }
            ]
        });
        let provinces = ProvinceCollection::from_geojson_value(value).expect("parse");
        assert_eq!(provinces.features.len(), 1);
        assert_eq!(provinces.features[0].name, "Bali");
        assert_eq!(provinces.skipped, 3);
    }

    #[test]
    fn multipolygon_yields_one_slice_per_polygon() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature", "id": 7, "properties": { "name": "Kepulauan Riau" },
                "geometry": { "type": "MultiPolygon", "coordinates": [
                    [[[0,0],[1,0],[1,1],[0,0]]],
                    [[[2,2],[3,2],[3,3],[2,2]], [[2.2,2.1],[2.8,2.1],[2.8,2.5],[2.2,2.1]]]
                ] }
            }]
        });
        let provinces = ProvinceCollection::from_geojson_value(value).expect("parse");
        let feature = &provinces.features[0];
        assert_eq!(feature.id.as_deref(), Some("7"));
        assert_eq!(feature.key(), "KepulauanRiau");
        let ring_counts: Vec<usize> = feature.geometry.polygons().map(|p| p.len()).collect();
        assert_eq!(ring_counts, vec![1, 2]);
    }

    #[test]
    fn rejects_malformed_coordinates() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature", "properties": { "name": "Bad" },
                "geometry": { "type": "Polygon", "coordinates": [[["x", 0]]] }
            }]
        });
        let err = ProvinceCollection::from_geojson_value(value).unwrap_err();
        assert!(matches!(err, GeoJsonError::InvalidFeature { index: 0, .. }));
    }

    #[test]
    fn rejects_non_collections() {
        let err = ProvinceCollection::from_geojson_str(r#"{"type":"Feature"}"#).unwrap_err();
        assert!(matches!(err, GeoJsonError::NotAFeatureCollection));
    }
}
