//! Offline checks and exports for the bundled map and cultural datasets.

use std::io::{self, Write};

use formats::{CultureDataset, ProvinceCollection, ProvinceFeature};
use layers::extrude::{ExtrudeSettings, extrude};
use layers::shapes::shapes_from_geometry;
use scene::components::Mesh;
use serde::Serialize;

pub fn to_hex(bytes: &[u8]) -> String {
    const LUT: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(LUT[(b >> 4) as usize] as char);
        out.push(LUT[(b & 0x0f) as usize] as char);
    }
    out
}

pub fn content_hash(bytes: &[u8]) -> String {
    to_hex(blake3::hash(bytes).as_bytes())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetReport {
    pub feature_count: usize,
    pub record_count: usize,
    pub geo_blake3: String,
    pub culture_blake3: String,
    /// Province names with no cultural record.
    pub missing_records: Vec<String>,
    /// Record keys that match no province on the map.
    pub orphan_records: Vec<String>,
}

pub fn inspect(geo_bytes: &[u8], culture_bytes: &[u8]) -> Result<DatasetReport, String> {
    let geo_text = std::str::from_utf8(geo_bytes).map_err(|e| format!("geojson utf-8: {e}"))?;
    let culture_text =
        std::str::from_utf8(culture_bytes).map_err(|e| format!("culture utf-8: {e}"))?;
    let collection =
        ProvinceCollection::from_geojson_str(geo_text).map_err(|e| format!("geojson: {e}"))?;
    let culture = CultureDataset::from_json_str(culture_text).map_err(|e| format!("culture: {e}"))?;

    let feature_keys: Vec<String> = collection.features.iter().map(|f| f.key()).collect();
    let orphan_records = culture
        .keys()
        .filter(|k| !feature_keys.iter().any(|f| f == k))
        .map(str::to_string)
        .collect();

    Ok(DatasetReport {
        feature_count: collection.features.len(),
        record_count: culture.len(),
        geo_blake3: content_hash(geo_bytes),
        culture_blake3: content_hash(culture_bytes),
        missing_records: culture.missing_for(&collection),
        orphan_records,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshStats {
    pub name: String,
    pub key: String,
    pub vertices: usize,
    pub triangles: usize,
    pub bounds_min: [f64; 3],
    pub bounds_max: [f64; 3],
}

impl MeshStats {
    pub fn new(feature: &ProvinceFeature, mesh: &Mesh) -> Self {
        let bounds = mesh.local_bounds();
        Self {
            name: feature.name.clone(),
            key: feature.key(),
            vertices: mesh.positions.len(),
            triangles: mesh.triangle_count(),
            bounds_min: [bounds.min.x, bounds.min.y, bounds.min.z],
            bounds_max: [bounds.max.x, bounds.max.y, bounds.max.z],
        }
    }
}

/// Extrudes the province whose normalized key matches `name`.
pub fn province_mesh<'a>(
    collection: &'a ProvinceCollection,
    name: &str,
    active: bool,
) -> Result<(&'a ProvinceFeature, Mesh), String> {
    let (_, feature) = collection
        .find_by_name(name)
        .ok_or_else(|| format!("no province named {name:?}"))?;
    let shapes = shapes_from_geometry(&feature.geometry);
    let mesh = extrude(&shapes, &ExtrudeSettings::province(active))
        .ok_or_else(|| format!("{} has no extrudable rings", feature.name))?;
    Ok((feature, mesh))
}

/// Wavefront OBJ with per-vertex normals, in local (lon, lat, z) coordinates.
pub fn write_obj(mesh: &Mesh, object_name: &str, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "o {}", object_name.replace(char::is_whitespace, "_"))?;
    for p in &mesh.positions {
        writeln!(out, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for n in &mesh.normals {
        writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
    }
    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] + 1, tri[1] + 1, tri[2] + 1];
        writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}")?;
    }
    Ok(())
}
