use formats::geojson::{ProvinceGeometry, Ring};
use foundation::math::Vec2;

/// A planar polygon ready for extrusion: x = longitude, y = latitude.
///
/// The exterior is counter-clockwise and every hole is clockwise. Closing
/// duplicate vertices are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub exterior: Vec<Vec2>,
    pub holes: Vec<Vec<Vec2>>,
}

impl Shape {
    /// Builds a shape from GeoJSON rings (first ring exterior, rest holes).
    ///
    /// Returns `None` when the exterior ring is missing or degenerate. Degenerate
    /// holes are dropped.
    pub fn from_rings(rings: &[Ring]) -> Option<Self> {
        let (exterior, holes) = rings.split_first()?;
        let mut exterior = ring_points(exterior)?;
        if signed_area(&exterior) < 0.0 {
            exterior.reverse();
        }

        let holes = holes
            .iter()
            .filter_map(ring_points)
            .map(|mut hole| {
                if signed_area(&hole) > 0.0 {
                    hole.reverse();
                }
                hole
            })
            .collect();

        Some(Self { exterior, holes })
    }

    /// Every ring of the shape, exterior first.
    pub fn rings(&self) -> impl Iterator<Item = &[Vec2]> + '_ {
        std::iter::once(self.exterior.as_slice()).chain(self.holes.iter().map(Vec::as_slice))
    }
}

/// One shape per polygon; polygons without a usable exterior are skipped.
pub fn shapes_from_geometry(geometry: &ProvinceGeometry) -> Vec<Shape> {
    geometry.polygons().filter_map(Shape::from_rings).collect()
}

/// Shoelace area; positive for counter-clockwise rings.
pub fn signed_area(points: &[Vec2]) -> f64 {
    let n = points.len();
    let twice: f64 = (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum();
    0.5 * twice
}

fn ring_points(ring: &Ring) -> Option<Vec<Vec2>> {
    let mut pts: Vec<Vec2> = ring
        .iter()
        .map(|p| Vec2::new(p.lon_deg, p.lat_deg))
        .collect();
    drop_closing_duplicate(&mut pts);
    (pts.len() >= 3).then_some(pts)
}

fn drop_closing_duplicate(points: &mut Vec<Vec2>) {
    if points.len() >= 2 {
        let first = points[0];
        let last = points[points.len() - 1];
        if (first.x - last.x).abs() < 1e-12 && (first.y - last.y).abs() < 1e-12 {
            points.pop();
        }
    }
}
