use earcutr::earcut;
use foundation::math::{Vec2, Vec3};
use scene::components::Mesh;

use crate::shapes::Shape;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ExtrudeSettings {
    pub steps: u32,
    pub depth: f64,
    pub bevel_enabled: bool,
    pub bevel_thickness: f64,
    pub bevel_size: f64,
    pub bevel_segments: u32,
}

impl ExtrudeSettings {
    /// Province slab; the active province is twice as thick.
    pub fn province(active: bool) -> Self {
        Self {
            steps: 1,
            depth: if active { 0.04 } else { 0.02 },
            bevel_enabled: true,
            bevel_thickness: 0.01,
            bevel_size: 0.01,
            bevel_segments: 1,
        }
    }

    /// Contour layers along z as `(outward offset, z)`, front to back.
    fn layers(&self) -> Vec<(f64, f64)> {
        let steps = self.steps.max(1);
        let segments = self.bevel_segments.max(1);
        let bevel: Vec<(f64, f64)> = if self.bevel_enabled {
            (0..segments)
                .map(|b| {
                    let t = b as f64 / segments as f64;
                    let angle = t * std::f64::consts::FRAC_PI_2;
                    (self.bevel_size * angle.sin(), self.bevel_thickness * angle.cos())
                })
                .collect()
        } else {
            Vec::new()
        };
        let body_offset = if self.bevel_enabled { self.bevel_size } else { 0.0 };

        let mut out = Vec::with_capacity(2 * bevel.len() + steps as usize + 1);
        out.extend(bevel.iter().map(|&(bs, z)| (bs, -z)));
        out.extend((0..=steps).map(|s| (body_offset, self.depth * s as f64 / steps as f64)));
        out.extend(bevel.iter().rev().map(|&(bs, z)| (bs, self.depth + z)));
        out
    }
}

/// Extrudes planar shapes along +z into a closed, beveled slab.
///
/// Returns `None` when there is nothing to extrude.
pub fn extrude(shapes: &[Shape], settings: &ExtrudeSettings) -> Option<Mesh> {
    if shapes.is_empty() {
        return None;
    }
    let layers = settings.layers();
    let (&front, &back) = (layers.first()?, layers.last()?);

    let mut mesh = Mesh::default();
    for shape in shapes {
        let rings: Vec<(&[Vec2], Vec<Vec2>)> = shape
            .rings()
            .map(|ring| (ring, bevel_vectors(ring)))
            .collect();

        push_cap(&mut mesh, &rings, front, false);
        push_cap(&mut mesh, &rings, back, true);
        for pair in layers.windows(2) {
            for (ring, bevel) in &rings {
                push_walls(&mut mesh, ring, bevel, pair[0], pair[1]);
            }
        }
    }
    Some(mesh)
}

/// Per-vertex miter direction pointing away from the solid.
///
/// Rings are CCW (exterior) or CW (holes), so the right-hand edge normal
/// always faces out of the material.
fn bevel_vectors(ring: &[Vec2]) -> Vec<Vec2> {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let prev = ring[(i + n - 1) % n];
            let cur = ring[i];
            let next = ring[(i + 1) % n];
            let n1 = edge_normal(cur - prev);
            let n2 = edge_normal(next - cur);
            let denom = 1.0 + (n1.x * n2.x + n1.y * n2.y);
            if denom < 1e-9 {
                return n1;
            }
            let v = (n1 + n2) * (1.0 / denom);
            let len_sq = v.x * v.x + v.y * v.y;
            if len_sq > 2.0 {
                v * (1.0 / (len_sq / 2.0).sqrt())
            } else {
                v
            }
        })
        .collect()
}

fn edge_normal(d: Vec2) -> Vec2 {
    Vec2::new(d.y, -d.x).normalize_or_zero()
}

fn offset_point(p: Vec2, bevel: Vec2, amount: f64, z: f64) -> Vec3 {
    Vec3::new(p.x + bevel.x * amount, p.y + bevel.y * amount, z)
}

fn push_cap(mesh: &mut Mesh, rings: &[(&[Vec2], Vec<Vec2>)], (offset, z): (f64, f64), back: bool) {
    let mut coords: Vec<f64> = Vec::new();
    let mut hole_indices: Vec<usize> = Vec::new();
    let mut points: Vec<Vec3> = Vec::new();
    for (ring_i, (ring, bevel)) in rings.iter().enumerate() {
        if ring_i > 0 {
            hole_indices.push(points.len());
        }
        for (p, b) in ring.iter().zip(bevel) {
            let v = offset_point(*p, *b, offset, z);
            coords.push(v.x);
            coords.push(v.y);
            points.push(v);
        }
    }

    let indices = match earcut(&coords, &hole_indices, 2) {
        Ok(ix) => ix,
        Err(_) => return,
    };

    let base = mesh.positions.len() as u32;
    let normal = Vec3::new(0.0, 0.0, if back { 1.0 } else { -1.0 });
    mesh.positions.extend_from_slice(&points);
    mesh.normals.extend(std::iter::repeat_n(normal, points.len()));

    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        let ccw = {
            let (pa, pb, pc) = (points[a], points[b], points[c]);
            (pb.x - pa.x) * (pc.y - pa.y) - (pb.y - pa.y) * (pc.x - pa.x) > 0.0
        };
        // Back cap faces +z (CCW in xy), front cap faces -z.
        let (b, c) = if ccw == back { (b, c) } else { (c, b) };
        mesh.indices
            .extend([base + a as u32, base + b as u32, base + c as u32]);
    }
}

fn push_walls(
    mesh: &mut Mesh,
    ring: &[Vec2],
    bevel: &[Vec2],
    (offset0, z0): (f64, f64),
    (offset1, z1): (f64, f64),
) {
    let n = ring.len();
    for i in 0..n {
        let j = (i + 1) % n;
        let a = offset_point(ring[i], bevel[i], offset0, z0);
        let b = offset_point(ring[j], bevel[j], offset0, z0);
        let c = offset_point(ring[j], bevel[j], offset1, z1);
        let d = offset_point(ring[i], bevel[i], offset1, z1);

        let Some(normal) = (b - a).cross(d - a).normalize() else {
            continue;
        };
        let base = mesh.positions.len() as u32;
        mesh.positions.extend([a, b, c, d]);
        mesh.normals.extend([normal; 4]);
        mesh.indices
            .extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

#[cfg(test)]
mod tests {
    use super::{ExtrudeSettings, extrude};
    use crate::shapes::Shape;
    use formats::geojson::{GeoPoint, Ring};

    fn ring(coords: &[(f64, f64)]) -> Ring {
        coords.iter().map(|&(x, y)| GeoPoint::new(x, y)).collect()
    }

    fn unit_square() -> Ring {
        ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)])
    }

    #[test]
    fn nothing_to_extrude() {
        assert!(extrude(&[], &ExtrudeSettings::province(false)).is_none());
    }

    #[test]
    fn bevel_widens_walls_and_caps_sit_outside_the_body() {
        let shape = Shape::from_rings(&[unit_square()]).expect("shape");
        let mesh = extrude(&[shape], &ExtrudeSettings::province(false)).expect("mesh");
        let b = mesh.local_bounds();

        assert!((b.min.x + 0.01).abs() < 1e-12);
        assert!((b.max.x - 1.01).abs() < 1e-12);
        assert!((b.min.y + 0.01).abs() < 1e-12);
        assert!((b.min.z + 0.01).abs() < 1e-12);
        assert!((b.max.z - 0.03).abs() < 1e-12);
        assert_eq!(mesh.positions.len(), mesh.normals.len());
    }

    #[test]
    fn active_slab_is_thicker() {
        let shape = Shape::from_rings(&[unit_square()]).expect("shape");
        let idle = extrude(&[shape.clone()], &ExtrudeSettings::province(false)).expect("idle");
        let active = extrude(&[shape], &ExtrudeSettings::province(true)).expect("active");
        assert!((active.local_bounds().max.z - 0.05).abs() < 1e-12);
        assert!(active.local_bounds().max.z > idle.local_bounds().max.z);
    }

    #[test]
    fn caps_respect_holes() {
        let hole = ring(&[(0.25, 0.25), (0.5, 0.25), (0.5, 0.5), (0.25, 0.5), (0.25, 0.25)]);
        let shape = Shape::from_rings(&[unit_square(), hole]).expect("shape");
        let settings = ExtrudeSettings::province(false);
        let mesh = extrude(&[shape], &settings).expect("mesh");

        let top_z = settings.depth + settings.bevel_thickness;
        let top_area: f64 = mesh
            .triangles()
            .filter(|t| t.iter().all(|p| (p.z - top_z).abs() < 1e-12))
            .map(|[a, b, c]| 0.5 * (b - a).cross(c - a).length())
            .sum();
        assert!((top_area - (1.0 - 0.0625)).abs() < 1e-9);

        // 4 contour layers -> 3 wall bands, 8 edges, 2 triangles per quad.
        let wall_tris = mesh
            .triangles()
            .filter(|[a, b, c]| !((a.z == b.z) && (b.z == c.z)))
            .count();
        assert_eq!(wall_tris, 3 * 8 * 2);
    }

    #[test]
    fn cap_and_wall_normals_face_outward() {
        let shape = Shape::from_rings(&[unit_square()]).expect("shape");
        let mesh = extrude(&[shape], &ExtrudeSettings::province(false)).expect("mesh");
        let center = mesh.local_bounds().center();
        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            assert!((*p - center).dot(*n) > 0.0, "normal at {p:?} points inward");
        }
    }
}
