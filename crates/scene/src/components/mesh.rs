use foundation::bounds::Aabb3;
use foundation::math::Vec3;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MeshId(pub u32);

/// Indexed triangle mesh in local coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Three indices per triangle, counter-clockwise when seen from outside.
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            let a = *self.positions.get(tri[0] as usize)?;
            let b = *self.positions.get(tri[1] as usize)?;
            let c = *self.positions.get(tri[2] as usize)?;
            Some([a, b, c])
        })
    }

    pub fn local_bounds(&self) -> Aabb3 {
        Aabb3::from_points(self.positions.iter().copied())
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ComponentMesh {
    pub id: MeshId,
}

impl ComponentMesh {
    pub fn new(id: MeshId) -> Self {
        Self { id }
    }
}

#[cfg(test)]
mod tests {
    use super::Mesh;
    use foundation::math::Vec3;

    fn unit_triangle() -> Mesh {
        Mesh {
            positions: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            normals: vec![Vec3::new(0.0, 0.0, 1.0); 3],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn yields_indexed_triangles() {
        let mesh = unit_triangle();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.triangles().count(), 1);
    }

    #[test]
    fn bounds_cover_all_positions() {
        let b = unit_triangle().local_bounds();
        assert_eq!(b.min, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 1.0, 0.0));
    }
}
