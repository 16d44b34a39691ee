use foundation::bounds::Aabb3;

use crate::components::{ComponentMesh, Mesh, MeshId, Transform};
use crate::entity::EntityId;

#[derive(Debug, Default)]
pub struct World {
    next_index: u32,
    transforms: Vec<Option<Transform>>,
    mesh_components: Vec<Option<ComponentMesh>>,
    meshes: Vec<Mesh>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self) -> EntityId {
        let id = EntityId(self.next_index);
        self.next_index += 1;
        self.ensure_capacity(id.index() as usize);
        id
    }

    pub fn entity_count(&self) -> usize {
        self.next_index as usize
    }

    pub fn set_transform(&mut self, entity: EntityId, transform: Transform) {
        self.ensure_capacity(entity.index() as usize);
        self.transforms[entity.index() as usize] = Some(transform);
    }

    pub fn transform(&self, entity: EntityId) -> Option<Transform> {
        self.transforms
            .get(entity.index() as usize)
            .and_then(|t| *t)
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        let id = MeshId(self.meshes.len() as u32);
        self.meshes.push(mesh);
        id
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0 as usize)
    }

    pub fn set_mesh(&mut self, entity: EntityId, component: ComponentMesh) {
        self.ensure_capacity(entity.index() as usize);
        self.mesh_components[entity.index() as usize] = Some(component);
    }

    pub fn mesh_component(&self, entity: EntityId) -> Option<ComponentMesh> {
        self.mesh_components
            .get(entity.index() as usize)
            .and_then(|c| *c)
    }

    /// The mesh currently attached to `entity`.
    pub fn entity_mesh(&self, entity: EntityId) -> Option<&Mesh> {
        self.mesh_component(entity).and_then(|c| self.mesh(c.id))
    }

    /// World-space bounds of the entity's mesh (local bounds re-bounded after transform).
    pub fn world_bounds(&self, entity: EntityId) -> Option<Aabb3> {
        let transform = self.transform(entity)?;
        let local = self.entity_mesh(entity)?.local_bounds();
        if local.is_empty() {
            return None;
        }
        Some(Aabb3::from_points(
            local.corners().into_iter().map(|c| transform.local_to_world(c)),
        ))
    }

    /// Entities with both a transform and a mesh, in ascending index order.
    pub fn meshes_by_entity(&self) -> Vec<(EntityId, Transform, ComponentMesh)> {
        let mut out = Vec::new();
        for (idx, comp) in self.mesh_components.iter().enumerate() {
            let Some(comp) = comp else { continue };
            let Some(transform) = self.transforms.get(idx).and_then(|t| *t) else {
                continue;
            };
            out.push((EntityId(idx as u32), transform, *comp));
        }
        out
    }

    /// Union of all entity world bounds.
    pub fn bounds(&self) -> Aabb3 {
        self.meshes_by_entity()
            .into_iter()
            .filter_map(|(entity, _, _)| self.world_bounds(entity))
            .fold(Aabb3::EMPTY, |acc, b| acc.union(&b))
    }

    fn ensure_capacity(&mut self, idx: usize) {
        if self.transforms.len() <= idx {
            let new_len = idx + 1;
            self.transforms.resize(new_len, None);
            self.mesh_components.resize(new_len, None);
        }
    }
}
