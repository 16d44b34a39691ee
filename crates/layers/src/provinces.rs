use formats::geojson::ProvinceCollection;
use foundation::bounds::Aabb3;
use foundation::math::Vec3;
use scene::World;
use scene::components::{ComponentMesh, Mesh, MeshId, Transform};
use scene::entity::EntityId;
use scene::picking::{PickHit, PickOptions, Ray, pick_ray};
use scene::selection::{Highlight, Selection, SelectionChange};

use crate::extrude::{ExtrudeSettings, extrude};
use crate::shapes::shapes_from_geometry;
use crate::symbology::ProvinceStyle;

/// Euler XYZ rotation of the map group: lon/lat plane onto world x/z, slabs up +y.
pub const MAP_ROTATION_XYZ: [f64; 3] = [-std::f64::consts::FRAC_PI_2, 0.0, std::f64::consts::PI];

/// Height of the overlay anchor above the clicked province's centre.
pub const ANCHOR_LIFT: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct ProvinceEntry {
    pub entity: EntityId,
    pub feature_id: Option<String>,
    pub name: String,
    pub key: String,
    idle_mesh: MeshId,
    active_mesh: MeshId,
}

/// One renderable province for the current frame.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem<'a> {
    pub entity: EntityId,
    pub transform: Transform,
    pub mesh: &'a Mesh,
    pub style: ProvinceStyle,
}

/// Extruded province slabs in one scene world.
#[derive(Debug)]
pub struct ProvinceLayer {
    world: World,
    provinces: Vec<ProvinceEntry>,
}

impl ProvinceLayer {
    /// Spawns one entity per feature that yields a mesh; the rest are skipped.
    pub fn build(collection: &ProvinceCollection) -> Self {
        let [rx, ry, rz] = MAP_ROTATION_XYZ;
        let transform = Transform::rotate_euler_xyz(rx, ry, rz);

        let mut world = World::new();
        let mut provinces = Vec::with_capacity(collection.features.len());
        for feature in &collection.features {
            let shapes = shapes_from_geometry(&feature.geometry);
            let (Some(idle), Some(active)) = (
                extrude(&shapes, &ExtrudeSettings::province(false)),
                extrude(&shapes, &ExtrudeSettings::province(true)),
            ) else {
                continue;
            };

            let entity = world.spawn();
            world.set_transform(entity, transform);
            let idle_mesh = world.add_mesh(idle);
            let active_mesh = world.add_mesh(active);
            world.set_mesh(entity, ComponentMesh::new(idle_mesh));

            provinces.push(ProvinceEntry {
                entity,
                feature_id: feature.id.clone(),
                name: feature.name.clone(),
                key: feature.key(),
                idle_mesh,
                active_mesh,
            });
        }

        Self { world, provinces }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn provinces(&self) -> &[ProvinceEntry] {
        &self.provinces
    }

    pub fn province(&self, entity: EntityId) -> Option<&ProvinceEntry> {
        self.provinces.iter().find(|p| p.entity == entity)
    }

    /// Centre of the displayed mesh's bounding box in world space, lifted by
    /// [`ANCHOR_LIFT`] along world z.
    pub fn anchor(&self, entity: EntityId) -> Option<Vec3> {
        let transform = self.world.transform(entity)?;
        let local = self.world.entity_mesh(entity)?.local_bounds();
        if local.is_empty() {
            return None;
        }
        let mut center = transform.local_to_world(local.center());
        center.z += ANCHOR_LIFT;
        Some(center)
    }

    /// Routes a click on `entity` into the selection and swaps slab meshes.
    pub fn click(&mut self, entity: EntityId, selection: &mut Selection) -> Option<SelectionChange> {
        let anchor = self.anchor(entity)?;
        let key = self.province(entity)?.key.clone();
        let change = selection.click(entity, &key, anchor);
        self.sync_selection(selection);
        Some(change)
    }

    /// Shows the thick slab for every part of the active province.
    pub fn sync_selection(&mut self, selection: &Selection) {
        for p in &self.provinces {
            let mesh = match selection.highlight(p.entity, &p.key) {
                Highlight::Active => p.active_mesh,
                Highlight::Hovered | Highlight::Idle => p.idle_mesh,
            };
            self.world.set_mesh(p.entity, ComponentMesh::new(mesh));
        }
    }

    pub fn pick(&self, ray: Ray) -> Option<PickHit> {
        pick_ray(&self.world, ray, PickOptions::default())
    }

    pub fn draw_list(&self, selection: &Selection) -> Vec<DrawItem<'_>> {
        self.provinces
            .iter()
            .filter_map(|p| {
                Some(DrawItem {
                    entity: p.entity,
                    transform: self.world.transform(p.entity)?,
                    mesh: self.world.entity_mesh(p.entity)?,
                    style: ProvinceStyle::for_highlight(selection.highlight(p.entity, &p.key)),
                })
            })
            .collect()
    }

    /// World bounds of every displayed slab, for camera framing.
    pub fn scene_bounds(&self) -> Aabb3 {
        self.world.bounds()
    }
}
