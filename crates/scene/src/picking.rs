use foundation::bounds::Aabb3;
use foundation::math::Vec3;
use foundation::math::precision::stable_total_cmp_f64;

use crate::World;
use crate::entity::EntityId;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.dir * t
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub entity: EntityId,
    pub distance: f64,
    pub point: Vec3,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickOptions {
    pub max_distance: f64,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            max_distance: 1.0e30,
        }
    }
}

/// Deterministic ray picking against entity meshes.
///
/// Ordering contract:
/// - The closest triangle hit along the (normalized) ray wins.
/// - If multiple entities are hit at the same distance, the lower `EntityId::index()` wins.
///
/// Entity world bounds are used as a broad phase; triangles are tested in the
/// entity's local space.
pub fn pick_ray(world: &World, ray: Ray, opts: PickOptions) -> Option<PickHit> {
    let dir = ray.dir.normalize()?;
    let ray = Ray::new(ray.origin, dir);

    let mut best: Option<(f64, EntityId)> = None;

    for (entity, transform, _component) in world.meshes_by_entity() {
        let Some(bounds) = world.world_bounds(entity) else {
            continue;
        };
        if ray_aabb_hit_t(ray, bounds, 0.0, opts.max_distance).is_none() {
            continue;
        }
        let Some(mesh) = world.entity_mesh(entity) else {
            continue;
        };

        // Rotation preserves length, so local hit distances are world distances.
        let local = Ray::new(
            transform.world_to_local(ray.origin),
            transform.direction_to_local(ray.dir),
        );
        let nearest = mesh
            .triangles()
            .filter_map(|tri| ray_triangle_hit_t(local, tri))
            .filter(|t| *t <= opts.max_distance)
            .min_by(|a, b| stable_total_cmp_f64(*a, *b));
        let Some(t) = nearest else {
            continue;
        };

        best = match best {
            None => Some((t, entity)),
            Some((bt, be)) => {
                let ord = stable_total_cmp_f64(t, bt).then_with(|| entity.index().cmp(&be.index()));
                if ord.is_lt() {
                    Some((t, entity))
                } else {
                    Some((bt, be))
                }
            }
        };
    }

    let (t, entity) = best?;
    Some(PickHit {
        entity,
        distance: t,
        point: ray.at(t),
    })
}

fn ray_aabb_hit_t(ray: Ray, bounds: Aabb3, mut t_min: f64, mut t_max: f64) -> Option<f64> {
    // Slabs intersection; returns entry distance.
    let origin = [ray.origin.x, ray.origin.y, ray.origin.z];
    let dir = [ray.dir.x, ray.dir.y, ray.dir.z];
    let min = [bounds.min.x, bounds.min.y, bounds.min.z];
    let max = [bounds.max.x, bounds.max.y, bounds.max.z];

    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];

        if d.abs() < 1e-12 {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t1 = (min[axis] - o) * inv;
        let mut t2 = (max[axis] - o) * inv;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }

        t_min = t_min.max(t1);
        t_max = t_max.min(t2);
        if t_max < t_min {
            return None;
        }
    }

    Some(t_min.max(0.0))
}

/// Möller-Trumbore, two-sided. Returns the hit distance in front of the origin.
fn ray_triangle_hit_t(ray: Ray, [a, b, c]: [Vec3; 3]) -> Option<f64> {
    let e1 = b - a;
    let e2 = c - a;
    let p = ray.dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < 1e-12 {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = ray.dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv_det;
    (t >= 0.0).then_some(t)
}
