use foundation::math::{Mat3, Vec3};

/// Rigid transform: rotate about the local origin, then translate.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Mat3,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Mat3::IDENTITY,
        }
    }

    pub fn translate(position: Vec3) -> Self {
        Self {
            position,
            rotation: Mat3::IDENTITY,
        }
    }

    pub fn rotate_euler_xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Mat3::from_euler_xyz(x, y, z),
        }
    }

    pub fn local_to_world(&self, p: Vec3) -> Vec3 {
        self.rotation.transform(p) + self.position
    }

    pub fn world_to_local(&self, p: Vec3) -> Vec3 {
        self.rotation.transpose().transform(p - self.position)
    }

    pub fn direction_to_world(&self, d: Vec3) -> Vec3 {
        self.rotation.transform(d)
    }

    pub fn direction_to_local(&self, d: Vec3) -> Vec3 {
        self.rotation.transpose().transform(d)
    }
}
