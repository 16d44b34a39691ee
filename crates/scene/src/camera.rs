use foundation::bounds::Aabb3;
use foundation::math::Vec3;

use crate::picking::Ray;

pub const DEFAULT_FOV_Y_DEG: f64 = 50.0;
pub const DEFAULT_DISTANCE: f64 = 15.0;
/// Wheel zoom sensitivity; 1.0 is the stock orbit-control speed.
pub const ZOOM_SPEED: f64 = 0.8;
/// Padding factor applied when framing bounds (< 1 frames tighter).
pub const FIT_MARGIN: f64 = 0.6;

const PITCH_LIMIT_RAD: f64 = 1.55;
const MIN_DISTANCE: f64 = 0.25;
const MAX_DISTANCE: f64 = 5000.0;

/// Column-major 4x4 matrix, laid out the way WGSL uniforms expect.
pub type Mat4 = [[f32; 4]; 4];

/// Orbit camera around a target point, y-up.
///
/// The eye sits at `target + dir(yaw, pitch) * distance`. The default places the
/// eye at `[0, 0, 15]` looking at the origin.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrbitCamera {
    pub yaw_rad: f64,
    pub pitch_rad: f64,
    pub distance: f64,
    pub target: Vec3,
    pub fov_y_deg: f64,
    pub near: f64,
    pub far: f64,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            yaw_rad: std::f64::consts::FRAC_PI_2,
            pitch_rad: 0.0,
            distance: DEFAULT_DISTANCE,
            target: Vec3::ZERO,
            fov_y_deg: DEFAULT_FOV_Y_DEG,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl OrbitCamera {
    /// Unit vector from the target towards the eye.
    pub fn view_dir(&self) -> Vec3 {
        Vec3::new(
            self.pitch_rad.cos() * self.yaw_rad.cos(),
            self.pitch_rad.sin(),
            self.pitch_rad.cos() * self.yaw_rad.sin(),
        )
    }

    pub fn eye(&self) -> Vec3 {
        self.target + self.view_dir() * self.distance
    }

    /// Orthonormal camera basis: (forward, right, up).
    fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let forward = -self.view_dir();
        let right = forward
            .cross(Vec3::new(0.0, 1.0, 0.0))
            .normalize()
            .unwrap_or(Vec3::new(1.0, 0.0, 0.0));
        let up = right.cross(forward);
        (forward, right, up)
    }

    /// Rotate around the target. A full viewport height of drag is one turn.
    pub fn orbit(&mut self, delta_x_px: f64, delta_y_px: f64, viewport_height_px: f64) {
        let h = viewport_height_px.max(1.0);
        let turn = std::f64::consts::TAU / h;
        self.yaw_rad += delta_x_px * turn;
        self.pitch_rad = clamp(
            self.pitch_rad + delta_y_px * turn,
            -PITCH_LIMIT_RAD,
            PITCH_LIMIT_RAD,
        );
    }

    /// Move the target in the view plane.
    pub fn pan(&mut self, delta_x_px: f64, delta_y_px: f64) {
        let (_, right, up) = self.basis();
        let pan_scale = self.distance * 0.002;
        self.target = self.target + right * (-delta_x_px * pan_scale) + up * (delta_y_px * pan_scale);
    }

    /// Dolly in (negative wheel delta) or out (positive).
    pub fn zoom(&mut self, wheel_delta_y: f64) {
        let scale = 0.95f64.powf(-ZOOM_SPEED * wheel_delta_y * 0.01);
        self.distance = clamp(self.distance * scale, MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Frame `bounds` keeping the current view direction.
    ///
    /// Returns `false` (camera untouched) for empty bounds.
    pub fn fit_bounds(&mut self, bounds: &Aabb3, aspect: f64, margin: f64) -> bool {
        if bounds.is_empty() {
            return false;
        }
        let size = bounds.size();
        let max_size = size.x.max(size.y).max(size.z);
        let fit_height = max_size / (2.0 * (std::f64::consts::PI * self.fov_y_deg / 360.0).atan());
        let fit_width = fit_height / aspect.max(1e-6);
        self.target = bounds.center();
        self.distance = clamp(margin * fit_height.max(fit_width), MIN_DISTANCE, MAX_DISTANCE);
        true
    }

    pub fn view_proj(&self, width_px: f64, height_px: f64) -> Mat4 {
        let view = mat4_look_at_rh(self.eye(), self.target, Vec3::new(0.0, 1.0, 0.0));
        let proj = mat4_perspective_rh_z0(
            self.fov_y_deg.to_radians(),
            aspect(width_px, height_px),
            self.near,
            self.far,
        );
        mat4_mul(proj, view)
    }

    /// World-space ray through a pixel (origin top-left).
    pub fn screen_ray(&self, x_px: f64, y_px: f64, width_px: f64, height_px: f64) -> Option<Ray> {
        if width_px <= 0.0 || height_px <= 0.0 {
            return None;
        }
        let ndc_x = 2.0 * x_px / width_px - 1.0;
        let ndc_y = 1.0 - 2.0 * y_px / height_px;
        let tan_half = (0.5 * self.fov_y_deg.to_radians()).tan();
        let (forward, right, up) = self.basis();
        let dir = forward
            + right * (ndc_x * tan_half * aspect(width_px, height_px))
            + up * (ndc_y * tan_half);
        Some(Ray::new(self.eye(), dir.normalize()?))
    }

    /// Pixel position of a world point, `None` when it is behind the camera.
    pub fn project(&self, point: Vec3, width_px: f64, height_px: f64) -> Option<[f64; 2]> {
        let (forward, right, up) = self.basis();
        let rel = point - self.eye();
        let depth = rel.dot(forward);
        if depth <= 0.0 || width_px <= 0.0 || height_px <= 0.0 {
            return None;
        }
        let tan_half = (0.5 * self.fov_y_deg.to_radians()).tan();
        let ndc_x = rel.dot(right) / (depth * tan_half * aspect(width_px, height_px));
        let ndc_y = rel.dot(up) / (depth * tan_half);
        Some([
            (ndc_x + 1.0) * 0.5 * width_px,
            (1.0 - ndc_y) * 0.5 * height_px,
        ])
    }
}

fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

fn aspect(width_px: f64, height_px: f64) -> f64 {
    if height_px <= 0.0 {
        1.0
    } else {
        (width_px / height_px).max(1e-6)
    }
}

pub fn mat4_mul(a: Mat4, b: Mat4) -> Mat4 {
    // Column-major matrix multiply: c = a * b
    let mut c = [[0.0f32; 4]; 4];
    for col in 0..4 {
        for row in 0..4 {
            c[col][row] = a[0][row] * b[col][0]
                + a[1][row] * b[col][1]
                + a[2][row] * b[col][2]
                + a[3][row] * b[col][3];
        }
    }
    c
}

fn mat4_perspective_rh_z0(fov_y_rad: f64, aspect: f64, near: f64, far: f64) -> Mat4 {
    let f = 1.0 / (0.5 * fov_y_rad).tan();
    let m00 = (f / aspect) as f32;
    let m11 = f as f32;
    let m22 = (far / (near - far)) as f32;
    let m23 = ((near * far) / (near - far)) as f32;

    // RH, depth range [0, 1].
    [
        [m00, 0.0, 0.0, 0.0],
        [0.0, m11, 0.0, 0.0],
        [0.0, 0.0, m22, -1.0],
        [0.0, 0.0, m23, 0.0],
    ]
}

fn mat4_look_at_rh(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let f = (target - eye).normalize().unwrap_or(Vec3::new(0.0, 0.0, -1.0));
    let s = f.cross(up).normalize().unwrap_or(Vec3::new(1.0, 0.0, 0.0));
    let u = s.cross(f);

    let ex = -s.dot(eye);
    let ey = -u.dot(eye);
    let ez = f.dot(eye);

    [
        [s.x as f32, u.x as f32, (-f.x) as f32, 0.0],
        [s.y as f32, u.y as f32, (-f.y) as f32, 0.0],
        [s.z as f32, u.z as f32, (-f.z) as f32, 0.0],
        [ex as f32, ey as f32, ez as f32, 1.0],
    ]
}
