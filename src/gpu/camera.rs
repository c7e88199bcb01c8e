//! Orbit camera looking down at the surface.

use glam::{Mat4, Vec3};

/// Radians of orbit per pixel of mouse drag.
pub const ORBIT_SENSITIVITY: f32 = 0.005;
/// Distance change per wheel line.
pub const ZOOM_STEP: f32 = 0.3;

const PITCH_MIN: f32 = 0.1;
const PITCH_MAX: f32 = 1.5;
const DISTANCE_MIN: f32 = 2.0;
const DISTANCE_MAX: f32 = 30.0;

/// Orbit camera around the plane center.
#[derive(Clone, Debug)]
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Elevation above the plane in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    pub fov_y: f32,
}

impl Camera {
    /// Default view: in front of the plane (positive Z), looking down so the
    /// far edge, where text row 0 lies, is at the top of the screen.
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.9,
            distance: 12.0,
            target: Vec3::ZERO,
            fov_y: 45.0_f32.to_radians(),
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let proj = Mat4::perspective_rh(self.fov_y, aspect.max(1e-3), 0.1, 100.0);
        proj * self.view_matrix()
    }

    /// Orbit by a mouse drag of `(dx, dy)` pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * ORBIT_SENSITIVITY;
        self.pitch = (self.pitch + dy * ORBIT_SENSITIVITY).clamp(PITCH_MIN, PITCH_MAX);
    }

    /// Zoom by `lines` wheel lines (positive zooms in).
    pub fn zoom(&mut self, lines: f32) {
        self.distance = (self.distance - lines * ZOOM_STEP).clamp(DISTANCE_MIN, DISTANCE_MAX);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
