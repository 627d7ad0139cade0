//! Orbit camera controller

use std::f32::consts::PI;

use glam::Vec3;

use crate::core::camera::Camera;
use crate::core::input::InputState;

/// Orbit controller: drag to circle the target, scroll to zoom.
///
/// Panning is disabled; the target stays fixed.
pub struct OrbitController {
    pub target: Vec3,
    /// Radians per pixel of drag
    pub sensitivity: f32,
    /// Fraction of the distance per scroll line
    pub zoom_speed: f32,
    pub min_polar: f32,
    pub max_polar: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Azimuth around +Y, 0 = looking down -Z
    azimuth: f32,
    /// Angle from +Y
    polar: f32,
    distance: f32,
}

impl OrbitController {
    /// Create a controller that reproduces the camera's current placement
    pub fn from_camera(camera: &Camera, target: Vec3) -> Self {
        let offset = camera.position - target;
        let distance = offset.length().max(1e-3);
        let polar = (offset.y / distance).clamp(-1.0, 1.0).acos();
        let azimuth = offset.x.atan2(offset.z);

        Self {
            target,
            sensitivity: 0.005,
            zoom_speed: 0.1,
            min_polar: 0.0,
            max_polar: PI,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            azimuth,
            polar,
            distance,
        }
    }

    /// Clamp the polar angle range
    pub fn with_polar_limits(mut self, min: f32, max: f32) -> Self {
        self.min_polar = min;
        self.max_polar = max;
        self.polar = self.polar.clamp(min, max);
        self
    }

    /// Clamp the zoom range
    pub fn with_distance_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min;
        self.max_distance = max;
        self.distance = self.distance.clamp(min, max);
        self
    }

    /// Rotate by a drag of `(dx, dy)` pixels
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.azimuth -= dx * self.sensitivity;
        self.polar = (self.polar - dy * self.sensitivity).clamp(self.min_polar, self.max_polar);
    }

    /// Zoom by scroll lines (positive moves closer)
    pub fn zoom(&mut self, lines: f32) {
        let factor = (1.0 - self.zoom_speed).powf(lines);
        self.distance = (self.distance * factor).clamp(self.min_distance, self.max_distance);
    }

    /// Update camera based on input
    pub fn update(&mut self, camera: &mut Camera, input: &InputState) {
        if input.is_dragging() {
            let (dx, dy) = input.mouse_delta();
            self.rotate(dx, dy);
        }
        if input.scroll() != 0.0 {
            self.zoom(input.scroll());
        }
        self.apply(camera);
    }

    /// Place the camera on the orbit sphere
    pub fn apply(&self, camera: &mut Camera) {
        let (sin_p, cos_p) = self.polar.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        let offset = Vec3::new(sin_p * sin_a, cos_p, sin_p * cos_a) * self.distance;
        camera.position = self.target + offset;
        camera.point_at(self.target);
    }

    pub fn polar(&self) -> f32 {
        self.polar
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }
}
