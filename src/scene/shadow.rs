//! Soft contact shadow on the ground plane.
//!
//! Everything within `far` above the plane is rendered from below with an
//! orthographic camera into a darkness map, blurred, and laid on a square
//! quad centered on the plane origin.

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Blur strength of the second blur round, relative to the first
const SECOND_BLUR_SCALE: f32 = 0.4;
/// Blur offsets are expressed in 1/256ths of the map
const BLUR_UNIT: f32 = 1.0 / 256.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactShadowSettings {
    /// Center of the shadow quad; its y is the ground height
    pub center: Vec3,
    /// Side length of the square quad in world units
    pub scale: f32,
    pub opacity: f32,
    pub blur: f32,
    /// Height above the plane at which casters stop darkening it
    pub far: f32,
    pub darkness: f32,
}

impl Default for ContactShadowSettings {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            scale: 25.0,
            opacity: 0.7,
            blur: 2.0,
            far: 4.0,
            darkness: 1.0,
        }
    }
}

impl ContactShadowSettings {
    /// Orthographic projection looking up from the plane.
    ///
    /// x and z over the quad map to clip x and y, and height above the
    /// plane maps linearly to depth 0..1 at `far`. Texture coordinates of
    /// the result agree with [`Self::uv`].
    pub fn projection(&self) -> Mat4 {
        let s = 2.0 / self.scale.max(f32::EPSILON);
        let f = 1.0 / self.far.max(f32::EPSILON);
        let c = self.center;
        Mat4::from_cols(
            Vec4::new(s, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 0.0, f, 0.0),
            Vec4::new(0.0, -s, 0.0, 0.0),
            Vec4::new(-c.x * s, c.z * s, -c.y * f, 1.0),
        )
    }

    /// Shadow map coordinate of a world point over the quad
    pub fn uv(&self, point: Vec3) -> Vec2 {
        let local = (point - self.center) / self.scale.max(f32::EPSILON);
        Vec2::new(local.x + 0.5, local.z + 0.5)
    }

    /// Per-pass blur offsets in uv units: horizontal then vertical, twice,
    /// the second round narrower.
    pub fn blur_steps(&self) -> [Vec2; 4] {
        let first = self.blur * BLUR_UNIT;
        let second = first * SECOND_BLUR_SCALE;
        [
            Vec2::new(first, 0.0),
            Vec2::new(0.0, first),
            Vec2::new(second, 0.0),
            Vec2::new(0.0, second),
        ]
    }
}
