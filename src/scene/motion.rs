//! Idle float animation for hovering objects.

use glam::{EulerRot, Quat, Vec3};

/// Gentle bob and sway around a base position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloatMotion {
    pub speed: f32,
    pub rotation_intensity: f32,
    pub float_intensity: f32,
    /// Output range of the vertical bob before `float_intensity`
    pub floating_range: (f32, f32),
    /// Phase offset so several floaters do not move in lockstep
    pub offset: f32,
}

impl Default for FloatMotion {
    fn default() -> Self {
        Self {
            speed: 1.0,
            rotation_intensity: 1.0,
            float_intensity: 1.0,
            floating_range: (-0.1, 0.1),
            offset: 0.0,
        }
    }
}

impl FloatMotion {
    pub fn new(speed: f32, rotation_intensity: f32, float_intensity: f32) -> Self {
        Self { speed, rotation_intensity, float_intensity, ..Default::default() }
    }

    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    /// Offset from the base position and the sway rotation at `elapsed` seconds
    pub fn sample(&self, elapsed: f32) -> (Vec3, Quat) {
        let phase = (self.offset + elapsed) / 4.0 * self.speed;
        let (sin, cos) = phase.sin_cos();

        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            cos / 8.0 * self.rotation_intensity,
            sin / 8.0 * self.rotation_intensity,
            sin / 20.0 * self.rotation_intensity,
        );

        // Map [-0.1, 0.1] onto the floating range
        let (lo, hi) = self.floating_range;
        let t = (sin / 10.0 + 0.1) / 0.2;
        let y = (lo + t * (hi - lo)) * self.float_intensity;

        (Vec3::new(0.0, y, 0.0), rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bob_stays_in_range() {
        let motion = FloatMotion::new(2.0, 0.5, 0.5);
        for i in 0..1000 {
            let (offset, _) = motion.sample(i as f32 * 0.05);
            assert!(offset.y.abs() <= 0.05 + 1e-6);
            assert_eq!(offset.x, 0.0);
        }
    }

    #[test]
    fn test_zero_intensity_is_still() {
        let motion = FloatMotion::new(2.0, 0.0, 0.0);
        let (offset, rotation) = motion.sample(3.7);
        assert_eq!(offset, Vec3::ZERO);
        assert!(rotation.angle_between(Quat::IDENTITY) < 1e-6);
    }
}
