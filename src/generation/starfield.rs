//! Background starfield.

use std::f32::consts::TAU;

use glam::{Mat4, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::unit;

/// World size of a star per unit of `factor`
const STAR_WORLD_SCALE: f32 = 0.1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarfieldParams {
    /// Inner shell radius
    pub radius: f32,
    /// Shell thickness
    pub depth: f32,
    pub count: usize,
    /// Size multiplier
    pub factor: f32,
    /// Drift speed; the group turns at `speed * 0.01` rad/s
    pub speed: f32,
}

impl Default for StarfieldParams {
    fn default() -> Self {
        Self {
            radius: 100.0,
            depth: 50.0,
            count: 5000,
            factor: 4.0,
            speed: 0.5,
        }
    }
}

impl StarfieldParams {
    /// Angular velocity of the drift about +Y
    pub fn angular_velocity(&self) -> f32 {
        self.speed * 0.01
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Star {
    pub position: Vec3,
    /// World-space size
    pub size: f32,
}

impl Star {
    pub fn transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.size),
            glam::Quat::IDENTITY,
            self.position,
        )
    }
}

/// A shell of stars around the origin.
#[derive(Clone, Debug)]
pub struct Starfield {
    pub params: StarfieldParams,
    pub stars: Vec<Star>,
}

impl Starfield {
    pub fn generate<R: Rng + ?Sized>(params: StarfieldParams, rng: &mut R) -> Self {
        let stars = (0..params.count)
            .map(|_| {
                let r = params.radius + params.depth * unit(rng);
                // Uniform direction on the sphere
                let cos_theta = 1.0 - 2.0 * unit(rng);
                let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
                let phi = unit(rng) * TAU;
                let direction = Vec3::new(sin_theta * phi.cos(), cos_theta, sin_theta * phi.sin());

                let size = params.factor * (0.5 + 0.5 * unit(rng)) * STAR_WORLD_SCALE;
                Star { position: direction * r, size }
            })
            .collect();

        log::debug!("Generated starfield with {} stars", params.count);
        Self { params, stars }
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_stars_lie_in_shell() {
        let params = StarfieldParams { count: 1000, ..Default::default() };
        let field = Starfield::generate(params.clone(), &mut SmallRng::seed_from_u64(7));
        assert_eq!(field.len(), 1000);
        for star in &field.stars {
            let d = star.position.length();
            assert!(d >= params.radius - 1e-3 && d <= params.radius + params.depth + 1e-3);
            assert!(star.size > 0.0 && star.size <= params.factor * STAR_WORLD_SCALE);
        }
    }

    #[test]
    fn test_drift_speed() {
        assert!((StarfieldParams::default().angular_velocity() - 0.005).abs() < 1e-7);
    }
}
