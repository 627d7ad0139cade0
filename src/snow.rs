//! Falling snow particles.
//!
//! A fixed pool of flakes falls with a slight sideways wobble. A flake that
//! drops below the floor is moved back to the ceiling in the same tick with
//! fresh horizontal coordinates, so the pool never grows or shrinks.

use std::f32::consts::TAU;

use glam::{EulerRot, Mat4, Quat, Vec3};
use rand::rngs::SmallRng;

use crate::generation::unit;

#[derive(Clone, Debug, PartialEq)]
pub struct SnowParams {
    pub count: usize,
    /// Width of the square spawn area centered on the origin
    pub extent: f32,
    pub spawn_min_y: f32,
    pub spawn_max_y: f32,
    pub min_fall_speed: f32,
    pub max_fall_speed: f32,
    /// Sideways drift per frame at peak of the wobble
    pub wobble_amplitude: f32,
    pub floor: f32,
    pub ceiling: f32,
    pub flake_scale: f32,
    /// Frame rate that `fall_speed` is expressed against
    pub reference_fps: f32,
}

impl Default for SnowParams {
    fn default() -> Self {
        Self {
            count: 400,
            extent: 20.0,
            spawn_min_y: -5.0,
            spawn_max_y: 15.0,
            min_fall_speed: 0.02,
            max_fall_speed: 0.07,
            wobble_amplitude: 0.005,
            floor: -6.0,
            ceiling: 15.0,
            flake_scale: 0.08,
            reference_fps: 60.0,
        }
    }
}

impl SnowParams {
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Snowflake {
    pub position: Vec3,
    /// Units per reference frame, always positive
    pub fall_speed: f32,
    pub wobble_phase: f32,
    /// Height at spawn
    pub original_y: f32,
}

/// Owns the flake pool and its instance transforms.
pub struct SnowSimulator {
    params: SnowParams,
    flakes: Vec<Snowflake>,
    transforms: Vec<Mat4>,
    rng: SmallRng,
}

impl SnowSimulator {
    pub fn new(params: SnowParams, mut rng: SmallRng) -> Self {
        let flakes: Vec<Snowflake> = (0..params.count)
            .map(|_| {
                let x = (unit(&mut rng) - 0.5) * params.extent;
                let y = params.spawn_min_y + unit(&mut rng) * (params.spawn_max_y - params.spawn_min_y);
                let z = (unit(&mut rng) - 0.5) * params.extent;
                Snowflake {
                    position: Vec3::new(x, y, z),
                    fall_speed: params.min_fall_speed
                        + unit(&mut rng) * (params.max_fall_speed - params.min_fall_speed),
                    wobble_phase: unit(&mut rng) * TAU,
                    original_y: y,
                }
            })
            .collect();

        let mut sim = Self {
            transforms: vec![Mat4::IDENTITY; flakes.len()],
            params,
            flakes,
            rng,
        };
        sim.write_transforms(0.0);
        sim
    }

    /// Advance every flake by `delta` seconds; `elapsed` drives wobble and spin.
    pub fn tick(&mut self, elapsed: f32, delta: f32) {
        let p = &self.params;
        let step = delta * p.reference_fps;

        for flake in &mut self.flakes {
            flake.position.y -= flake.fall_speed * step;
            flake.position.x += (elapsed + flake.wobble_phase).sin() * p.wobble_amplitude * step;

            if flake.position.y < p.floor {
                flake.position.y = p.ceiling;
                flake.position.x = (unit(&mut self.rng) - 0.5) * p.extent;
                flake.position.z = (unit(&mut self.rng) - 0.5) * p.extent;
            }
        }

        self.write_transforms(elapsed);
    }

    fn write_transforms(&mut self, elapsed: f32) {
        let rotation = Quat::from_euler(EulerRot::XYZ, elapsed, elapsed, 0.0);
        let scale = Vec3::splat(self.params.flake_scale);
        for (transform, flake) in self.transforms.iter_mut().zip(&self.flakes) {
            *transform = Mat4::from_scale_rotation_translation(scale, rotation, flake.position);
        }
    }

    /// One transform per flake, as of the last tick
    pub fn transforms(&self) -> &[Mat4] {
        &self.transforms
    }

    pub fn flakes(&self) -> &[Snowflake] {
        &self.flakes
    }

    pub fn params(&self) -> &SnowParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.flakes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flakes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    const FRAME: f32 = 1.0 / 60.0;

    fn simulator(count: usize) -> SnowSimulator {
        SnowSimulator::new(SnowParams::default().with_count(count), SmallRng::seed_from_u64(11))
    }

    #[test]
    fn test_spawn_ranges() {
        let sim = simulator(500);
        assert_eq!(sim.len(), 500);
        assert_eq!(sim.transforms().len(), 500);
        for flake in sim.flakes() {
            let p = flake.position;
            assert!((-10.0..10.0).contains(&p.x) && (-10.0..10.0).contains(&p.z));
            assert!((-5.0..15.0).contains(&p.y));
            assert!(flake.fall_speed >= 0.02 && flake.fall_speed < 0.07);
            assert_eq!(flake.original_y, p.y);
        }
    }

    #[test]
    fn test_one_frame_falls_by_speed() {
        let mut sim = simulator(50);
        let before: Vec<_> = sim.flakes().to_vec();
        sim.tick(1.0, FRAME);
        for (old, new) in before.iter().zip(sim.flakes()) {
            if old.position.y - old.fall_speed >= -6.0 {
                assert!((new.position.y - (old.position.y - old.fall_speed)).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_flake_wraps_to_ceiling() {
        let mut sim = simulator(1);
        sim.flakes[0].position.y = -5.99;
        sim.flakes[0].fall_speed = 0.05;
        sim.tick(0.0, FRAME);

        let flake = sim.flakes()[0];
        assert_eq!(flake.position.y, 15.0);
        assert!((-10.0..10.0).contains(&flake.position.x));
        assert!((-10.0..10.0).contains(&flake.position.z));
    }

    #[test]
    fn test_flakes_stay_in_band_over_time() {
        let mut sim = simulator(200);
        for frame in 0..2000 {
            sim.tick(frame as f32 * FRAME, FRAME);
            for flake in sim.flakes() {
                assert!(flake.position.y >= -6.0 && flake.position.y <= 15.0);
            }
        }
        assert_eq!(sim.len(), 200);
    }

    #[test]
    fn test_zero_delta_keeps_height() {
        let mut sim = simulator(20);
        let before: Vec<_> = sim.flakes().iter().map(|f| f.position).collect();
        sim.tick(3.0, 0.0);
        for (old, flake) in before.iter().zip(sim.flakes()) {
            assert_eq!(*old, flake.position);
        }
    }

    #[test]
    fn test_transform_scale_and_translation() {
        let mut sim = simulator(3);
        sim.tick(0.5, FRAME);
        for (m, flake) in sim.transforms().iter().zip(sim.flakes()) {
            let (scale, _, translation) = m.to_scale_rotation_translation();
            assert!((scale - Vec3::splat(0.08)).length() < 1e-5);
            assert!((translation - flake.position).length() < 1e-5);
        }
    }
}
