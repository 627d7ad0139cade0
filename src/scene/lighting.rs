//! The fixed light rig around the tree.

use glam::Vec3;

use crate::config::Rgb;
use super::node::Light;

/// A light and where it sits in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedLight {
    pub name: &'static str,
    pub position: Vec3,
    pub light: Light,
}

pub const FILL_LIGHT: &str = "fill_light";

/// Faint green ambient
pub fn ambient() -> PlacedLight {
    PlacedLight {
        name: "ambient_light",
        position: Vec3::ZERO,
        light: Light::ambient(Rgb::hex(0x000500), 0.2),
    }
}

/// Warm-white key spot above and to the right, aimed at the origin
pub fn key_spot() -> PlacedLight {
    PlacedLight {
        name: "key_light",
        position: Vec3::new(8.0, 12.0, 8.0),
        light: Light::spot(Rgb::hex(0xfff5e0), 200.0, 40.0, 0.5, 0.8),
    }
}

/// The user-colored fill from the back left
pub fn fill(color: Rgb) -> PlacedLight {
    PlacedLight {
        name: FILL_LIGHT,
        position: Vec3::new(-8.0, 6.0, -5.0),
        light: Light::point(color, 50.0, 20.0),
    }
}

/// Low amber glow from the front
pub fn under_light() -> PlacedLight {
    PlacedLight {
        name: "under_light",
        position: Vec3::new(5.0, -2.0, 5.0),
        light: Light::point(Rgb::hex(0xffaa00), 20.0, 10.0),
    }
}

/// Glow attached to the star topper, in star-local space
pub fn star_glow() -> Light {
    Light::point(Rgb::hex(0xffaa00), 2.0, 5.0)
}

/// World-placed lights, fill included
pub fn rig(fill_color: Rgb) -> [PlacedLight; 4] {
    [ambient(), key_spot(), fill(fill_color), under_light()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LightPreset;
    use crate::scene::node::LightKind;

    #[test]
    fn test_rig_uses_fill_color() {
        let rig = rig(LightPreset::Cool.color());
        let fill = rig.iter().find(|l| l.name == FILL_LIGHT).unwrap();
        assert_eq!(fill.light.color, LightPreset::Cool.color());
        assert_eq!(fill.light.intensity, 50.0);
    }

    #[test]
    fn test_key_is_spot() {
        assert!(matches!(key_spot().light.kind, LightKind::Spot { angle, .. } if angle == 0.5));
    }
}
