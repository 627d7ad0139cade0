//! Post-processing parameters for the final image.

use glam::Vec2;

use crate::config::Rgb;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BloomSettings {
    /// Luminance above which pixels glow
    pub threshold: f32,
    pub intensity: f32,
    /// Blur spread, 0 is tight and 1 is wide
    pub radius: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VignetteSettings {
    pub offset: f32,
    pub darkness: f32,
}

/// Radial gradient drawn where nothing was rendered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackgroundGradient {
    pub inner: Rgb,
    pub outer: Rgb,
    /// Center in normalized screen coordinates (origin top-left)
    pub center: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PostSettings {
    pub bloom: BloomSettings,
    pub vignette: VignetteSettings,
    /// Film grain opacity
    pub grain: f32,
    pub exposure: f32,
    pub background: BackgroundGradient,
}

impl Default for PostSettings {
    fn default() -> Self {
        Self {
            bloom: BloomSettings { threshold: 1.0, intensity: 1.5, radius: 0.4 },
            vignette: VignetteSettings { offset: 0.1, darkness: 1.0 },
            grain: 0.02,
            exposure: 1.0,
            background: BackgroundGradient {
                inner: Rgb::hex(0x1a1f1a),
                outer: Rgb::BLACK,
                center: Vec2::new(0.5, 0.4),
            },
        }
    }
}
