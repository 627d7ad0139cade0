//! The user-facing tree configuration record.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Default rotation speed in radians per second.
pub const DEFAULT_ROTATION_SPEED: f32 = 0.2;

/// An sRGB color parsed from `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Self = Self::new(0xff, 0xff, 0xff);
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `rrggbb`.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(Error::InvalidColor(hex.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| Error::InvalidColor(hex.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Build from a `0xRRGGBB` literal.
    pub(crate) const fn hex(value: u32) -> Self {
        Self::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear-light RGB for shading.
    pub fn to_linear(self) -> [f32; 3] {
        fn channel(c: u8) -> f32 {
            let c = c as f32 / 255.0;
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        [channel(self.r), channel(self.g), channel(self.b)]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Rgb {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex()
    }
}

/// Active ornament color family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrnamentTheme {
    #[default]
    Gold,
    Red,
    Silver,
}

impl OrnamentTheme {
    pub const ALL: [OrnamentTheme; 3] = [Self::Gold, Self::Red, Self::Silver];

    /// Next theme in the gold → red → silver → gold cycle.
    pub fn next(self) -> Self {
        match self {
            Self::Gold => Self::Red,
            Self::Red => Self::Silver,
            Self::Silver => Self::Gold,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Gold => "gold",
            Self::Red => "red",
            Self::Silver => "silver",
        }
    }
}

/// Named lighting moods for the fill light.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightPreset {
    Warm,
    Cool,
    Magenta,
}

impl LightPreset {
    pub const ALL: [LightPreset; 3] = [Self::Warm, Self::Cool, Self::Magenta];

    pub fn color(self) -> Rgb {
        match self {
            Self::Warm => Rgb::hex(0xffaa00),
            Self::Cool => Rgb::hex(0xafdbf5),
            Self::Magenta => Rgb::hex(0xff00ff),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Warm => "Warm",
            Self::Cool => "Cool",
            Self::Magenta => "Magenta",
        }
    }

    /// The preset whose color matches exactly, if any.
    pub fn from_color(color: Rgb) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.color() == color)
    }
}

/// Configuration read by the scene every frame.
///
/// Replaced wholesale on every change (see [`ConfigStore`](super::ConfigStore)),
/// never mutated field by field while shared.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Radians per second; 0 means the tree stands still.
    pub rotation_speed: f32,
    pub light_color: Rgb,
    pub show_snow: bool,
    pub ornament_theme: OrnamentTheme,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            rotation_speed: DEFAULT_ROTATION_SPEED,
            light_color: LightPreset::Warm.color(),
            show_snow: true,
            ornament_theme: OrnamentTheme::Gold,
        }
    }
}

impl TreeConfig {
    pub fn with_theme(&self, theme: OrnamentTheme) -> Self {
        Self { ornament_theme: theme, ..self.clone() }
    }

    pub fn with_light_color(&self, color: Rgb) -> Self {
        Self { light_color: color, ..self.clone() }
    }

    pub fn with_snow(&self, show_snow: bool) -> Self {
        Self { show_snow, ..self.clone() }
    }

    pub fn with_rotation_speed(&self, rotation_speed: f32) -> Self {
        Self { rotation_speed, ..self.clone() }
    }

    /// Any nonzero speed turns the tree; negative speeds turn it the other way.
    pub fn is_rotating(&self) -> bool {
        self.rotation_speed != 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_cycle_has_length_three() {
        let start = OrnamentTheme::Gold;
        assert_eq!(start.next(), OrnamentTheme::Red);
        assert_eq!(start.next().next(), OrnamentTheme::Silver);
        assert_eq!(start.next().next().next(), start);
    }

    #[test]
    fn test_rgb_parse() {
        assert_eq!(Rgb::from_hex("#ffaa00").unwrap(), Rgb::new(255, 170, 0));
        assert_eq!(Rgb::from_hex("AFDBF5").unwrap(), Rgb::new(0xaf, 0xdb, 0xf5));
        assert!(Rgb::from_hex("#fff").is_err());
        assert!(Rgb::from_hex("#gg0000").is_err());
        assert_eq!(Rgb::new(255, 0, 255).to_hex(), "#ff00ff");
    }

    #[test]
    fn test_linear_endpoints() {
        assert_eq!(Rgb::BLACK.to_linear(), [0.0; 3]);
        let white = Rgb::WHITE.to_linear();
        assert!(white.iter().all(|c| (c - 1.0).abs() < 1e-5));
    }

    #[test]
    fn test_light_presets() {
        assert_eq!(LightPreset::Warm.color().to_hex(), "#ffaa00");
        assert_eq!(LightPreset::Cool.color().to_hex(), "#afdbf5");
        assert_eq!(LightPreset::Magenta.color().to_hex(), "#ff00ff");
        assert_eq!(LightPreset::from_color(Rgb::hex(0xafdbf5)), Some(LightPreset::Cool));
        assert_eq!(LightPreset::from_color(Rgb::WHITE), None);
    }

    #[test]
    fn test_default_config() {
        let config = TreeConfig::default();
        assert_eq!(config.rotation_speed, 0.2);
        assert_eq!(config.light_color, LightPreset::Warm.color());
        assert!(config.show_snow);
        assert_eq!(config.ornament_theme, OrnamentTheme::Gold);
    }

    #[test]
    fn test_with_copies_leave_original() {
        let config = TreeConfig::default();
        let red = config.with_theme(OrnamentTheme::Red);
        assert_eq!(config.ornament_theme, OrnamentTheme::Gold);
        assert_eq!(red.ornament_theme, OrnamentTheme::Red);
        assert_eq!(red.light_color, config.light_color);
    }

    #[test]
    fn test_config_json() {
        let config = TreeConfig::default().with_theme(OrnamentTheme::Silver);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"silver\""));
        assert!(json.contains("\"#ffaa00\""));
        let back: TreeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_bad_color_in_json_is_rejected() {
        let result: std::result::Result<TreeConfig, _> =
            serde_json::from_str(r##"{"light_color": "#zzzzzz"}"##);
        assert!(result.is_err());
    }
}
