//! Named ornament colors.

use serde::{Deserialize, Serialize};

use crate::config::Rgb;

/// A named entry of the ornament palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteColor {
    Gold,
    Red,
    Green,
    Silver,
    Black,
}

impl PaletteColor {
    pub const ALL: [PaletteColor; 5] = [
        Self::Gold,
        Self::Red,
        Self::Green,
        Self::Silver,
        Self::Black,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Color lookup for palette entries.
///
/// Owned by whoever builds the scene and passed down explicitly.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    colors: [Rgb; 5],
}

impl Palette {
    pub fn new(gold: Rgb, red: Rgb, green: Rgb, silver: Rgb, black: Rgb) -> Self {
        Self { colors: [gold, red, green, silver, black] }
    }

    pub fn get(&self, color: PaletteColor) -> Rgb {
        self.colors[color.index()]
    }

    /// Linear RGB, ready for shading
    pub fn linear(&self, color: PaletteColor) -> [f32; 3] {
        self.get(color).to_linear()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(
            Rgb::hex(0xFFD700),
            Rgb::hex(0xC41E3A),
            Rgb::hex(0x0f2f20),
            Rgb::hex(0xE0E0E0),
            Rgb::hex(0x111111),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_palette() {
        let palette = Palette::default();
        assert_eq!(palette.get(PaletteColor::Gold).to_hex(), "#ffd700");
        assert_eq!(palette.get(PaletteColor::Red).to_hex(), "#c41e3a");
        assert_eq!(palette.get(PaletteColor::Green).to_hex(), "#0f2f20");
        assert_eq!(palette.get(PaletteColor::Silver).to_hex(), "#e0e0e0");
        assert_eq!(palette.get(PaletteColor::Black).to_hex(), "#111111");
    }

    #[test]
    fn test_index_matches_all_order() {
        for (i, color) in PaletteColor::ALL.iter().enumerate() {
            assert_eq!(color.index(), i);
        }
    }
}
