//! Application settings loaded from JSON at startup.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::generation::{StarfieldParams, TreeParams};
use super::tree::DEFAULT_ROTATION_SPEED;

/// Settings file looked up in the working directory when none is given
pub const DEFAULT_SETTINGS_FILE: &str = "evergreen.json";

/// Gallery images shown before anything is uploaded
pub const DEFAULT_IMAGES: [&str; 5] = [
    "https://images.unsplash.com/photo-1543589077-47d81606c1bf?auto=format&fit=crop&w=600&q=80",
    "https://images.unsplash.com/photo-1512389142860-9c449e58a543?auto=format&fit=crop&w=600&q=80",
    "https://images.unsplash.com/photo-1576919228236-a097c32a58be?auto=format&fit=crop&w=600&q=80",
    "https://images.unsplash.com/photo-1482638202372-7848b6b08d29?auto=format&fit=crop&w=600&q=80",
    "https://images.unsplash.com/photo-1513297887119-d46091b24bfa?auto=format&fit=crop&w=600&q=80",
];

/// Window creation parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    /// Banner shown ahead of the title; empty hides it
    pub greeting: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Evergreen".to_string(),
            greeting: "YLH MERRY CHRISTMAS".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

impl WindowSettings {
    /// Greeting and title as one caption
    pub fn caption(&self) -> String {
        if self.greeting.is_empty() {
            self.title.clone()
        } else {
            format!("{} | {}", self.greeting, self.title)
        }
    }
}

/// Everything tunable without recompiling.
///
/// Every field has a default, so a partial file (or `{}`) is valid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub window: WindowSettings,
    pub tree: TreeParams,
    /// Snowflakes in the scene
    pub snow_count: usize,
    pub starfield: StarfieldParams,
    /// Speed restored when rotation is toggled back on (rad/s)
    pub default_rotation_speed: f32,
    /// Initial gallery contents, most recent first
    pub images: Vec<String>,
    /// Fixed RNG seed; entropy when absent
    pub seed: Option<u64>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            window: WindowSettings::default(),
            tree: TreeParams::default(),
            snow_count: 600,
            starfield: StarfieldParams::default(),
            default_rotation_speed: DEFAULT_ROTATION_SPEED,
            images: DEFAULT_IMAGES.iter().map(|s| s.to_string()).collect(),
            seed: None,
        }
    }
}

impl AppSettings {
    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Load `path` if given, else `evergreen.json` if present, else defaults.
    ///
    /// An explicit path that fails to load is an error; a broken fallback file
    /// is logged and ignored.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            let settings = Self::load(path)?;
            log::info!("Loaded settings from {}", path.display());
            return Ok(settings);
        }

        let fallback = Path::new(DEFAULT_SETTINGS_FILE);
        if fallback.exists() {
            match Self::load(fallback) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", fallback.display());
                    return Ok(settings);
                }
                Err(e) => log::warn!("Ignoring {}: {}", fallback.display(), e),
            }
        }
        Ok(Self::default())
    }

    /// Save as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;

    #[test]
    fn test_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.snow_count, 600);
        assert_eq!(settings.images.len(), 5);
        assert_eq!(settings.tree.candidate_count, 750);
        assert_eq!(settings.starfield.count, 5000);
        assert!(settings.seed.is_none());
    }

    #[test]
    fn test_caption_carries_greeting() {
        let mut window = WindowSettings::default();
        assert_eq!(window.caption(), "YLH MERRY CHRISTMAS | Evergreen");
        window.greeting.clear();
        assert_eq!(window.caption(), "Evergreen");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = AppSettings::default();
        settings.seed = Some(42);
        settings.window.title = "Tree".to_string();
        settings.save(&path).unwrap();

        let loaded = AppSettings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "snow_count": 10, "window": { "width": 800 } }"#).unwrap();

        let loaded = AppSettings::load(&path).unwrap();
        assert_eq!(loaded.snow_count, 10);
        assert_eq!(loaded.window.width, 800);
        assert_eq!(loaded.window.height, 720);
        assert_eq!(loaded.images.len(), 5);
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppSettings::load_or_default(Some(&dir.path().join("nope.json")));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_malformed_file_is_settings_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(AppSettings::load(&path), Err(Error::Settings(_))));
    }
}
