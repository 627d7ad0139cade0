//! Scene configuration: the per-frame tree config and application settings

pub mod settings;
pub mod store;
pub mod tree;

pub use settings::{AppSettings, WindowSettings};
pub use store::ConfigStore;
pub use tree::{LightPreset, OrnamentTheme, Rgb, TreeConfig};
