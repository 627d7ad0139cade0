//! Application state shared by the window loop and tests.
//!
//! `AppShell` turns user actions into config replacements and gallery
//! changes, then hands the new config to the scene composer so the next
//! tick sees a consistent record.

use std::path::PathBuf;
use std::sync::Arc;

use rand::rngs::SmallRng;

use crate::config::{AppSettings, ConfigStore, LightPreset, OrnamentTheme, TreeConfig, WindowSettings};
use crate::gallery::{Gallery, ImageViewer, ViewerHit};
use crate::generation::Palette;
use crate::math::Ray;
use crate::scene::{ComposedFrame, SceneComposer};

/// What a click landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickTarget {
    /// Empty space around the tree
    Background,
    Tree,
    /// The open image viewer
    Viewer,
}

#[derive(Clone, Debug, PartialEq)]
pub enum UserAction {
    Click(ClickTarget),
    SetTheme(OrnamentTheme),
    SetLight(LightPreset),
    ToggleSnow,
    ToggleRotation,
    Upload(Vec<PathBuf>),
    DismissViewer,
}

pub struct AppShell {
    store: ConfigStore,
    gallery: Gallery,
    viewer: ImageViewer,
    composer: SceneComposer,
}

impl AppShell {
    pub fn new(settings: &AppSettings, rng: SmallRng) -> Self {
        let speed = settings.default_rotation_speed;
        let store = ConfigStore::new(TreeConfig::default().with_rotation_speed(speed))
            .with_default_rotation_speed(speed);
        let mut composer = SceneComposer::new(settings, Palette::default(), rng);
        composer.sync(store.get());

        Self {
            store,
            gallery: Gallery::with_defaults(&settings.images),
            viewer: ImageViewer::new(),
            composer,
        }
    }

    /// Classify a click ray. The open viewer captures every click.
    pub fn resolve_click(&self, ray: &Ray) -> ClickTarget {
        if self.viewer.is_open() {
            ClickTarget::Viewer
        } else {
            self.composer.pick(ray)
        }
    }

    /// Apply one action. Returns `true` if the tree config changed.
    pub fn apply(&mut self, action: UserAction) -> bool {
        let changed = match action {
            // Nothing behind the viewer reacts while it is open
            UserAction::Click(_) if self.viewer.is_open() => {
                self.viewer.click(ViewerHit::Backdrop);
                false
            }
            UserAction::Click(ClickTarget::Viewer) => false,
            UserAction::Click(ClickTarget::Background) => self.store.cycle_theme(),
            UserAction::Click(ClickTarget::Tree) => {
                match self.gallery.next_for_display() {
                    Some(image) => self.viewer.open(image),
                    None => log::info!("Gallery is empty, nothing to show"),
                }
                false
            }
            UserAction::SetTheme(theme) => self.store.set_theme(theme),
            UserAction::SetLight(preset) => {
                let changed = self.store.set_light(preset);
                if changed {
                    log::info!("Light set to {} ({})", preset.name(), preset.color());
                }
                changed
            }
            UserAction::ToggleSnow => self.store.toggle_snow(),
            UserAction::ToggleRotation => self.store.toggle_rotation(),
            UserAction::Upload(paths) => {
                self.gallery.upload(&paths);
                false
            }
            UserAction::DismissViewer => {
                self.viewer.dismiss();
                false
            }
        };

        if changed {
            let config = self.store.snapshot();
            let changes = self.composer.sync(&config);
            if changes.tree_regenerated {
                log::info!("Theme set to {}", config.ornament_theme.name());
            }
            if changes.snow_toggled {
                log::info!("Snow {}", if config.show_snow { "on" } else { "off" });
            }
        }
        changed
    }

    /// Advance the scene by one frame.
    pub fn tick(&mut self, elapsed: f32, delta: f32) {
        self.composer.tick(elapsed, delta);
    }

    pub fn frame(&mut self) -> ComposedFrame {
        self.composer.frame()
    }

    pub fn config(&self) -> Arc<TreeConfig> {
        self.store.snapshot()
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub fn viewer(&self) -> &ImageViewer {
        &self.viewer
    }

    pub fn composer(&self) -> &SceneComposer {
        &self.composer
    }
}

/// Window caption with frame rate, theme and snow state.
pub fn window_title(window: &WindowSettings, fps: f32, config: &TreeConfig) -> String {
    format!(
        "{} - {:.0} FPS | {} theme{}",
        window.caption(),
        fps,
        config.ornament_theme.name(),
        if config.show_snow { " | snow" } else { "" },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use crate::gallery::ImageRef;
    use crate::generation::StarfieldParams;

    fn shell() -> AppShell {
        let settings = AppSettings {
            snow_count: 20,
            starfield: StarfieldParams { count: 10, ..Default::default() },
            ..Default::default()
        };
        AppShell::new(&settings, SmallRng::seed_from_u64(5))
    }

    #[test]
    fn test_background_clicks_cycle_theme() {
        let mut app = shell();
        let themes: Vec<_> = (0..3)
            .map(|_| {
                app.apply(UserAction::Click(ClickTarget::Background));
                app.config().ornament_theme
            })
            .collect();
        assert_eq!(themes, vec![OrnamentTheme::Red, OrnamentTheme::Silver, OrnamentTheme::Gold]);
        assert_eq!(app.composer().config().ornament_theme, OrnamentTheme::Gold);
    }

    #[test]
    fn test_tree_click_opens_viewer_without_theme_change() {
        let mut app = shell();
        assert!(!app.apply(UserAction::Click(ClickTarget::Tree)));
        assert!(app.viewer().is_open());
        assert_eq!(app.viewer().selected(), app.gallery().get(0));
        assert_eq!(app.config().ornament_theme, OrnamentTheme::Gold);
    }

    #[test]
    fn test_viewer_click_only_dismisses() {
        let mut app = shell();
        app.apply(UserAction::Click(ClickTarget::Tree));
        let before = app.config();

        // Even a background click is swallowed while the viewer is open
        app.apply(UserAction::Click(ClickTarget::Background));
        assert!(!app.viewer().is_open());
        assert_eq!(*app.config(), *before);

        let ray = Ray::new(glam::Vec3::new(0.0, 0.0, 20.0), glam::Vec3::NEG_Z);
        app.apply(UserAction::Click(ClickTarget::Tree));
        assert_eq!(app.resolve_click(&ray), ClickTarget::Viewer);
        app.apply(UserAction::Click(ClickTarget::Viewer));
        assert!(!app.viewer().is_open());
    }

    #[test]
    fn test_toggles_and_presets() {
        let mut app = shell();
        app.apply(UserAction::ToggleSnow);
        assert!(!app.config().show_snow);
        app.apply(UserAction::ToggleRotation);
        assert_eq!(app.config().rotation_speed, 0.0);
        app.apply(UserAction::ToggleRotation);
        assert_eq!(app.config().rotation_speed, 0.2);
        assert!(app.apply(UserAction::SetLight(LightPreset::Cool)));
        assert!(!app.apply(UserAction::SetLight(LightPreset::Cool)));
        assert_eq!(app.composer().config().light_color, LightPreset::Cool.color());
        app.apply(UserAction::SetTheme(OrnamentTheme::Silver));
        assert_eq!(app.composer().config().ornament_theme, OrnamentTheme::Silver);
    }

    #[test]
    fn test_upload_then_tree_click_shows_newest() {
        let mut app = shell();
        app.apply(UserAction::Upload(vec!["one.png".into(), "two.png".into()]));
        assert_eq!(app.gallery().len(), 7);
        app.apply(UserAction::Click(ClickTarget::Tree));
        assert_eq!(app.viewer().selected(), Some(&ImageRef::Local("one.png".into())));
        app.apply(UserAction::DismissViewer);
        assert!(!app.viewer().is_open());
    }

    #[test]
    fn test_window_title() {
        let config = TreeConfig::default();
        let title = window_title(&WindowSettings::default(), 59.6, &config);
        assert!(title.starts_with("YLH MERRY CHRISTMAS | Evergreen - 60 FPS"));
        assert!(title.contains(config.ornament_theme.name()));
        assert_eq!(title.ends_with(" | snow"), config.show_snow);
    }
}
