//! Copy-on-write holder for the shared [`TreeConfig`].

use std::sync::Arc;

use super::tree::{LightPreset, OrnamentTheme, TreeConfig, DEFAULT_ROTATION_SPEED};

/// Owns the current [`TreeConfig`].
///
/// Readers take an `Arc` snapshot; writers build a complete new record and
/// swap it in, so a snapshot never observes a partial update.
pub struct ConfigStore {
    current: Arc<TreeConfig>,
    /// Speed restored when rotation is toggled back on
    default_rotation_speed: f32,
}

impl ConfigStore {
    pub fn new(initial: TreeConfig) -> Self {
        let default_rotation_speed = if initial.is_rotating() {
            initial.rotation_speed
        } else {
            DEFAULT_ROTATION_SPEED
        };
        Self {
            current: Arc::new(initial),
            default_rotation_speed,
        }
    }

    /// Override the speed used when rotation is switched back on.
    /// Zero would make the toggle a no-op, so it keeps the current default.
    pub fn with_default_rotation_speed(mut self, speed: f32) -> Self {
        if speed != 0.0 {
            self.default_rotation_speed = speed;
        }
        self
    }

    /// Current config. Cheap; clones an `Arc`.
    pub fn snapshot(&self) -> Arc<TreeConfig> {
        Arc::clone(&self.current)
    }

    /// Borrow the current config
    pub fn get(&self) -> &TreeConfig {
        &self.current
    }

    /// Replace the whole record. Returns `true` if anything changed.
    pub fn replace(&mut self, next: TreeConfig) -> bool {
        if *self.current == next {
            return false;
        }
        self.current = Arc::new(next);
        true
    }

    /// Derive a new record from the current one and swap it in.
    pub fn update(&mut self, f: impl FnOnce(&TreeConfig) -> TreeConfig) -> bool {
        let next = f(&self.current);
        self.replace(next)
    }

    pub fn cycle_theme(&mut self) -> bool {
        self.update(|c| c.with_theme(c.ornament_theme.next()))
    }

    pub fn set_theme(&mut self, theme: OrnamentTheme) -> bool {
        self.update(|c| c.with_theme(theme))
    }

    pub fn set_light(&mut self, preset: LightPreset) -> bool {
        self.update(|c| c.with_light_color(preset.color()))
    }

    pub fn toggle_snow(&mut self) -> bool {
        self.update(|c| c.with_snow(!c.show_snow))
    }

    /// Nonzero speed goes to 0, zero goes back to the default speed.
    pub fn toggle_rotation(&mut self) -> bool {
        let resume = self.default_rotation_speed;
        self.update(|c| {
            let speed = if c.is_rotating() { 0.0 } else { resume };
            c.with_rotation_speed(speed)
        })
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(TreeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_is_not_affected_by_later_updates() {
        let mut store = ConfigStore::default();
        let before = store.snapshot();

        assert!(store.set_theme(OrnamentTheme::Silver));

        assert_eq!(before.ornament_theme, OrnamentTheme::Gold);
        assert_eq!(store.get().ornament_theme, OrnamentTheme::Silver);
        assert!(!Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn test_unchanged_update_keeps_identity() {
        let mut store = ConfigStore::default();
        let before = store.snapshot();
        assert!(!store.set_theme(OrnamentTheme::Gold));
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn test_three_cycles_return_to_gold() {
        let mut store = ConfigStore::default();
        let seen: Vec<_> = (0..3)
            .map(|_| {
                store.cycle_theme();
                store.get().ornament_theme
            })
            .collect();
        assert_eq!(seen, vec![OrnamentTheme::Red, OrnamentTheme::Silver, OrnamentTheme::Gold]);
    }

    #[test]
    fn test_toggle_rotation() {
        let mut store = ConfigStore::default();
        store.toggle_rotation();
        assert_eq!(store.get().rotation_speed, 0.0);
        store.toggle_rotation();
        assert_eq!(store.get().rotation_speed, DEFAULT_ROTATION_SPEED);
    }

    #[test]
    fn test_toggle_rotation_resumes_custom_speed() {
        let mut store = ConfigStore::new(TreeConfig::default().with_rotation_speed(0.0))
            .with_default_rotation_speed(0.7);
        store.toggle_rotation();
        assert_eq!(store.get().rotation_speed, 0.7);
    }

    #[test]
    fn test_toggle_rotation_stops_negative_speed() {
        let mut store = ConfigStore::new(TreeConfig::default().with_rotation_speed(-0.3))
            .with_default_rotation_speed(-0.3);
        assert!(store.toggle_rotation());
        assert_eq!(store.get().rotation_speed, 0.0);
        assert!(store.toggle_rotation());
        assert_eq!(store.get().rotation_speed, -0.3);
    }

    #[test]
    fn test_zero_default_speed_still_resumes() {
        let mut store = ConfigStore::new(TreeConfig::default().with_rotation_speed(0.0))
            .with_default_rotation_speed(0.0);
        assert_eq!(store.get().rotation_speed, 0.0);
        assert!(store.toggle_rotation());
        assert_eq!(store.get().rotation_speed, DEFAULT_ROTATION_SPEED);
        assert!(store.toggle_rotation());
        assert_eq!(store.get().rotation_speed, 0.0);
    }

    #[test]
    fn test_toggle_snow_and_light() {
        let mut store = ConfigStore::default();
        store.toggle_snow();
        assert!(!store.get().show_snow);
        store.set_light(LightPreset::Magenta);
        assert_eq!(store.get().light_color, LightPreset::Magenta.color());
        // Other fields survive the copy
        assert!(!store.get().show_snow);
    }
}
