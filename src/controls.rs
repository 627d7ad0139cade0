//! Keyboard bindings for the control panel actions.

use winit::keyboard::KeyCode;

use crate::app::UserAction;
use crate::config::{LightPreset, OrnamentTheme};

/// Key to action, `None` for unbound keys.
pub fn action_for_key(key: KeyCode) -> Option<UserAction> {
    let action = match key {
        KeyCode::Digit1 => UserAction::SetTheme(OrnamentTheme::Gold),
        KeyCode::Digit2 => UserAction::SetTheme(OrnamentTheme::Red),
        KeyCode::Digit3 => UserAction::SetTheme(OrnamentTheme::Silver),
        KeyCode::KeyW => UserAction::SetLight(LightPreset::Warm),
        KeyCode::KeyC => UserAction::SetLight(LightPreset::Cool),
        KeyCode::KeyM => UserAction::SetLight(LightPreset::Magenta),
        KeyCode::KeyN => UserAction::ToggleSnow,
        KeyCode::KeyR => UserAction::ToggleRotation,
        KeyCode::Escape => UserAction::DismissViewer,
        _ => return None,
    };
    Some(action)
}

/// One-line help shown at startup
pub const HELP: &str = "1/2/3 theme | W/C/M light | N snow | R rotation | Esc close viewer | \
                        click background: next theme | click tree: photos | drop images to upload";
