//! Input state tracking

use std::collections::HashSet;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Cursor travel (in pixels) beyond which a press becomes a drag
pub const CLICK_DRAG_THRESHOLD: f32 = 4.0;

/// Tracks keyboard and mouse input state
pub struct InputState {
    /// Currently pressed keys
    keys_pressed: HashSet<KeyCode>,
    /// Keys pressed this frame
    keys_just_pressed: HashSet<KeyCode>,
    /// Mouse movement delta since last frame
    mouse_delta: (f32, f32),
    /// Current mouse position
    mouse_position: (f32, f32),
    /// Currently pressed mouse buttons
    mouse_buttons: HashSet<MouseButton>,
    /// Scroll lines accumulated this frame (positive = towards the scene)
    scroll: f32,
    /// Left-press origin and the distance travelled since
    press: Option<((f32, f32), f32)>,
    /// Completed clicks awaiting dispatch
    clicks: Vec<(f32, f32)>,
}

impl InputState {
    /// Create new input state
    pub fn new() -> Self {
        Self {
            keys_pressed: HashSet::new(),
            keys_just_pressed: HashSet::new(),
            mouse_delta: (0.0, 0.0),
            mouse_position: (0.0, 0.0),
            mouse_buttons: HashSet::new(),
            scroll: 0.0,
            press: None,
            clicks: Vec::new(),
        }
    }

    /// Process a window event
    pub fn process_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    physical_key: PhysicalKey::Code(key_code),
                    state,
                    ..
                },
                ..
            } => {
                match state {
                    ElementState::Pressed => {
                        if !self.keys_pressed.contains(key_code) {
                            self.keys_just_pressed.insert(*key_code);
                        }
                        self.keys_pressed.insert(*key_code);
                    }
                    ElementState::Released => {
                        self.keys_pressed.remove(key_code);
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.mouse_button(*button, *state);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 40.0,
                };
            }
            _ => {}
        }
    }

    fn cursor_moved(&mut self, x: f32, y: f32) {
        let dx = x - self.mouse_position.0;
        let dy = y - self.mouse_position.1;
        self.mouse_delta.0 += dx;
        self.mouse_delta.1 += dy;
        self.mouse_position = (x, y);

        if let Some((_, travelled)) = &mut self.press {
            *travelled += (dx * dx + dy * dy).sqrt();
        }
    }

    fn mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.mouse_buttons.insert(button);
                if button == MouseButton::Left {
                    self.press = Some((self.mouse_position, 0.0));
                }
            }
            ElementState::Released => {
                self.mouse_buttons.remove(&button);
                if button == MouseButton::Left {
                    if let Some((origin, travelled)) = self.press.take() {
                        if travelled < CLICK_DRAG_THRESHOLD {
                            self.clicks.push(origin);
                        }
                    }
                }
            }
        }
    }

    /// Call at end of frame to reset per-frame state
    pub fn end_frame(&mut self) {
        self.keys_just_pressed.clear();
        self.mouse_delta = (0.0, 0.0);
        self.scroll = 0.0;
    }

    /// Check if key is currently pressed
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Check if key was just pressed this frame
    pub fn is_key_just_pressed(&self, key: KeyCode) -> bool {
        self.keys_just_pressed.contains(&key)
    }

    /// Keys pressed this frame
    pub fn just_pressed_keys(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.keys_just_pressed.iter().copied()
    }

    /// Get mouse delta since last frame
    pub fn mouse_delta(&self) -> (f32, f32) {
        self.mouse_delta
    }

    /// Get current mouse position
    pub fn mouse_position(&self) -> (f32, f32) {
        self.mouse_position
    }

    /// Check if mouse button is pressed
    pub fn is_mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button)
    }

    /// Whether the left button is held and has moved past the click threshold
    pub fn is_dragging(&self) -> bool {
        matches!(self.press, Some((_, travelled)) if travelled >= CLICK_DRAG_THRESHOLD)
    }

    /// Scroll accumulated this frame
    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    /// Drain completed clicks (cursor position at press time)
    pub fn take_clicks(&mut self) -> Vec<(f32, f32)> {
        std::mem::take(&mut self.clicks)
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_press() {
        let mut input = InputState::new();

        assert!(!input.is_key_pressed(KeyCode::KeyR));

        input.keys_pressed.insert(KeyCode::KeyR);
        input.keys_just_pressed.insert(KeyCode::KeyR);

        assert!(input.is_key_pressed(KeyCode::KeyR));
        assert!(input.is_key_just_pressed(KeyCode::KeyR));

        input.end_frame();

        assert!(input.is_key_pressed(KeyCode::KeyR));
        assert!(!input.is_key_just_pressed(KeyCode::KeyR));
    }

    #[test]
    fn test_still_press_is_click() {
        let mut input = InputState::new();
        input.cursor_moved(100.0, 50.0);
        input.mouse_button(MouseButton::Left, ElementState::Pressed);
        input.cursor_moved(101.0, 50.0);
        input.mouse_button(MouseButton::Left, ElementState::Released);

        assert_eq!(input.take_clicks(), vec![(100.0, 50.0)]);
        assert!(input.take_clicks().is_empty());
    }

    #[test]
    fn test_drag_is_not_click() {
        let mut input = InputState::new();
        input.mouse_button(MouseButton::Left, ElementState::Pressed);
        input.cursor_moved(30.0, 0.0);
        assert!(input.is_dragging());
        input.mouse_button(MouseButton::Left, ElementState::Released);

        assert!(input.take_clicks().is_empty());
        assert!(!input.is_dragging());
    }

    #[test]
    fn test_right_button_never_clicks() {
        let mut input = InputState::new();
        input.mouse_button(MouseButton::Right, ElementState::Pressed);
        input.mouse_button(MouseButton::Right, ElementState::Released);
        assert!(input.take_clicks().is_empty());
    }

    #[test]
    fn test_mouse_delta_resets() {
        let mut input = InputState::new();
        input.cursor_moved(10.0, 5.0);
        assert_eq!(input.mouse_delta(), (10.0, 5.0));
        input.end_frame();
        assert_eq!(input.mouse_delta(), (0.0, 0.0));
    }
}
