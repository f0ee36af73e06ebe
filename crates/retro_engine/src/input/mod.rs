//! Keyboard and mouse state
//!
//! Events update held state as they arrive; [`InputManager::update`] publishes
//! this frame's presses and releases, so a tap shorter than a frame is still
//! seen once.

use std::collections::HashSet;

use crate::application::AppEvent;
use crate::foundation::math::Vec3;

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A key
    A,
    /// D key
    D,
    /// E key
    E,
    /// F key
    F,
    /// Q key
    Q,
    /// R key
    R,
    /// S key
    S,
    /// W key
    W,
    /// Space key
    Space,
    /// Enter key
    Enter,
    /// Escape key
    Escape,
    /// Left shift
    LeftShift,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
}

/// Input manager
#[derive(Debug, Default)]
pub struct InputManager {
    keys_down: HashSet<KeyCode>,
    keys_pressed_pending: HashSet<KeyCode>,
    keys_released_pending: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,
    buttons_down: HashSet<MouseButton>,
    buttons_pressed_pending: HashSet<MouseButton>,
    buttons_pressed: HashSet<MouseButton>,
    cursor: (f64, f64),
    cursor_delta_pending: (f64, f64),
    cursor_delta: (f64, f64),
}

impl InputManager {
    /// Create a new input manager
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one platform event
    pub fn handle_event(&mut self, event: &AppEvent) {
        match *event {
            AppEvent::KeyPressed(key) => {
                if self.keys_down.insert(key) {
                    self.keys_pressed_pending.insert(key);
                }
            }
            AppEvent::KeyReleased(key) => {
                if self.keys_down.remove(&key) {
                    self.keys_released_pending.insert(key);
                }
            }
            AppEvent::MouseButton { button, pressed } => {
                if pressed {
                    if self.buttons_down.insert(button) {
                        self.buttons_pressed_pending.insert(button);
                    }
                } else {
                    self.buttons_down.remove(&button);
                }
            }
            AppEvent::MouseMoved { x, y } => {
                self.cursor_delta_pending.0 += x - self.cursor.0;
                self.cursor_delta_pending.1 += y - self.cursor.1;
                self.cursor = (x, y);
            }
            AppEvent::WindowResized { .. } | AppEvent::CloseRequested => {}
        }
    }

    /// Publish edges collected since the last update
    pub fn update(&mut self) {
        self.keys_pressed = std::mem::take(&mut self.keys_pressed_pending);
        self.keys_released = std::mem::take(&mut self.keys_released_pending);
        self.buttons_pressed = std::mem::take(&mut self.buttons_pressed_pending);
        self.cursor_delta = std::mem::take(&mut self.cursor_delta_pending);
    }

    /// Whether a key is held
    #[must_use]
    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Whether a key went down this frame
    #[must_use]
    pub fn just_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Whether a key went up this frame
    #[must_use]
    pub fn just_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    /// Whether a mouse button is held
    #[must_use]
    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    /// Whether a mouse button went down this frame
    #[must_use]
    pub fn button_just_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    /// Cursor position in window pixels
    #[must_use]
    pub const fn cursor(&self) -> (f64, f64) {
        self.cursor
    }

    /// Cursor movement over the last frame
    #[must_use]
    pub const fn cursor_delta(&self) -> (f64, f64) {
        self.cursor_delta
    }

    /// WASD plus arrow keys as a movement direction on the XZ plane
    /// (forward is -Z), normalized
    #[must_use]
    pub fn movement_axis(&self) -> Vec3 {
        let mut axis = Vec3::zeros();
        if self.is_pressed(KeyCode::W) || self.is_pressed(KeyCode::Up) {
            axis.z -= 1.0;
        }
        if self.is_pressed(KeyCode::S) || self.is_pressed(KeyCode::Down) {
            axis.z += 1.0;
        }
        if self.is_pressed(KeyCode::A) || self.is_pressed(KeyCode::Left) {
            axis.x -= 1.0;
        }
        if self.is_pressed(KeyCode::D) || self.is_pressed(KeyCode::Right) {
            axis.x += 1.0;
        }
        axis.try_normalize(f32::EPSILON).unwrap_or(axis)
    }
}
