//! Immediate-mode UI input context
//!
//! Layout and drawing belong to the renderer. This context only tracks the
//! cursor against a list of clickable regions and reports clicks, which is
//! all the frame loop needs from UI.

use crate::application::AppEvent;
use crate::input::MouseButton;

/// Clickable screen rectangle in window pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiRegion {
    /// Caller-chosen identifier
    pub id: u32,
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl UiRegion {
    /// Whether a point lies inside
    #[must_use]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// UI input state for one frame
#[derive(Debug, Default)]
pub struct UiContext {
    cursor: (f32, f32),
    left_down: bool,
    screen_size: (u32, u32),
    regions: Vec<UiRegion>,
    pressed_region: Option<u32>,
    clicked: Vec<u32>,
}

impl UiContext {
    /// Create for a screen of the given size
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            screen_size: (width, height),
            ..Self::default()
        }
    }

    /// Register a clickable region, replacing one with the same id
    pub fn add_region(&mut self, region: UiRegion) {
        self.regions.retain(|existing| existing.id != region.id);
        self.regions.push(region);
    }

    /// Remove a region
    pub fn remove_region(&mut self, id: u32) {
        self.regions.retain(|region| region.id != id);
    }

    /// Feed one platform event
    #[allow(clippy::cast_possible_truncation)]
    pub fn handle_event(&mut self, event: &AppEvent) {
        match *event {
            AppEvent::MouseMoved { x, y } => self.cursor = (x as f32, y as f32),
            AppEvent::MouseButton {
                button: MouseButton::Left,
                pressed,
            } => {
                let hovered = self.hovered();
                if pressed {
                    self.left_down = true;
                    self.pressed_region = hovered;
                } else {
                    self.left_down = false;
                    // A click is press and release on the same region
                    if let Some(id) = self.pressed_region.take() {
                        if hovered == Some(id) {
                            self.clicked.push(id);
                        }
                    }
                }
            }
            AppEvent::WindowResized { width, height } => self.screen_size = (width, height),
            _ => {}
        }
    }

    /// Topmost region under the cursor (last added wins)
    #[must_use]
    pub fn hovered(&self) -> Option<u32> {
        self.regions
            .iter()
            .rev()
            .find(|region| region.contains(self.cursor.0, self.cursor.1))
            .map(|region| region.id)
    }

    /// Take the clicks recorded since the last call
    pub fn take_clicks(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.clicked)
    }

    /// Whether the left button is held
    #[must_use]
    pub const fn is_pointer_down(&self) -> bool {
        self.left_down
    }

    /// Cursor position
    #[must_use]
    pub const fn cursor(&self) -> (f32, f32) {
        self.cursor
    }

    /// Screen size in pixels
    #[must_use]
    pub const fn screen_size(&self) -> (u32, u32) {
        self.screen_size
    }

    /// Registered regions
    #[must_use]
    pub fn regions(&self) -> &[UiRegion] {
        &self.regions
    }
}
