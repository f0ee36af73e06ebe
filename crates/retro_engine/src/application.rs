//! Game lifecycle trait and platform events

use thiserror::Error;

use crate::engine::Engine;
use crate::input::{KeyCode, MouseButton};

/// Game lifecycle trait
///
/// Implement this to drive a game with [`Engine::run`].
pub trait Game {
    /// Called once, on the first frame, before physics runs for the first time.
    /// Spawn the initial scene here.
    fn begin_play(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Called every later frame before physics, with the frame delta in seconds
    fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError>;

    /// Called for every platform event after input state has seen it
    fn handle_event(&mut self, _engine: &mut Engine, _event: &AppEvent) -> Result<(), AppError> {
        Ok(())
    }

    /// Called once after the loop exits
    fn end_play(&mut self, _engine: &mut Engine) {}
}

/// Game-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Custom game error
    #[error("Game error: {0}")]
    Custom(String),

    /// Scene setup failed
    #[error("Scene error: {0}")]
    Scene(#[from] crate::scene::SceneError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Platform events
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// Window was resized
    WindowResized {
        /// New window width
        width: u32,
        /// New window height
        height: u32,
    },

    /// Window close requested
    CloseRequested,

    /// Key was pressed
    KeyPressed(KeyCode),

    /// Key was released
    KeyReleased(KeyCode),

    /// Mouse button event
    MouseButton {
        /// The mouse button that was pressed/released
        button: MouseButton,
        /// Whether the button was pressed (true) or released (false)
        pressed: bool,
    },

    /// Mouse movement
    MouseMoved {
        /// New X coordinate
        x: f64,
        /// New Y coordinate
        y: f64,
    },
}
