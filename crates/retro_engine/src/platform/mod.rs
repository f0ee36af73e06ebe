//! Window and event source abstraction

mod headless;

#[cfg(feature = "window")]
mod glfw_window;

use thiserror::Error;

use crate::application::AppEvent;

pub use headless::HeadlessPlatform;

#[cfg(feature = "window")]
pub use glfw_window::GlfwPlatform;

/// Platform errors
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Windowing library failed to start
    #[error("Platform initialization failed: {0}")]
    InitializationFailed(String),

    /// Window could not be created
    #[error("Window creation failed")]
    CreationFailed,
}

/// Source of platform events and window size
pub trait Platform {
    /// Collect every event that arrived since the last call
    fn poll_events(&mut self) -> Vec<AppEvent>;

    /// Current window size in pixels
    fn window_size(&self) -> (u32, u32);
}
