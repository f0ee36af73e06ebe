//! # Engine Configuration
//!
//! Configuration sections for every subsystem the frame loop drives. Each
//! section has builder-style `with_*` setters, sensible defaults and a
//! `validate()` check. [`EngineConfig`] aggregates them and can be persisted
//! as TOML or RON through the [`Config`] trait.
//!
//! ```toml
//! log_level = "info"
//!
//! [physics]
//! fixed_timestep = 0.016666668
//! gravity = [0.0, -9.81, 0.0]
//! ```

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;

pub use crate::config::{Config, ConfigError};

/// # Window Configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial client width in pixels
    pub width: u32,
    /// Initial client height in pixels
    pub height: u32,
    /// Whether the user may resize the window
    pub resizable: bool,
}

impl WindowConfig {
    /// Create a window configuration with the given title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the initial size
    #[must_use]
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "Window size must be non-zero, got {}x{}",
                self.width, self.height
            ));
        }
        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Retro Engine".to_string(),
            width: 1280,
            height: 960,
            resizable: true,
        }
    }
}

/// # Character Controller Configuration
///
/// Tuning for the collide-and-slide controller shared by every character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    /// Skin gap kept between the capsule and obstacles, in meters
    pub skin_offset: f32,
    /// Steepest slope the character can walk up, in degrees
    pub max_slope_climb_degrees: f32,
    /// Slopes steeper than this make the character slide, in degrees
    pub min_slope_slide_degrees: f32,
    /// Distance within which the character snaps down to the ground
    pub snap_to_ground: f32,
    /// Highest step climbed automatically (0 disables autostep)
    pub autostep_height: f32,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            skin_offset: 0.02,
            max_slope_climb_degrees: 45.0,
            min_slope_slide_degrees: 30.0,
            snap_to_ground: 0.2,
            autostep_height: 0.3,
        }
    }
}

/// # Physics Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Simulation step size in seconds
    pub fixed_timestep: f32,
    /// Gravity acceleration
    pub gravity: Vec3,
    /// Most simulation steps run in one frame; leftover time is dropped
    pub max_substeps: u32,
    /// Pull in parallel once this many bodies need syncing
    pub parallel_pull_threshold: usize,
    /// Emit collider wireframes to the debug renderer
    pub debug_draw: bool,
    /// Character controller tuning
    pub character: CharacterConfig,
}

impl PhysicsConfig {
    /// Set the fixed timestep in seconds
    #[must_use]
    pub const fn with_fixed_timestep(mut self, seconds: f32) -> Self {
        self.fixed_timestep = seconds;
        self
    }

    /// Set gravity
    #[must_use]
    pub const fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the substep cap
    #[must_use]
    pub const fn with_max_substeps(mut self, steps: u32) -> Self {
        self.max_substeps = steps;
        self
    }

    /// Set the parallel pull cutoff
    #[must_use]
    pub const fn with_parallel_pull_threshold(mut self, threshold: usize) -> Self {
        self.parallel_pull_threshold = threshold;
        self
    }

    /// Enable or disable debug wireframes
    #[must_use]
    pub const fn with_debug_draw(mut self, enabled: bool) -> Self {
        self.debug_draw = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.fixed_timestep.is_finite() && self.fixed_timestep > 0.0) {
            return Err(format!(
                "Fixed timestep must be positive, got {}",
                self.fixed_timestep
            ));
        }
        if self.max_substeps == 0 {
            return Err("Max substeps must be at least 1".to_string());
        }
        if !self.gravity.iter().all(|g| g.is_finite()) {
            return Err("Gravity must be finite".to_string());
        }
        if self.character.skin_offset < 0.0 {
            return Err("Character skin offset cannot be negative".to_string());
        }
        Ok(())
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 60.0,
            gravity: Vec3::new(0.0, -9.81, 0.0),
            max_substeps: 8,
            parallel_pull_threshold: 256,
            debug_draw: cfg!(debug_assertions),
            character: CharacterConfig::default(),
        }
    }
}

/// # Render Configuration
///
/// The scene is drawn into a low internal resolution and upscaled with
/// nearest filtering for the PS1 look.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Internal render target height; width follows the window aspect
    pub internal_height: u32,
    /// Only upscale by whole multiples of the internal resolution
    pub integer_scaling: bool,
    /// Background clear color (linear RGB)
    pub clear_color: [f32; 3],
}

impl RenderConfig {
    /// Set the internal render height
    #[must_use]
    pub const fn with_internal_height(mut self, height: u32) -> Self {
        self.internal_height = height;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.internal_height == 0 {
            return Err("Internal render height must be non-zero".to_string());
        }
        Ok(())
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            internal_height: 240,
            integer_scaling: true,
            clear_color: [0.05, 0.04, 0.08],
        }
    }
}

/// # Audio Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Global gain applied on top of every source
    pub master_volume: f32,
    /// Audible radius for sources that do not set their own
    pub default_max_distance: f32,
}

impl AudioConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.master_volume) {
            return Err(format!(
                "Master volume must be within 0..=1, got {}",
                self.master_volume
            ));
        }
        if self.default_max_distance <= 0.0 {
            return Err("Default max distance must be positive".to_string());
        }
        Ok(())
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            default_max_distance: 50.0,
        }
    }
}

/// # Engine Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter, overridden by `RUST_LOG`
    pub log_level: String,
    /// Window settings
    pub window: WindowConfig,
    /// Physics settings
    pub physics: PhysicsConfig,
    /// Render settings
    pub render: RenderConfig,
    /// Audio settings
    pub audio: AudioConfig,
}

impl EngineConfig {
    /// Create a new engine configuration with a window title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            window: WindowConfig::new(title),
            ..Self::default()
        }
    }

    /// Set log level
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Replace the window section
    #[must_use]
    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    /// Replace the physics section
    #[must_use]
    pub fn with_physics(mut self, physics: PhysicsConfig) -> Self {
        self.physics = physics;
        self
    }

    /// Replace the render section
    #[must_use]
    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    /// Replace the audio section
    #[must_use]
    pub fn with_audio(mut self, audio: AudioConfig) -> Self {
        self.audio = audio;
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.window
            .validate()
            .and_then(|()| self.physics.validate())
            .and_then(|()| self.render.validate())
            .and_then(|()| self.audio.validate())
            .map_err(ConfigError::Invalid)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            window: WindowConfig::default(),
            physics: PhysicsConfig::default(),
            render: RenderConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

impl Config for EngineConfig {}
