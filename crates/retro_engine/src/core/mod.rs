//! Core engine settings
//!
//! Per-subsystem configuration sections and the aggregate [`EngineConfig`].

pub mod config;

pub use config::{
    AudioConfig, CharacterConfig, EngineConfig, PhysicsConfig, RenderConfig, WindowConfig,
};
