//! # Retro Engine
//!
//! Core of a retro-styled 3D game engine: a parented transform hierarchy,
//! a generation-tagged entity store, rapier physics kept in sync with the
//! scene, and the render and audio consumers that read it each frame.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use retro_engine::prelude::*;
//!
//! struct MyGame;
//!
//! impl Game for MyGame {
//!     fn begin_play(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         let ball = engine.world.create_entity();
//!         engine
//!             .world
//!             .add_component(ball, TransformComponent::from_position(Vec3::new(0.0, 5.0, 0.0)));
//!         engine
//!             .world
//!             .add_component(ball, PhysicsBody::dynamic(ShapeDescriptor::sphere(0.5)));
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, _engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::headless(EngineConfig::default())?;
//!     engine.run(&mut MyGame)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod foundation;

pub mod ecs;
pub mod scene;

pub mod audio;
pub mod input;
pub mod physics;
pub mod platform;
pub mod render;
pub mod ui;

mod application;
mod engine;

pub use application::{AppError, AppEvent, Game};
pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        audio::{AudioBackend, AudioSystem, VoiceId},
        config::Config,
        core::{AudioConfig, CharacterConfig, EngineConfig, PhysicsConfig, RenderConfig, WindowConfig},
        ecs::{
            components::{
                AudioSourceComponent, CameraComponent, CharacterController,
                CollisionStateComponent, ContactEventMask, MeshComponent, MotionKind, PhysicsBody,
                PhysicsMaterial, TransformComponent,
            },
            Entity, World,
        },
        foundation::{
            math::{Mat4, Quat, Transform, Vec3},
            time::Timer,
        },
        input::{InputManager, KeyCode, MouseButton},
        physics::{ContactEvent, ContactKind, PhysicsSync, RaycastHit, ShapeDescriptor},
        platform::{HeadlessPlatform, Platform},
        render::{FrameContext, HeadlessRenderer, Renderer},
        scene::SceneError,
        AppError, AppEvent, Engine, EngineError, Game,
    };
}
