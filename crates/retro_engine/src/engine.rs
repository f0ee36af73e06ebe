//! Frame orchestrator
//!
//! Owns every subsystem and runs them in a fixed order each frame:
//! events, input, game logic, physics, audio, render.

use log::{debug, info, trace};
use thiserror::Error;

use crate::application::{AppError, AppEvent, Game};
use crate::audio::{AudioBackend, AudioSystem};
use crate::config::ConfigError;
use crate::core::EngineConfig;
use crate::ecs::{Entity, World};
use crate::foundation::time::Timer;
use crate::input::InputManager;
use crate::physics::{DebugLines, PhysicsError, PhysicsSync};
use crate::platform::{HeadlessPlatform, Platform, PlatformError};
use crate::render::{
    active_camera, camera_matrices, CameraMatrices, FrameContext, HeadlessRenderer, RenderError,
    Renderer, ResolutionManager,
};
use crate::scene;
use crate::ui::UiContext;

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration rejected at startup
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Physics could not start
    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    /// Renderer failure
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Game callback failure
    #[error("Application error: {0}")]
    App(#[from] AppError),

    /// Window or event source failure
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

/// Main engine struct
///
/// Game callbacks receive `&mut Engine` and reach the scene through the
/// public subsystem fields.
pub struct Engine {
    /// Entities, components and resources
    pub world: World,

    /// Simulation and its synchronization with the world
    pub physics: PhysicsSync,

    /// Keyboard and mouse state
    pub input: InputManager,

    /// Audio sources and backend
    pub audio: AudioSystem,

    /// UI input state
    pub ui: UiContext,

    renderer: Box<dyn Renderer>,
    platform: Box<dyn Platform>,
    resolution: ResolutionManager,
    timer: Timer,
    config: EngineConfig,
    listener: Option<Entity>,
    debug_lines: DebugLines,
    running: bool,
    begun: bool,
    frame_number: u64,
}

impl Engine {
    /// Create a new engine instance
    pub fn new(
        config: EngineConfig,
        platform: Box<dyn Platform>,
        mut renderer: Box<dyn Renderer>,
    ) -> Result<Self, EngineError> {
        info!("Initializing engine...");

        let mut world = World::new();
        scene::register_hooks(&mut world);
        let physics = PhysicsSync::new(&config.physics, &mut world)?;
        config.validate()?;
        let audio = AudioSystem::silent(&config.audio, &mut world);

        let (width, height) = platform.window_size();
        let resolution = ResolutionManager::new(&config.render, width, height);
        renderer.resize(&resolution.resolution())?;

        info!("Engine ready: {width}x{height} window");
        Ok(Self {
            world,
            physics,
            input: InputManager::new(),
            audio,
            ui: UiContext::new(width, height),
            renderer,
            platform,
            resolution,
            timer: Timer::new(),
            config,
            listener: None,
            debug_lines: DebugLines::default(),
            running: true,
            begun: false,
            frame_number: 0,
        })
    }

    /// Engine without a window or GPU
    pub fn headless(config: EngineConfig) -> Result<Self, EngineError> {
        let platform = HeadlessPlatform::new(config.window.width, config.window.height);
        Self::new(config, Box::new(platform), Box::new(HeadlessRenderer::new()))
    }

    /// Run frames until a close is requested, then call `end_play`
    pub fn run<G: Game>(&mut self, game: &mut G) -> Result<(), EngineError> {
        info!("Starting main loop...");
        self.running = true;
        self.timer = Timer::new();

        let mut result = Ok(());
        while self.running {
            if let Err(err) = self.frame(game) {
                result = Err(err);
                break;
            }
        }

        game.end_play(self);
        info!(
            "Main loop stopped after {} frames ({:.1} fps average)",
            self.frame_number,
            self.timer.average_fps()
        );
        result
    }

    /// Run one frame timed by the monotonic clock
    pub fn frame<G: Game>(&mut self, game: &mut G) -> Result<(), EngineError> {
        let delta_time = self.timer.update();
        self.run_frame(game, delta_time)
    }

    /// Run one frame with an explicit delta, for deterministic stepping
    pub fn frame_with_delta<G: Game>(
        &mut self,
        game: &mut G,
        delta_time: f32,
    ) -> Result<(), EngineError> {
        self.timer.advance(delta_time);
        self.run_frame(game, delta_time)
    }

    fn run_frame<G: Game>(&mut self, game: &mut G, delta_time: f32) -> Result<(), EngineError> {
        for event in self.platform.poll_events() {
            self.dispatch(game, &event)?;
        }
        self.input.update();

        if self.begun {
            game.update(self, delta_time)?;
        } else {
            debug!("Begin play");
            game.begin_play(self)?;
            self.begun = true;
        }

        self.physics.update(&mut self.world, delta_time);
        self.audio.update(&mut self.world, self.listener);
        self.render()?;

        self.frame_number += 1;
        trace!("Frame {} done in {delta_time:.4}s", self.frame_number);
        Ok(())
    }

    fn dispatch<G: Game>(&mut self, game: &mut G, event: &AppEvent) -> Result<(), EngineError> {
        self.input.handle_event(event);
        game.handle_event(self, event)?;
        self.ui.handle_event(event);

        match *event {
            AppEvent::WindowResized { width, height } => {
                if self.resolution.resize(width, height) {
                    self.renderer.resize(&self.resolution.resolution())?;
                }
            }
            AppEvent::CloseRequested => {
                debug!("Close requested");
                self.running = false;
            }
            _ => {}
        }
        Ok(())
    }

    fn render(&mut self) -> Result<(), EngineError> {
        let resolution = self.resolution.resolution();
        let aspect = resolution.aspect();
        let camera = active_camera(&self.world)
            .and_then(|camera| camera_matrices(&self.world, camera, aspect))
            .unwrap_or_else(|| CameraMatrices::fallback(aspect));

        let debug = if self.physics.debug_draw_enabled() {
            self.debug_lines.clear();
            self.physics.debug_draw(&mut self.debug_lines);
            Some(&self.debug_lines)
        } else {
            None
        };

        let frame = FrameContext {
            view: camera.view,
            projection: camera.projection,
            resolution,
            world: &self.world,
            ui: &self.ui,
            debug,
            frame_number: self.frame_number,
        };
        self.renderer.render_frame(&frame)?;
        Ok(())
    }

    /// Stop the loop after the current frame
    pub fn request_exit(&mut self) {
        self.running = false;
    }

    /// Whether the loop keeps going
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Frames completed so far
    #[must_use]
    pub const fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Seconds of frame time accumulated so far
    #[must_use]
    pub const fn total_time(&self) -> f32 {
        self.timer.total_time()
    }

    /// Entity whose position audio is heard from (the origin when unset)
    pub fn set_listener(&mut self, listener: Option<Entity>) {
        self.listener = listener;
    }

    /// Current audio listener
    #[must_use]
    pub const fn listener(&self) -> Option<Entity> {
        self.listener
    }

    /// Replace the silent audio backend
    pub fn set_audio_backend(&mut self, backend: Box<dyn AudioBackend>) {
        self.audio.set_backend(backend, &mut self.world);
    }

    /// Current render and window sizes
    #[must_use]
    pub const fn resolution(&self) -> crate::render::Resolution {
        self.resolution.resolution()
    }

    /// Configuration the engine started with
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }
}
