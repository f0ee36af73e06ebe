//! Renderer contract
//!
//! The engine hands a renderer one [`FrameContext`] per frame. GPU backends
//! live outside this crate; [`HeadlessRenderer`] fulfils the contract without
//! a device.

pub mod camera;
pub mod draw_list;
pub mod frustum;
pub mod resolution;

use thiserror::Error;

pub use camera::{active_camera, camera_matrices, CameraMatrices};
pub use draw_list::{DrawBatch, DrawList, InstanceData};
pub use frustum::{Frustum, Plane};
pub use resolution::{Resolution, ResolutionManager};

use crate::ecs::World;
use crate::foundation::math::Mat4;
use crate::physics::DebugLines;
use crate::ui::UiContext;

/// Rendering errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// Renderer initialization failed
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// Frame submission failed
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// Swapchain or target could not follow a resize
    #[error("Resize failed: {0}")]
    ResizeFailed(String),
}

/// Render result type
pub type RenderResult<T> = Result<T, RenderError>;

/// Everything a renderer reads for one frame
pub struct FrameContext<'a> {
    /// World to view space
    pub view: Mat4,
    /// View to clip space
    pub projection: Mat4,
    /// Internal and window sizes
    pub resolution: Resolution,
    /// Scene to draw; world transforms are read through it
    pub world: &'a World,
    /// UI state for the overlay
    pub ui: &'a UiContext,
    /// Physics wireframes, when debug drawing is enabled
    pub debug: Option<&'a DebugLines>,
    /// Frames rendered before this one
    pub frame_number: u64,
}

impl FrameContext<'_> {
    /// Visible instances for this frame's camera
    #[must_use]
    pub fn draw_list(&self) -> DrawList {
        DrawList::collect(self.world, &Frustum::from_matrix(&(self.projection * self.view)))
    }
}

/// Consumer of frame data
pub trait Renderer {
    /// Draw one frame
    fn render_frame(&mut self, frame: &FrameContext<'_>) -> RenderResult<()>;

    /// Follow a window resize
    fn resize(&mut self, resolution: &Resolution) -> RenderResult<()>;
}

/// Statistics of the last frame seen by a [`HeadlessRenderer`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame number reported by the engine
    pub frame_number: u64,
    /// Instances that passed culling
    pub instances: usize,
    /// Draw batches
    pub batches: usize,
    /// Instances rejected by culling
    pub culled: usize,
    /// Bytes of instance data that would be uploaded
    pub upload_bytes: usize,
    /// Physics debug line segments
    pub debug_lines: usize,
}

/// Renderer that builds draw lists but submits nothing
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    frames: u64,
    last: FrameStats,
    resolution: Option<Resolution>,
}

impl HeadlessRenderer {
    /// Create a headless renderer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames rendered so far
    #[must_use]
    pub const fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Stats of the last frame
    #[must_use]
    pub const fn last_frame(&self) -> FrameStats {
        self.last
    }

    /// Resolution from the last resize
    #[must_use]
    pub const fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }
}

impl Renderer for HeadlessRenderer {
    fn render_frame(&mut self, frame: &FrameContext<'_>) -> RenderResult<()> {
        let list = frame.draw_list();
        self.last = FrameStats {
            frame_number: frame.frame_number,
            instances: list.instance_count(),
            batches: list.batches().count(),
            culled: list.culled(),
            upload_bytes: list.batches().map(|(_, batch)| batch.as_bytes().len()).sum(),
            debug_lines: frame.debug.map_or(0, |debug| debug.lines.len()),
        };
        self.frames += 1;
        Ok(())
    }

    fn resize(&mut self, resolution: &Resolution) -> RenderResult<()> {
        self.resolution = Some(*resolution);
        Ok(())
    }
}
