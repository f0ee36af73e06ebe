//! Mesh component
//!
//! Identifies what to draw for an entity. Geometry lives with the renderer;
//! the component only carries the handle and what culling needs.

use crate::ecs::Component;

/// Renderable mesh instance
#[derive(Debug, Clone, PartialEq)]
pub struct MeshComponent {
    /// Renderer-side mesh identifier
    pub mesh_id: u32,
    /// Bounding sphere radius in local units, centered on the entity origin
    pub bounding_radius: f32,
    /// Flat vertex-color tint (linear RGBA)
    pub color: [f32; 4],
    /// Hidden meshes are skipped entirely
    pub visible: bool,
}

impl Component for MeshComponent {}

impl MeshComponent {
    /// Create a visible, white mesh instance
    #[must_use]
    pub const fn new(mesh_id: u32, bounding_radius: f32) -> Self {
        Self {
            mesh_id,
            bounding_radius,
            color: [1.0, 1.0, 1.0, 1.0],
            visible: true,
        }
    }

    /// Builder pattern: Set tint
    #[must_use]
    pub const fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }
}
