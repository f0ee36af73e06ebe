//! Camera component
//!
//! The camera looks down its local -Z axis; its pose comes from the entity's
//! transform.

use crate::ecs::Component;
use crate::foundation::math::{utils, Mat4, Mat4Ext};

/// Perspective camera parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraComponent {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
    /// Only active cameras are considered when the engine picks one to render from
    pub active: bool,
}

impl Component for CameraComponent {}

impl Default for CameraComponent {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            near: 0.1,
            far: 500.0,
            active: true,
        }
    }
}

impl CameraComponent {
    /// Create a perspective camera
    #[must_use]
    pub const fn perspective(fov_degrees: f32, near: f32, far: f32) -> Self {
        Self {
            fov_degrees,
            near,
            far,
            active: true,
        }
    }

    /// Projection from right-handed view space into Vulkan clip space
    #[must_use]
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective(utils::deg_to_rad(self.fov_degrees), aspect, self.near, self.far)
            * Mat4::vulkan_coordinate_transform()
    }
}
