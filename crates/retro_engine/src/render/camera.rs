//! Camera matrices from the scene

use nalgebra::{Isometry3, Translation3};

use crate::ecs::components::{CameraComponent, TransformComponent};
use crate::ecs::{Entity, World};
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// Where the scene is viewed from when no camera is active
pub const FALLBACK_EYE: Vec3 = Vec3::new(0.0, 5.0, 15.0);

/// View and projection for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    /// World to view space
    pub view: Mat4,
    /// View to clip space
    pub projection: Mat4,
    /// Camera world position
    pub position: Vec3,
}

impl CameraMatrices {
    /// View from [`FALLBACK_EYE`] toward the world origin, default projection
    #[must_use]
    pub fn fallback(aspect: f32) -> Self {
        Self {
            view: Mat4::look_at(FALLBACK_EYE, Vec3::zeros(), Vec3::y()),
            projection: CameraComponent::default().projection(aspect),
            position: FALLBACK_EYE,
        }
    }

    /// Combined view-projection
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// First active camera that has a transform
#[must_use]
pub fn active_camera(world: &World) -> Option<Entity> {
    world
        .view::<(CameraComponent, TransformComponent)>()
        .into_iter()
        .find(|entity| {
            world
                .get_component::<CameraComponent>(*entity)
                .is_some_and(|camera| camera.active)
        })
}

/// Matrices for a camera entity. Scale on the camera chain is ignored.
#[must_use]
pub fn camera_matrices(world: &World, camera: Entity, aspect: f32) -> Option<CameraMatrices> {
    let component = world.get_component::<CameraComponent>(camera)?;
    let position = world.world_position(camera)?;
    let rotation = world.world_rotation(camera)?;

    let pose = Isometry3::from_parts(Translation3::from(position), rotation);
    Some(CameraMatrices {
        view: pose.inverse().to_homogeneous(),
        projection: component.projection(aspect),
        position,
    })
}
