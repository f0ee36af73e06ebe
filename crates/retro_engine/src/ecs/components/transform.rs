//! Transform component for the ECS system
//!
//! Stores the local pose of an entity relative to its parent. World-space
//! queries need the rest of the hierarchy, so they live on [`World`]
//! (see `scene::hierarchy`) instead of here.
//!
//! Every local mutator raises the dirty flag consumed by physics sync.
//!
//! [`World`]: crate::ecs::World

use crate::ecs::{Component, Entity};
use crate::foundation::math::{utils, Mat4, Quat, Transform as MathTransform, Vec3};

/// ECS Transform component
///
/// Y-up, right-handed. The rotation is always a unit quaternion.
///
/// Cloning copies the local pose only: the clone has no parent, so every
/// parent link goes through `World::set_parent` and its cycle check.
#[derive(Debug, PartialEq)]
pub struct TransformComponent {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    parent: Option<Entity>,
    dirty: bool,
    physics_affected: bool,
}

impl Component for TransformComponent {}

impl Clone for TransformComponent {
    fn clone(&self) -> Self {
        Self {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
            parent: None,
            dirty: true,
            physics_affected: self.physics_affected,
        }
    }
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            parent: None,
            dirty: true,
            physics_affected: false,
        }
    }
}

impl TransformComponent {
    /// Create identity transform
    #[must_use]
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create from position only
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create from position and rotation
    #[must_use]
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation: utils::renormalize(rotation),
            ..Default::default()
        }
    }

    /// Create from a full local pose
    #[must_use]
    pub fn from_transform(transform: &MathTransform) -> Self {
        Self {
            position: transform.position,
            rotation: utils::renormalize(transform.rotation),
            scale: transform.scale,
            ..Default::default()
        }
    }

    /// Builder pattern: Set position
    #[must_use]
    pub const fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Builder pattern: Set rotation from quaternion
    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = utils::renormalize(rotation);
        self
    }

    /// Builder pattern: Set rotation from Euler angles in degrees `(pitch, yaw, roll)`
    #[must_use]
    pub fn with_rotation_euler(mut self, degrees: Vec3) -> Self {
        self.rotation = utils::quat_from_euler_degrees(degrees);
        self
    }

    /// Builder pattern: Set scale (uniform)
    #[must_use]
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::repeat(scale);
        self
    }

    /// Builder pattern: Set scale (non-uniform)
    #[must_use]
    pub const fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    // ------------------------------------------------------------------
    // Local reads
    // ------------------------------------------------------------------

    /// Position relative to the parent
    #[must_use]
    pub const fn local_position(&self) -> Vec3 {
        self.position
    }

    /// Rotation relative to the parent
    #[must_use]
    pub const fn local_rotation(&self) -> Quat {
        self.rotation
    }

    /// Scale relative to the parent
    #[must_use]
    pub const fn local_scale(&self) -> Vec3 {
        self.scale
    }

    /// Local pose as a math transform
    #[must_use]
    pub const fn local_transform(&self) -> MathTransform {
        MathTransform {
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
        }
    }

    /// Local matrix, `translate * rotate * scale`
    #[must_use]
    pub fn local_matrix(&self) -> Mat4 {
        self.local_transform().to_matrix()
    }

    /// Parent recorded on this node.
    ///
    /// Not validated; `World::parent_of` discards stale parents.
    #[must_use]
    pub const fn raw_parent(&self) -> Option<Entity> {
        self.parent
    }

    /// Whether a local mutation has not been consumed by physics sync yet
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the simulation owns this node's pose
    #[must_use]
    pub const fn is_physics_affected(&self) -> bool {
        self.physics_affected
    }

    // ------------------------------------------------------------------
    // Local writes
    // ------------------------------------------------------------------

    /// Overwrite the local position
    pub fn set_local_position(&mut self, position: Vec3) {
        self.position = position;
        self.dirty = true;
    }

    /// Overwrite the local rotation
    pub fn set_local_rotation(&mut self, rotation: Quat) {
        self.rotation = utils::renormalize(rotation);
        self.dirty = true;
    }

    /// Overwrite the local rotation from Euler angles in degrees `(pitch, yaw, roll)`
    pub fn set_local_rotation_euler(&mut self, degrees: Vec3) {
        self.rotation = utils::quat_from_euler_degrees(degrees);
        self.dirty = true;
    }

    /// Overwrite the local scale
    pub fn set_local_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.dirty = true;
    }

    /// Offset the local position
    pub fn add_local_position(&mut self, delta: Vec3) {
        self.position += delta;
        self.dirty = true;
    }

    /// Compose a rotation on top of the current one, in the body frame
    pub fn add_local_rotation(&mut self, delta: Quat) {
        self.rotation = utils::renormalize(self.rotation * delta);
        self.dirty = true;
    }

    /// Offset the local scale
    pub fn add_local_scale(&mut self, delta: Vec3) {
        self.scale += delta;
        self.dirty = true;
    }

    /// Turn about the body's own X axis
    pub fn add_pitch(&mut self, degrees: f32) {
        let delta = Quat::from_axis_angle(&Vec3::x_axis(), utils::deg_to_rad(degrees));
        self.add_local_rotation(delta);
    }

    /// Turn about the parent frame's Y axis
    pub fn add_yaw(&mut self, degrees: f32) {
        let delta = Quat::from_axis_angle(&Vec3::y_axis(), utils::deg_to_rad(degrees));
        self.rotation = utils::renormalize(delta * self.rotation);
        self.dirty = true;
    }

    /// Turn about the body's own Z axis
    pub fn add_roll(&mut self, degrees: f32) {
        let delta = Quat::from_axis_angle(&Vec3::z_axis(), utils::deg_to_rad(degrees));
        self.add_local_rotation(delta);
    }

    /// Direction the node faces (-Z) in its parent frame
    #[must_use]
    pub fn local_forward(&self) -> Vec3 {
        self.rotation * -Vec3::z()
    }

    // ------------------------------------------------------------------
    // Crate-internal hooks for the hierarchy and physics sync
    // ------------------------------------------------------------------

    pub(crate) fn set_raw_parent(&mut self, parent: Option<Entity>) {
        self.parent = parent;
        self.dirty = true;
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn set_physics_affected(&mut self, affected: bool) {
        self.physics_affected = affected;
    }

    /// Write a pose produced by the simulation without raising the dirty flag,
    /// so the next sync does not push it straight back.
    pub(crate) fn apply_physics_pose(&mut self, position: Vec3, rotation: Quat) {
        self.position = position;
        self.rotation = utils::renormalize(rotation);
    }
}
