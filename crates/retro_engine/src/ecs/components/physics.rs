//! Physics components
//!
//! [`PhysicsBody`] describes what the simulation should build for an entity.
//! The handle stays `None` until physics sync binds it on its next pass, since
//! building the shape needs the entity's transform at that moment.

use bitflags::bitflags;

use crate::ecs::Component;
use crate::physics::{BodyHandle, ShapeDescriptor, ShapeError};

/// How the simulation moves a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionKind {
    /// Never moves; pushes from the transform teleport it
    Static,
    /// Moved by game logic, pushes other bodies, unaffected by forces
    Kinematic,
    /// Fully simulated; the transform follows the simulation
    Dynamic,
    /// Trigger volume; reports overlaps, no collision response
    Sensor,
}

impl MotionKind {
    /// Whether the simulation writes this body's pose back to the transform
    #[must_use]
    pub const fn pulls_pose(self) -> bool {
        matches!(self, Self::Dynamic | Self::Kinematic)
    }
}

/// Surface and mass properties
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsMaterial {
    /// Coulomb friction coefficient
    pub friction: f32,
    /// Bounciness, 0 to 1
    pub restitution: f32,
    /// Linear velocity damping
    pub linear_damping: f32,
    /// Angular velocity damping
    pub angular_damping: f32,
    /// Mass in kilograms (dynamic bodies only)
    pub mass: f32,
    /// Whether the body may fall asleep when at rest
    pub allow_sleep: bool,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self {
            friction: 0.5,
            restitution: 0.0,
            linear_damping: 0.05,
            angular_damping: 0.05,
            mass: 1.0,
            allow_sleep: true,
        }
    }
}

impl PhysicsMaterial {
    /// Set friction
    #[must_use]
    pub const fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    /// Set restitution
    #[must_use]
    pub const fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    /// Set mass
    #[must_use]
    pub const fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    /// Set damping
    #[must_use]
    pub const fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    /// Allow or forbid sleeping
    #[must_use]
    pub const fn with_sleep(mut self, allow: bool) -> Self {
        self.allow_sleep = allow;
        self
    }
}

bitflags! {
    /// Which contact events an entity wants delivered
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ContactEventMask: u8 {
        /// First step a pair touches
        const BEGIN = 1 << 0;
        /// Every later step the pair keeps touching
        const PERSIST = 1 << 1;
        /// First step after the pair separated
        const END = 1 << 2;
    }
}

impl Default for ContactEventMask {
    fn default() -> Self {
        Self::BEGIN | Self::END
    }
}

/// Rigid body, kinematic body or sensor attached to an entity
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsBody {
    shape: ShapeDescriptor,
    motion: MotionKind,
    material: PhysicsMaterial,
    contact_events: ContactEventMask,
    handle: Option<BodyHandle>,
    needs_rebuild: bool,
    bind_error: Option<ShapeError>,
}

impl Component for PhysicsBody {}

impl PhysicsBody {
    /// Create an unbound body description
    #[must_use]
    pub fn new(shape: ShapeDescriptor, motion: MotionKind) -> Self {
        Self {
            shape,
            motion,
            material: PhysicsMaterial::default(),
            contact_events: ContactEventMask::default(),
            handle: None,
            needs_rebuild: false,
            bind_error: None,
        }
    }

    /// Static body
    #[must_use]
    pub fn fixed(shape: ShapeDescriptor) -> Self {
        Self::new(shape, MotionKind::Static)
    }

    /// Dynamic body
    #[must_use]
    pub fn dynamic(shape: ShapeDescriptor) -> Self {
        Self::new(shape, MotionKind::Dynamic)
    }

    /// Kinematic body
    #[must_use]
    pub fn kinematic(shape: ShapeDescriptor) -> Self {
        Self::new(shape, MotionKind::Kinematic)
    }

    /// Sensor volume
    #[must_use]
    pub fn sensor(shape: ShapeDescriptor) -> Self {
        Self::new(shape, MotionKind::Sensor)
    }

    /// Builder pattern: Set material
    #[must_use]
    pub const fn with_material(mut self, material: PhysicsMaterial) -> Self {
        self.material = material;
        self
    }

    /// Builder pattern: Choose which contact events to receive
    #[must_use]
    pub const fn with_contact_events(mut self, mask: ContactEventMask) -> Self {
        self.contact_events = mask;
        self
    }

    /// Shape description
    #[must_use]
    pub const fn shape(&self) -> &ShapeDescriptor {
        &self.shape
    }

    /// Motion kind
    #[must_use]
    pub const fn motion(&self) -> MotionKind {
        self.motion
    }

    /// Material
    #[must_use]
    pub const fn material(&self) -> &PhysicsMaterial {
        &self.material
    }

    /// Contact events this entity receives
    #[must_use]
    pub const fn contact_events(&self) -> ContactEventMask {
        self.contact_events
    }

    /// Simulation handle, `None` while unbound
    #[must_use]
    pub const fn handle(&self) -> Option<BodyHandle> {
        self.handle
    }

    /// Whether a simulation body exists for this component
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.handle.is_some()
    }

    /// Whether a shape-affecting change is waiting for a rebuild
    #[must_use]
    pub const fn needs_rebuild(&self) -> bool {
        self.needs_rebuild
    }

    /// Why the last binding attempt failed, if it did
    #[must_use]
    pub const fn bind_error(&self) -> Option<&ShapeError> {
        self.bind_error.as_ref()
    }

    /// Replace the shape; the body is rebuilt
    pub fn set_shape(&mut self, shape: ShapeDescriptor) {
        self.shape = shape;
        self.needs_rebuild = true;
    }

    /// Mutable access to the shape (for example to append hull points); the body is rebuilt
    pub fn shape_mut(&mut self) -> &mut ShapeDescriptor {
        self.needs_rebuild = true;
        &mut self.shape
    }

    /// Change the motion kind; the body is rebuilt
    pub fn set_motion(&mut self, motion: MotionKind) {
        if self.motion != motion {
            self.motion = motion;
            self.needs_rebuild = true;
        }
    }

    /// Replace the material; the body is rebuilt
    pub fn set_material(&mut self, material: PhysicsMaterial) {
        self.material = material;
        self.needs_rebuild = true;
    }

    /// Change contact event subscriptions (no rebuild needed)
    pub fn set_contact_events(&mut self, mask: ContactEventMask) {
        self.contact_events = mask;
    }

    pub(crate) fn bind(&mut self, handle: BodyHandle) {
        self.handle = Some(handle);
        self.needs_rebuild = false;
        self.bind_error = None;
    }

    pub(crate) fn unbind(&mut self) -> Option<BodyHandle> {
        self.handle.take()
    }

    pub(crate) fn clear_rebuild(&mut self) {
        self.needs_rebuild = false;
    }

    /// Record a failed bind, returning whether the error is new
    pub(crate) fn record_bind_error(&mut self, error: ShapeError) -> bool {
        let changed = self.bind_error.as_ref() != Some(&error);
        self.bind_error = Some(error);
        changed
    }
}
