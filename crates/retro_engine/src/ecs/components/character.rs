//! Character controller component
//!
//! A capsule moved by collide-and-slide rather than by forces. Game code
//! feeds it a desired horizontal velocity every frame; physics sync consumes
//! that input, integrates gravity and writes the result to the transform.

use crate::ecs::Component;
use crate::foundation::math::Vec3;
use crate::physics::BodyHandle;

/// Kinematic character driven by per-frame movement input
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterController {
    half_height: f32,
    radius: f32,
    movement_input: Vec3,
    vertical_velocity: f32,
    jump_request: Option<f32>,
    grounded: bool,
    handle: Option<BodyHandle>,
}

impl Component for CharacterController {}

impl CharacterController {
    /// Create a character with a Y-axis capsule
    #[must_use]
    pub fn new(half_height: f32, radius: f32) -> Self {
        Self {
            half_height,
            radius,
            movement_input: Vec3::zeros(),
            vertical_velocity: 0.0,
            jump_request: None,
            grounded: false,
            handle: None,
        }
    }

    /// Half the length of the capsule's straight segment
    #[must_use]
    pub const fn half_height(&self) -> f32 {
        self.half_height
    }

    /// Capsule radius
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Add to this frame's desired horizontal velocity (Y is ignored)
    pub fn add_movement_input(&mut self, velocity: Vec3) {
        self.movement_input.x += velocity.x;
        self.movement_input.z += velocity.z;
    }

    /// Movement input accumulated so far this frame
    #[must_use]
    pub const fn movement_input(&self) -> Vec3 {
        self.movement_input
    }

    /// Launch upwards on the next physics pass if grounded at that time
    pub fn jump(&mut self, speed: f32) {
        self.jump_request = Some(speed);
    }

    /// Current vertical speed
    #[must_use]
    pub const fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }

    /// Whether the capsule stood on something after the last move
    #[must_use]
    pub const fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Simulation handle of the capsule body, `None` until bound
    #[must_use]
    pub const fn handle(&self) -> Option<BodyHandle> {
        self.handle
    }

    pub(crate) fn bind(&mut self, handle: BodyHandle) {
        self.handle = Some(handle);
    }

    pub(crate) fn unbind(&mut self) -> Option<BodyHandle> {
        self.handle.take()
    }

    /// Integrate gravity into the vertical speed and return this frame's
    /// velocity (horizontal input plus vertical speed). Consumes the input.
    pub(crate) fn take_velocity(&mut self, gravity: f32, dt: f32) -> Vec3 {
        self.vertical_velocity += gravity * dt;
        if self.grounded {
            self.vertical_velocity = self.vertical_velocity.max(0.0);
        }
        if let Some(speed) = self.jump_request.take() {
            if self.grounded {
                self.vertical_velocity = speed;
            }
        }

        let velocity = Vec3::new(
            self.movement_input.x,
            self.vertical_velocity,
            self.movement_input.z,
        );
        self.movement_input = Vec3::zeros();
        velocity
    }

    pub(crate) fn set_grounded(&mut self, grounded: bool) {
        self.grounded = grounded;
        if grounded && self.vertical_velocity < 0.0 {
            self.vertical_velocity = 0.0;
        }
    }
}
