//! ECS Components module
//!
//! Built-in components the engine's systems understand.

pub mod audio;
pub mod camera;
pub mod character;
pub mod collision;
pub mod mesh;
pub mod physics;
pub mod transform;

pub use audio::AudioSourceComponent;
pub use camera::CameraComponent;
pub use character::CharacterController;
pub use collision::CollisionStateComponent;
pub use mesh::MeshComponent;
pub use physics::{ContactEventMask, MotionKind, PhysicsBody, PhysicsMaterial};
pub use transform::TransformComponent;
