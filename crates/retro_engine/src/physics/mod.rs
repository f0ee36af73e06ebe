//! Physics synchronization layer over rapier3d

pub mod accumulator;
pub mod contacts;
pub(crate) mod conversions;
pub mod debug;
pub mod shape;
pub mod sync;
pub mod world;

#[cfg(test)]
mod tests;

use thiserror::Error;

pub use accumulator::FixedTimestep;
pub use contacts::{ContactEvent, ContactKind, ContactTracker};
pub use debug::{DebugDraw, DebugLines};
pub use shape::{ShapeDescriptor, ShapeError};
pub use sync::{PhysicsSync, RaycastHit};
pub use world::{BodyHandle, ContactSummary, PhysicsWorld};

/// Physics layer errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhysicsError {
    /// Configuration the simulation cannot run with
    #[error("Invalid physics configuration: {0}")]
    InvalidConfig(String),
}
