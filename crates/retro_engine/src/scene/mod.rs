//! Scene hierarchy
//!
//! Parent/child relationships between [`TransformComponent`]s and the
//! world-space queries built on them.
//!
//! [`TransformComponent`]: crate::ecs::components::TransformComponent

pub mod hierarchy;

pub use hierarchy::{register_hooks, Ancestors, SceneError, MAX_HIERARCHY_DEPTH};
