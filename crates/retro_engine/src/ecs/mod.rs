//! Entity-Component-System implementation
//!
//! Entities are generation-tagged arena keys; components live in one sparse
//! map per type. Systems are plain functions that take the [`World`] as an
//! explicit parameter and declare the components they need through
//! [`World::view`].

pub mod component;
pub mod components;
pub mod entity;
pub mod storage;
pub mod world;

pub use component::{Component, ComponentSet};
pub use entity::Entity;
pub use world::{DestroyHook, World};
