//! Collision state component
//!
//! Optional per-entity summary of contacts, refreshed by physics sync from the
//! contact event queue every frame.

use std::collections::HashSet;

use crate::ecs::{Component, Entity};

/// Tracks the current collision state of an entity
#[derive(Debug, Default, Clone)]
pub struct CollisionStateComponent {
    /// All entities we're currently touching
    pub colliding_with: HashSet<Entity>,

    /// Entities we started touching this frame
    pub collision_entered: Vec<Entity>,

    /// Entities we stopped touching this frame
    pub collision_exited: Vec<Entity>,
}

impl Component for CollisionStateComponent {}

impl CollisionStateComponent {
    /// Check if we're currently colliding with any entity
    #[must_use]
    pub fn is_colliding(&self) -> bool {
        !self.colliding_with.is_empty()
    }

    /// Check if we're colliding with a specific entity
    #[must_use]
    pub fn is_colliding_with(&self, entity: Entity) -> bool {
        self.colliding_with.contains(&entity)
    }

    /// Check if we just started colliding with a specific entity this frame
    #[must_use]
    pub fn just_collided_with(&self, entity: Entity) -> bool {
        self.collision_entered.contains(&entity)
    }

    /// Check if we just stopped colliding with a specific entity this frame
    #[must_use]
    pub fn just_stopped_colliding_with(&self, entity: Entity) -> bool {
        self.collision_exited.contains(&entity)
    }

    pub(crate) fn begin_frame(&mut self) {
        self.collision_entered.clear();
        self.collision_exited.clear();
    }

    pub(crate) fn enter(&mut self, other: Entity) {
        if self.colliding_with.insert(other) {
            self.collision_entered.push(other);
        }
    }

    pub(crate) fn exit(&mut self, other: Entity) {
        if self.colliding_with.remove(&other) {
            self.collision_exited.push(other);
        }
    }
}
