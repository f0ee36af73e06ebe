//! Component storage
//!
//! One [`ComponentStorage`] per component type, keyed by [`Entity`]. The world
//! holds them type-erased behind [`ErasedStorage`] so it can remove every
//! component of a destroyed entity without knowing the types.

use std::any::Any;

use slotmap::SecondaryMap;

use super::{Component, Entity};

/// Sparse per-type component table
pub struct ComponentStorage<T: Component> {
    components: SecondaryMap<Entity, T>,
}

impl<T: Component> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self {
            components: SecondaryMap::new(),
        }
    }
}

impl<T: Component> ComponentStorage<T> {
    /// Insert or replace, returning the previous value
    pub fn insert(&mut self, entity: Entity, component: T) -> Option<T> {
        self.components.insert(entity, component)
    }

    /// Remove the component of `entity`
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        self.components.remove(entity)
    }

    /// Borrow the component of `entity`
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.components.get(entity)
    }

    /// Mutably borrow the component of `entity`
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.components.get_mut(entity)
    }

    /// Iterate `(entity, component)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.components.iter()
    }

    /// Iterate `(entity, component)` pairs mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.components.iter_mut()
    }
}

/// Type-erased view of a [`ComponentStorage`]
pub trait ErasedStorage: Any + Send + Sync {
    /// Drop the component of `entity`, returning whether one existed
    fn remove_entity(&mut self, entity: Entity) -> bool;

    /// Whether `entity` has a component in this storage
    fn contains(&self, entity: Entity) -> bool;

    /// Number of stored components
    fn len(&self) -> usize;

    /// Whether the storage is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every entity with a component in this storage
    fn entities(&self) -> Vec<Entity>;

    /// Downcast support
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedStorage for ComponentStorage<T> {
    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.components.remove(entity).is_some()
    }

    fn contains(&self, entity: Entity) -> bool {
        self.components.contains_key(entity)
    }

    fn len(&self) -> usize {
        self.components.len()
    }

    fn entities(&self) -> Vec<Entity> {
        self.components.keys().collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
