//! ECS World implementation

use std::any::{Any, TypeId};
use std::collections::HashMap;

use slotmap::SlotMap;

use super::storage::{ComponentStorage, ErasedStorage};
use super::{Component, ComponentSet, Entity};

/// Callback run when a component of a given type is about to disappear,
/// either through [`World::remove_component`] or [`World::destroy_entity`].
///
/// The component is still attached while the hook runs. The same signature
/// serves replace hooks, which see the outgoing component.
pub type DestroyHook = fn(&mut World, Entity);

/// ECS World containing all entities, components and shared resources
pub struct World {
    entities: SlotMap<Entity, ()>,
    storages: HashMap<TypeId, Box<dyn ErasedStorage>>,
    destroy_hooks: HashMap<TypeId, Vec<DestroyHook>>,
    replace_hooks: HashMap<TypeId, Vec<DestroyHook>>,
    resources: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl World {
    /// Create a new world
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: SlotMap::with_key(),
            storages: HashMap::new(),
            destroy_hooks: HashMap::new(),
            replace_hooks: HashMap::new(),
            resources: HashMap::new(),
        }
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    /// Create a new entity
    pub fn create_entity(&mut self) -> Entity {
        self.entities.insert(())
    }

    /// Whether `entity` is alive; stale identifiers fail the generation check
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.contains_key(entity)
    }

    /// Number of live entities
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Iterate over all live entities
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.keys()
    }

    /// Destroy an entity and every component attached to it.
    ///
    /// Destroy hooks for each attached component type run first, while the
    /// entity and its components are still reachable. Returns `false` when
    /// the entity was already gone.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }

        let attached: Vec<TypeId> = self
            .storages
            .iter()
            .filter(|(_, storage)| storage.contains(entity))
            .map(|(type_id, _)| *type_id)
            .collect();
        for type_id in attached {
            self.run_destroy_hooks(type_id, entity);
        }

        for storage in self.storages.values_mut() {
            storage.remove_entity(entity);
        }
        self.entities.remove(entity);
        log::trace!("Destroyed entity {entity:?}");
        true
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    /// Attach a component, replacing any existing one of the same type.
    ///
    /// Replacing is an update, not a destroy: only the hooks registered with
    /// [`World::on_replace`] see the outgoing component.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) {
        if !self.is_alive(entity) {
            log::warn!(
                "Ignoring {} for dead entity {entity:?}",
                std::any::type_name::<T>()
            );
            return;
        }
        if self.has_component::<T>(entity) {
            self.run_replace_hooks(TypeId::of::<T>(), entity);
        }
        self.storage_or_insert::<T>().insert(entity, component);
    }

    /// Get a component from an entity
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.storage::<T>()?.get(entity)
    }

    /// Get a mutable component from an entity
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.storage_mut::<T>()?.get_mut(entity)
    }

    /// Whether `entity` holds a component of type `T`
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.storages
            .get(&TypeId::of::<T>())
            .is_some_and(|storage| storage.contains(entity))
    }

    /// Whether `entity` is alive and holds every component in `S`
    #[must_use]
    pub fn has_all<S: ComponentSet>(&self, entity: Entity) -> bool {
        self.is_alive(entity) && S::contained_by(self, entity)
    }

    /// Detach and return a component, running its destroy hooks first
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        if !self.has_component::<T>(entity) {
            return None;
        }
        self.run_destroy_hooks(TypeId::of::<T>(), entity);
        self.storage_mut::<T>()?.remove(entity)
    }

    /// Entities holding every component in `S`.
    ///
    /// The result is a snapshot, so the world may be mutated while walking it.
    #[must_use]
    pub fn view<S: ComponentSet>(&self) -> Vec<Entity> {
        let type_ids = S::type_ids();
        let mut storages = Vec::with_capacity(type_ids.len());
        for type_id in &type_ids {
            match self.storages.get(type_id) {
                Some(storage) => storages.push(storage.as_ref()),
                None => return Vec::new(),
            }
        }

        let Some(smallest) = storages.iter().min_by_key(|storage| storage.len()) else {
            return Vec::new();
        };
        smallest
            .entities()
            .into_iter()
            .filter(|entity| storages.iter().all(|storage| storage.contains(*entity)))
            .collect()
    }

    /// Iterate over every `(entity, &T)`
    pub fn query<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.storage::<T>().into_iter().flat_map(ComponentStorage::iter)
    }

    /// Iterate over every `(entity, &mut T)`
    pub fn query_mut<T: Component>(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.storage_mut::<T>()
            .into_iter()
            .flat_map(ComponentStorage::iter_mut)
    }

    /// Number of components of type `T`
    #[must_use]
    pub fn component_count<T: Component>(&self) -> usize {
        self.storages
            .get(&TypeId::of::<T>())
            .map_or(0, |storage| storage.len())
    }

    /// Register a hook that runs before a `T` component disappears
    pub fn on_destroy<T: Component>(&mut self, hook: DestroyHook) {
        self.destroy_hooks
            .entry(TypeId::of::<T>())
            .or_default()
            .push(hook);
    }

    /// Register a hook that runs before a `T` component is overwritten by
    /// [`World::add_component`]
    pub fn on_replace<T: Component>(&mut self, hook: DestroyHook) {
        self.replace_hooks
            .entry(TypeId::of::<T>())
            .or_default()
            .push(hook);
    }

    fn run_destroy_hooks(&mut self, type_id: TypeId, entity: Entity) {
        // Copy out so hooks may register further hooks or touch the world freely
        let hooks = self.destroy_hooks.get(&type_id).cloned().unwrap_or_default();
        for hook in hooks {
            hook(self, entity);
        }
    }

    fn run_replace_hooks(&mut self, type_id: TypeId, entity: Entity) {
        let hooks = self.replace_hooks.get(&type_id).cloned().unwrap_or_default();
        for hook in hooks {
            hook(self, entity);
        }
    }

    fn storage<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        self.storages
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<ComponentStorage<T>>()
    }

    fn storage_mut<T: Component>(&mut self) -> Option<&mut ComponentStorage<T>> {
        self.storages
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<ComponentStorage<T>>()
    }

    fn storage_or_insert<T: Component>(&mut self) -> &mut ComponentStorage<T> {
        let storage = self
            .storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStorage::<T>::default()));
        match storage.as_any_mut().downcast_mut::<ComponentStorage<T>>() {
            Some(storage) => storage,
            None => unreachable!("storage registered under the TypeId of another type"),
        }
    }

    // ------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------

    /// Insert a world-wide singleton, returning the previous one
    pub fn insert_resource<R: Any + Send + Sync>(&mut self, resource: R) -> Option<R> {
        self.resources
            .insert(TypeId::of::<R>(), Box::new(resource))
            .and_then(|old| old.downcast::<R>().ok())
            .map(|old| *old)
    }

    /// Borrow a resource
    #[must_use]
    pub fn resource<R: Any + Send + Sync>(&self) -> Option<&R> {
        self.resources.get(&TypeId::of::<R>())?.downcast_ref::<R>()
    }

    /// Mutably borrow a resource
    pub fn resource_mut<R: Any + Send + Sync>(&mut self) -> Option<&mut R> {
        self.resources
            .get_mut(&TypeId::of::<R>())?
            .downcast_mut::<R>()
    }

    /// Mutably borrow a resource, inserting the default first if missing
    pub fn resource_or_default<R: Any + Send + Sync + Default>(&mut self) -> &mut R {
        let resource = self
            .resources
            .entry(TypeId::of::<R>())
            .or_insert_with(|| Box::new(R::default()));
        match resource.downcast_mut::<R>() {
            Some(resource) => resource,
            None => unreachable!("resource registered under the TypeId of another type"),
        }
    }

    /// Remove a resource
    pub fn remove_resource<R: Any + Send + Sync>(&mut self) -> Option<R> {
        self.resources
            .remove(&TypeId::of::<R>())?
            .downcast::<R>()
            .ok()
            .map(|resource| *resource)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
