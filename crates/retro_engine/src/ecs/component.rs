//! Component trait and component-set queries

use std::any::TypeId;

use super::{Entity, World};

/// Marker trait for components
pub trait Component: 'static + Send + Sync {}

/// A tuple of component types an entity must hold all of.
///
/// Used by [`World::view`] and [`World::has_all`].
pub trait ComponentSet {
    /// Type ids of every member of the set
    fn type_ids() -> Vec<TypeId>;

    /// Whether `entity` holds every member of the set
    fn contained_by(world: &World, entity: Entity) -> bool;
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            fn type_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$name>()),+]
            }

            fn contained_by(world: &World, entity: Entity) -> bool {
                $(world.has_component::<$name>(entity))&&+
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
