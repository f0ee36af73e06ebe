//! World-space transform queries
//!
//! A node's world matrix is `parent_world * local`, recomposed on every call
//! by walking to the root. Every hop re-validates the parent: it must still
//! be alive (generation check) and still carry a transform, otherwise the
//! walk treats the node as a root.
//!
//! World scale is the component-wise product of local scales along the chain.
//! Under a rotated, non-uniformly scaled parent this is an approximation of
//! the true (sheared) matrix scale.

use crate::ecs::components::TransformComponent;
use crate::ecs::{Entity, World};
use crate::foundation::math::{utils, Mat4, Point3, Quat, Vec3};

/// Deepest parent chain a traversal follows before giving up
pub const MAX_HIERARCHY_DEPTH: usize = 256;

/// Hierarchy errors
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    /// The entity is dead or has no transform
    #[error("entity {0:?} has no transform")]
    MissingTransform(Entity),

    /// The requested parent is the child itself or one of its descendants
    #[error("parenting {child:?} under {parent:?} would create a cycle")]
    HierarchyCycle {
        /// Entity being reparented
        child: Entity,
        /// Requested parent
        parent: Entity,
    },

    /// The parent's world transform has a zero scale and cannot be inverted
    #[error("parent of {0:?} has a degenerate world transform")]
    SingularParent(Entity),
}

/// Result alias for hierarchy operations
pub type SceneResult<T> = Result<T, SceneError>;

/// Registers the hook that un-parents children when their parent's
/// transform (or the whole parent entity) goes away.
pub fn register_hooks(world: &mut World) {
    world.on_destroy::<TransformComponent>(detach_children);
}

fn detach_children(world: &mut World, parent: Entity) {
    for (child, transform) in world.query_mut::<TransformComponent>() {
        if child != parent && transform.raw_parent() == Some(parent) {
            transform.set_raw_parent(None);
        }
    }
}

/// Validated walk from an entity's parent up to the root
pub struct Ancestors<'w> {
    world: &'w World,
    current: Entity,
    depth: usize,
}

impl Iterator for Ancestors<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        if self.depth >= MAX_HIERARCHY_DEPTH {
            log::warn!(
                "Hierarchy above {:?} exceeds {MAX_HIERARCHY_DEPTH} levels, truncating",
                self.current
            );
            return None;
        }
        let parent = self.world.parent_of(self.current)?;
        self.current = parent;
        self.depth += 1;
        Some(parent)
    }
}

impl World {
    /// Valid parent of `entity`, or `None` when unparented, when the parent
    /// died or when the parent lost its transform
    #[must_use]
    pub fn parent_of(&self, entity: Entity) -> Option<Entity> {
        let parent = self
            .get_component::<TransformComponent>(entity)?
            .raw_parent()?;
        (parent != entity && self.has_all::<(TransformComponent,)>(parent)).then_some(parent)
    }

    /// Direct children of `entity`
    #[must_use]
    pub fn children_of(&self, entity: Entity) -> Vec<Entity> {
        self.query::<TransformComponent>()
            .filter(|(child, _)| self.parent_of(*child) == Some(entity))
            .map(|(child, _)| child)
            .collect()
    }

    /// Walk the valid parent chain of `entity`, nearest first
    #[must_use]
    pub const fn ancestors(&self, entity: Entity) -> Ancestors<'_> {
        Ancestors {
            world: self,
            current: entity,
            depth: 0,
        }
    }

    /// Re-parent `child` under `parent` (or detach it with `None`).
    ///
    /// Local values are kept as they are, so the node snaps to the same
    /// offset under its new parent. Use [`World::reparent_keep_world`] to keep
    /// its world pose instead.
    pub fn set_parent(&mut self, child: Entity, parent: Option<Entity>) -> SceneResult<()> {
        if !self.has_all::<(TransformComponent,)>(child) {
            return Err(SceneError::MissingTransform(child));
        }
        if let Some(parent) = parent {
            if !self.has_all::<(TransformComponent,)>(parent) {
                return Err(SceneError::MissingTransform(parent));
            }
            if parent == child || self.ancestors(parent).any(|ancestor| ancestor == child) {
                return Err(SceneError::HierarchyCycle { child, parent });
            }
        }

        let transform = self
            .get_component_mut::<TransformComponent>(child)
            .ok_or(SceneError::MissingTransform(child))?;
        transform.set_raw_parent(parent);
        log::trace!("Parent of {child:?} set to {parent:?}");
        Ok(())
    }

    /// Re-parent `child` while preserving its world position, rotation and scale
    pub fn reparent_keep_world(&mut self, child: Entity, parent: Option<Entity>) -> SceneResult<()> {
        let position = self.world_position(child).ok_or(SceneError::MissingTransform(child))?;
        let rotation = self.world_rotation(child).ok_or(SceneError::MissingTransform(child))?;
        let scale = self.world_scale(child).ok_or(SceneError::MissingTransform(child))?;

        self.set_parent(child, parent)?;
        self.set_world_scale(child, scale)?;
        self.set_world_rotation(child, rotation)?;
        self.set_world_position(child, position)
    }

    /// Full world matrix of `entity`, recomposed from the root on every call
    #[must_use]
    pub fn world_matrix(&self, entity: Entity) -> Option<Mat4> {
        let mut matrix = self.get_component::<TransformComponent>(entity)?.local_matrix();
        for ancestor in self.ancestors(entity) {
            if let Some(transform) = self.get_component::<TransformComponent>(ancestor) {
                matrix = transform.local_matrix() * matrix;
            }
        }
        Some(matrix)
    }

    /// World matrix of the parent, identity for roots
    #[must_use]
    pub fn parent_world_matrix(&self, entity: Entity) -> Mat4 {
        self.parent_of(entity)
            .and_then(|parent| self.world_matrix(parent))
            .unwrap_or_else(Mat4::identity)
    }

    /// World-space position
    #[must_use]
    pub fn world_position(&self, entity: Entity) -> Option<Vec3> {
        let local = self.get_component::<TransformComponent>(entity)?.local_position();
        Some(
            self.parent_world_matrix(entity)
                .transform_point(&Point3::from(local))
                .coords,
        )
    }

    /// World-space rotation
    #[must_use]
    pub fn world_rotation(&self, entity: Entity) -> Option<Quat> {
        let mut rotation = self.get_component::<TransformComponent>(entity)?.local_rotation();
        for ancestor in self.ancestors(entity) {
            if let Some(transform) = self.get_component::<TransformComponent>(ancestor) {
                rotation = transform.local_rotation() * rotation;
            }
        }
        Some(utils::renormalize(rotation))
    }

    /// World-space scale, multiplied component-wise up the chain
    #[must_use]
    pub fn world_scale(&self, entity: Entity) -> Option<Vec3> {
        let mut scale = self.get_component::<TransformComponent>(entity)?.local_scale();
        for ancestor in self.ancestors(entity) {
            if let Some(transform) = self.get_component::<TransformComponent>(ancestor) {
                scale.component_mul_assign(&transform.local_scale());
            }
        }
        Some(scale)
    }

    /// Move `entity` so its world position becomes `position`
    pub fn set_world_position(&mut self, entity: Entity, position: Vec3) -> SceneResult<()> {
        let local = self.world_to_local_position(entity, position)?;
        self.transform_mut(entity)?.set_local_position(local);
        Ok(())
    }

    /// Rotate `entity` so its world rotation becomes `rotation`
    pub fn set_world_rotation(&mut self, entity: Entity, rotation: Quat) -> SceneResult<()> {
        let local = self.world_to_local_rotation(entity, rotation)?;
        self.transform_mut(entity)?.set_local_rotation(local);
        Ok(())
    }

    /// Scale `entity` so its world scale becomes `scale`
    pub fn set_world_scale(&mut self, entity: Entity, scale: Vec3) -> SceneResult<()> {
        if !self.has_component::<TransformComponent>(entity) {
            return Err(SceneError::MissingTransform(entity));
        }
        let parent_scale = self
            .parent_of(entity)
            .and_then(|parent| self.world_scale(parent))
            .unwrap_or_else(|| Vec3::repeat(1.0));
        if parent_scale.iter().any(|s| s.abs() <= f32::EPSILON) {
            return Err(SceneError::SingularParent(entity));
        }
        let local = scale.component_div(&parent_scale);
        self.transform_mut(entity)?.set_local_scale(local);
        Ok(())
    }

    /// Whether `entity` or any ancestor changed since physics last consumed it
    #[must_use]
    pub fn transformed_lately(&self, entity: Entity) -> bool {
        let Some(transform) = self.get_component::<TransformComponent>(entity) else {
            return false;
        };
        transform.is_dirty()
            || self.ancestors(entity).any(|ancestor| {
                self.get_component::<TransformComponent>(ancestor)
                    .is_some_and(TransformComponent::is_dirty)
            })
    }

    /// Local pose that places `entity` at the given world pose
    pub(crate) fn world_to_local(
        &self,
        entity: Entity,
        position: Vec3,
        rotation: Quat,
    ) -> SceneResult<(Vec3, Quat)> {
        Ok((
            self.world_to_local_position(entity, position)?,
            self.world_to_local_rotation(entity, rotation)?,
        ))
    }

    fn world_to_local_position(&self, entity: Entity, position: Vec3) -> SceneResult<Vec3> {
        if !self.has_component::<TransformComponent>(entity) {
            return Err(SceneError::MissingTransform(entity));
        }
        if self.parent_of(entity).is_none() {
            return Ok(position);
        }
        let inverse = self
            .parent_world_matrix(entity)
            .try_inverse()
            .ok_or(SceneError::SingularParent(entity))?;
        Ok(inverse.transform_point(&Point3::from(position)).coords)
    }

    fn world_to_local_rotation(&self, entity: Entity, rotation: Quat) -> SceneResult<Quat> {
        if !self.has_component::<TransformComponent>(entity) {
            return Err(SceneError::MissingTransform(entity));
        }
        let parent_rotation = self
            .parent_of(entity)
            .and_then(|parent| self.world_rotation(parent))
            .unwrap_or_else(Quat::identity);
        Ok(utils::renormalize(parent_rotation.inverse() * rotation))
    }

    fn transform_mut(&mut self, entity: Entity) -> SceneResult<&mut TransformComponent> {
        self.get_component_mut::<TransformComponent>(entity)
            .ok_or(SceneError::MissingTransform(entity))
    }
}

/// Mark every pending transform change as consumed
pub(crate) fn consume_transform_changes(world: &mut World) {
    for (_, transform) in world.query_mut::<TransformComponent>() {
        transform.clear_dirty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-4;

    fn spawn(world: &mut World, transform: TransformComponent) -> Entity {
        let entity = world.create_entity();
        world.add_component(entity, transform);
        entity
    }

    fn world_with_hooks() -> World {
        let mut world = World::new();
        register_hooks(&mut world);
        world
    }

    #[test]
    fn test_world_matrix_is_product_of_locals() {
        let mut world = world_with_hooks();
        let locals = [
            TransformComponent::from_position(Vec3::new(1.0, 2.0, 3.0))
                .with_rotation_euler(Vec3::new(0.0, 45.0, 0.0)),
            TransformComponent::from_position(Vec3::new(0.0, 1.0, 0.0))
                .with_rotation_euler(Vec3::new(30.0, 0.0, 0.0))
                .with_uniform_scale(2.0),
            TransformComponent::from_position(Vec3::new(-1.0, 0.0, 2.0))
                .with_scale(Vec3::new(1.0, 0.5, 3.0)),
            TransformComponent::from_position(Vec3::new(0.5, 0.5, 0.5))
                .with_rotation_euler(Vec3::new(0.0, 0.0, 90.0)),
        ];

        let mut chain = Vec::new();
        for local in &locals {
            let entity = spawn(&mut world, local.clone());
            if let Some(&parent) = chain.last() {
                world.set_parent(entity, Some(parent)).unwrap();
            }
            chain.push(entity);
        }

        let expected = locals
            .iter()
            .fold(Mat4::identity(), |acc, local| acc * local.local_matrix());
        let leaf = *chain.last().unwrap();
        assert_relative_eq!(world.world_matrix(leaf).unwrap(), expected, epsilon = EPSILON);

        // Grouped the other way: (root * mid) * (child * leaf)
        let upper = locals[0].local_matrix() * locals[1].local_matrix();
        let lower = locals[2].local_matrix() * locals[3].local_matrix();
        assert_relative_eq!(world.world_matrix(leaf).unwrap(), upper * lower, epsilon = EPSILON);
    }

    #[test]
    fn test_set_world_position_round_trip() {
        let mut world = world_with_hooks();
        let root = spawn(&mut world, TransformComponent::identity());
        let target = Vec3::new(3.0, -2.0, 7.5);
        world.set_world_position(root, target).unwrap();
        assert_relative_eq!(world.world_position(root).unwrap(), target, epsilon = EPSILON);

        let parent = spawn(
            &mut world,
            TransformComponent::from_position(Vec3::new(4.0, 1.0, -2.0))
                .with_rotation_euler(Vec3::new(10.0, 60.0, 5.0))
                .with_scale(Vec3::new(2.0, 0.5, 1.5)),
        );
        let child = spawn(&mut world, TransformComponent::identity());
        world.set_parent(child, Some(parent)).unwrap();
        world.set_world_position(child, target).unwrap();
        assert_relative_eq!(world.world_position(child).unwrap(), target, epsilon = EPSILON);

        // Parent moves afterwards; setting again must still land on target
        world
            .get_component_mut::<TransformComponent>(parent)
            .unwrap()
            .add_local_position(Vec3::new(-9.0, 3.0, 1.0));
        world.set_world_position(child, target).unwrap();
        assert_relative_eq!(world.world_position(child).unwrap(), target, epsilon = EPSILON);
    }

    #[test]
    fn test_parent_move_carries_child() {
        let mut world = world_with_hooks();
        let a = spawn(&mut world, TransformComponent::identity());
        let b = spawn(&mut world, TransformComponent::from_position(Vec3::new(1.0, 0.0, 0.0)));
        world.set_parent(b, Some(a)).unwrap();

        world.set_world_position(a, Vec3::new(5.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(
            world.world_position(b).unwrap(),
            Vec3::new(6.0, 0.0, 0.0),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_replacing_parent_transform_keeps_children() {
        let mut world = world_with_hooks();
        let parent = spawn(&mut world, TransformComponent::identity());
        let child = spawn(&mut world, TransformComponent::from_position(Vec3::new(1.0, 0.0, 0.0)));
        world.set_parent(child, Some(parent)).unwrap();

        world.add_component(parent, TransformComponent::from_position(Vec3::new(5.0, 0.0, 0.0)));
        assert_eq!(world.parent_of(child), Some(parent));
        assert_relative_eq!(
            world.world_position(child).unwrap(),
            Vec3::new(6.0, 0.0, 0.0),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_cloned_transform_starts_unparented() {
        let mut world = world_with_hooks();
        let root = spawn(&mut world, TransformComponent::identity());
        let child = spawn(&mut world, TransformComponent::from_position(Vec3::new(0.0, 2.0, 0.0)));
        world.set_parent(child, Some(root)).unwrap();

        let copy = world.get_component::<TransformComponent>(child).unwrap().clone();
        assert_eq!(copy.raw_parent(), None);
        assert!(copy.is_dirty());
        assert_relative_eq!(copy.local_position(), Vec3::new(0.0, 2.0, 0.0), epsilon = EPSILON);

        // Copy onto the root: still a root, and the loop stays rejected
        world.add_component(root, copy);
        assert_eq!(world.parent_of(root), None);
        assert_eq!(world.parent_of(child), Some(root));
        assert!(world.set_parent(root, Some(child)).is_err());
    }

    #[test]
    fn test_set_world_rotation_round_trip() {
        let mut world = world_with_hooks();
        let parent = spawn(
            &mut world,
            TransformComponent::identity().with_rotation_euler(Vec3::new(0.0, 90.0, 0.0)),
        );
        let child = spawn(&mut world, TransformComponent::identity());
        world.set_parent(child, Some(parent)).unwrap();

        let target = utils::quat_from_euler_degrees(Vec3::new(15.0, -30.0, 45.0));
        world.set_world_rotation(child, target).unwrap();
        let actual = world.world_rotation(child).unwrap();
        assert_relative_eq!(actual.coords.dot(&target.coords).abs(), 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_world_scale_multiplies_chain() {
        let mut world = world_with_hooks();
        let parent = spawn(
            &mut world,
            TransformComponent::identity().with_scale(Vec3::new(2.0, 3.0, 4.0)),
        );
        let child = spawn(&mut world, TransformComponent::identity().with_uniform_scale(0.5));
        world.set_parent(child, Some(parent)).unwrap();
        assert_relative_eq!(world.world_scale(child).unwrap(), Vec3::new(1.0, 1.5, 2.0));

        world.set_world_scale(child, Vec3::new(4.0, 3.0, 2.0)).unwrap();
        assert_relative_eq!(world.world_scale(child).unwrap(), Vec3::new(4.0, 3.0, 2.0));
    }

    #[test]
    fn test_transformed_lately_follows_ancestors() {
        let mut world = world_with_hooks();
        let parent = spawn(&mut world, TransformComponent::identity());
        let child = spawn(&mut world, TransformComponent::identity());
        world.set_parent(child, Some(parent)).unwrap();
        consume_transform_changes(&mut world);
        assert!(!world.transformed_lately(parent));
        assert!(!world.transformed_lately(child));

        world
            .get_component_mut::<TransformComponent>(parent)
            .unwrap()
            .set_local_position(Vec3::new(0.0, 1.0, 0.0));
        assert!(world.transformed_lately(parent));
        assert!(world.transformed_lately(child));
        assert!(!world.get_component::<TransformComponent>(child).unwrap().is_dirty());

        consume_transform_changes(&mut world);
        assert!(!world.transformed_lately(parent));
        assert!(!world.transformed_lately(child));
    }

    #[test]
    fn test_reparent_keeps_local_values() {
        let mut world = world_with_hooks();
        let old_parent = spawn(&mut world, TransformComponent::from_position(Vec3::new(1.0, 0.0, 0.0)));
        let new_parent = spawn(
            &mut world,
            TransformComponent::from_position(Vec3::new(0.0, 10.0, 0.0))
                .with_rotation_euler(Vec3::new(0.0, 90.0, 0.0))
                .with_uniform_scale(3.0),
        );
        let child = spawn(
            &mut world,
            TransformComponent::from_position(Vec3::new(2.0, 0.0, 0.0))
                .with_rotation_euler(Vec3::new(0.0, 0.0, 30.0))
                .with_uniform_scale(0.5),
        );
        world.set_parent(child, Some(old_parent)).unwrap();
        let before = world.get_component::<TransformComponent>(child).unwrap().local_transform();

        world.set_parent(child, Some(new_parent)).unwrap();
        let after = world.get_component::<TransformComponent>(child).unwrap().local_transform();
        assert_eq!(before, after);
        assert_eq!(world.parent_of(child), Some(new_parent));
    }

    #[test]
    fn test_reparent_keep_world_preserves_pose() {
        let mut world = world_with_hooks();
        let parent = spawn(
            &mut world,
            TransformComponent::from_position(Vec3::new(0.0, 10.0, 0.0))
                .with_rotation_euler(Vec3::new(0.0, 90.0, 0.0))
                .with_uniform_scale(2.0),
        );
        let child = spawn(&mut world, TransformComponent::from_position(Vec3::new(3.0, 1.0, -4.0)));
        let before = world.world_position(child).unwrap();

        world.reparent_keep_world(child, Some(parent)).unwrap();
        assert_relative_eq!(world.world_position(child).unwrap(), before, epsilon = EPSILON);
        assert_relative_eq!(world.world_scale(child).unwrap(), Vec3::repeat(1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_destroying_parent_unparents_children() {
        let mut world = world_with_hooks();
        let parent = spawn(&mut world, TransformComponent::identity());
        let first = spawn(&mut world, TransformComponent::identity());
        let second = spawn(&mut world, TransformComponent::identity());
        world.set_parent(first, Some(parent)).unwrap();
        world.set_parent(second, Some(parent)).unwrap();
        assert_eq!(world.children_of(parent).len(), 2);

        world.destroy_entity(parent);
        for child in [first, second] {
            assert_eq!(world.parent_of(child), None);
            let transform = world.get_component::<TransformComponent>(child).unwrap();
            assert_eq!(transform.raw_parent(), None);
        }
    }

    #[test]
    fn test_parent_without_transform_counts_as_root() {
        let mut world = World::new();
        let parent = spawn(&mut world, TransformComponent::from_position(Vec3::new(5.0, 0.0, 0.0)));
        let child = spawn(&mut world, TransformComponent::from_position(Vec3::new(1.0, 0.0, 0.0)));
        world.set_parent(child, Some(parent)).unwrap();

        // No hooks registered: the stale reference stays, traversal must ignore it
        world.remove_component::<TransformComponent>(parent);
        assert_eq!(world.parent_of(child), None);
        assert_relative_eq!(world.world_position(child).unwrap(), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_cycles_rejected() {
        let mut world = world_with_hooks();
        let a = spawn(&mut world, TransformComponent::identity());
        let b = spawn(&mut world, TransformComponent::identity());
        let c = spawn(&mut world, TransformComponent::identity());
        world.set_parent(b, Some(a)).unwrap();
        world.set_parent(c, Some(b)).unwrap();

        assert_eq!(
            world.set_parent(a, Some(c)),
            Err(SceneError::HierarchyCycle { child: a, parent: c })
        );
        assert_eq!(
            world.set_parent(a, Some(a)),
            Err(SceneError::HierarchyCycle { child: a, parent: a })
        );
        assert_eq!(world.parent_of(a), None);
    }

    #[test]
    fn test_missing_transform_reported() {
        let mut world = world_with_hooks();
        let bare = world.create_entity();
        let node = spawn(&mut world, TransformComponent::identity());
        assert_eq!(world.set_parent(node, Some(bare)), Err(SceneError::MissingTransform(bare)));
        assert_eq!(
            world.set_world_position(bare, Vec3::zeros()),
            Err(SceneError::MissingTransform(bare))
        );
        assert!(world.world_matrix(bare).is_none());
    }
}
