//! Per-frame draw list
//!
//! Collects visible mesh instances with their world matrices, grouped by mesh
//! so each mesh can be drawn as one instanced batch.

use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};

use super::frustum::Frustum;
use crate::ecs::components::{MeshComponent, TransformComponent};
use crate::ecs::{Entity, World};
use crate::foundation::math::{Mat4, Vec3};

/// GPU instance record, laid out for direct upload
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    /// Column-major model matrix
    pub model: [[f32; 4]; 4],
    /// Vertex color tint
    pub color: [f32; 4],
}

impl InstanceData {
    /// Pack a model matrix and tint
    #[must_use]
    pub fn new(model: &Mat4, color: [f32; 4]) -> Self {
        Self {
            model: (*model).into(),
            color,
        }
    }
}

/// Visible instances of one mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawBatch {
    /// Entities in instance order
    pub entities: Vec<Entity>,
    /// Instance records
    pub instances: Vec<InstanceData>,
}

impl DrawBatch {
    /// Instance records as raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

/// Every visible instance this frame, by mesh id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    batches: BTreeMap<u32, DrawBatch>,
    culled: usize,
}

impl DrawList {
    /// Gather visible meshes. Each instance's world matrix is computed once.
    #[must_use]
    pub fn collect(world: &World, frustum: &Frustum) -> Self {
        let mut list = Self::default();

        for entity in world.view::<(MeshComponent, TransformComponent)>() {
            let Some(mesh) = world.get_component::<MeshComponent>(entity) else {
                continue;
            };
            if !mesh.visible {
                continue;
            }
            let Some(model) = world.world_matrix(entity) else {
                continue;
            };

            let center = Vec3::new(model[(0, 3)], model[(1, 3)], model[(2, 3)]);
            let radius = mesh.bounding_radius * max_axis_scale(&model);
            if !frustum.intersects_sphere(&center, radius) {
                list.culled += 1;
                continue;
            }

            let batch = list.batches.entry(mesh.mesh_id).or_default();
            batch.entities.push(entity);
            batch.instances.push(InstanceData::new(&model, mesh.color));
        }

        log::trace!(
            "Draw list: {} instances in {} batches, {} culled",
            list.instance_count(),
            list.batches.len(),
            list.culled
        );
        list
    }

    /// Batches in mesh id order
    pub fn batches(&self) -> impl Iterator<Item = (u32, &DrawBatch)> {
        self.batches.iter().map(|(mesh_id, batch)| (*mesh_id, batch))
    }

    /// Batch for one mesh
    #[must_use]
    pub fn batch(&self, mesh_id: u32) -> Option<&DrawBatch> {
        self.batches.get(&mesh_id)
    }

    /// Total visible instances
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.batches.values().map(|batch| batch.instances.len()).sum()
    }

    /// Instances rejected by the frustum
    #[must_use]
    pub const fn culled(&self) -> usize {
        self.culled
    }
}

fn max_axis_scale(model: &Mat4) -> f32 {
    (0..3)
        .map(|column| model.fixed_view::<3, 1>(0, column).norm())
        .fold(0.0, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::CameraComponent;
    use crate::foundation::math::Mat4Ext;
    use approx::assert_relative_eq;

    fn frustum() -> Frustum {
        let projection = CameraComponent::default().projection(4.0 / 3.0);
        let view = Mat4::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::zeros(), Vec3::y());
        Frustum::from_matrix(&(projection * view))
    }

    fn spawn(world: &mut World, position: Vec3, mesh: MeshComponent) -> Entity {
        let entity = world.create_entity();
        world.add_component(entity, TransformComponent::from_position(position));
        world.add_component(entity, mesh);
        entity
    }

    #[test]
    fn test_collects_visible_instances_by_mesh() {
        let mut world = World::new();
        let a = spawn(&mut world, Vec3::zeros(), MeshComponent::new(1, 1.0));
        spawn(&mut world, Vec3::new(1.0, 0.0, 0.0), MeshComponent::new(1, 1.0));
        spawn(&mut world, Vec3::new(0.0, 1.0, 0.0), MeshComponent::new(2, 1.0));
        spawn(&mut world, Vec3::new(0.0, 0.0, 50.0), MeshComponent::new(2, 1.0));
        let hidden = spawn(&mut world, Vec3::zeros(), MeshComponent::new(3, 1.0));
        world.get_component_mut::<MeshComponent>(hidden).unwrap().visible = false;

        let list = DrawList::collect(&world, &frustum());

        assert_eq!(list.instance_count(), 3);
        assert_eq!(list.culled(), 1);
        assert_eq!(list.batch(1).unwrap().instances.len(), 2);
        assert_eq!(list.batch(2).unwrap().instances.len(), 1);
        assert!(list.batch(3).is_none());
        assert!(list.batch(1).unwrap().entities.contains(&a));
    }

    #[test]
    fn test_instance_uses_world_matrix() {
        let mut world = World::new();
        let parent = world.create_entity();
        world.add_component(parent, TransformComponent::from_position(Vec3::new(2.0, 0.0, 0.0)));
        let child = spawn(
            &mut world,
            Vec3::new(0.0, 1.0, 0.0),
            MeshComponent::new(7, 0.5).with_color([1.0, 0.0, 0.0, 1.0]),
        );
        world.set_parent(child, Some(parent)).unwrap();

        let list = DrawList::collect(&world, &frustum());
        let batch = list.batch(7).unwrap();
        let instance = batch.instances[0];
        // Translation is the fourth column
        assert_relative_eq!(instance.model[3][0], 2.0);
        assert_relative_eq!(instance.model[3][1], 1.0);
        assert_eq!(instance.color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(batch.as_bytes().len(), std::mem::size_of::<InstanceData>());
        assert_eq!(std::mem::size_of::<InstanceData>(), 80);
    }

    #[test]
    fn test_scaled_bounds_stay_visible() {
        let mut world = World::new();
        let entity = world.create_entity();
        world.add_component(
            entity,
            TransformComponent::from_position(Vec3::new(0.0, 0.0, 14.0)).with_uniform_scale(10.0),
        );
        world.add_component(entity, MeshComponent::new(1, 1.0));

        let list = DrawList::collect(&world, &frustum());
        assert_eq!(list.instance_count(), 1);
    }
}
