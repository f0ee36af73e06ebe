//! Physics synchronization
//!
//! Reconciles the component world with the rapier simulation once per frame:
//! game-authored transforms are pushed in, fixed steps run, simulated poses
//! are pulled back out and contact transitions are queued per entity.

use std::collections::HashMap;

use log::{debug, error, trace, warn};
use rapier3d::control::KinematicCharacterController;
use rapier3d::parry::shape::Capsule;
use rapier3d::prelude::RigidBodyHandle;
use rayon::prelude::*;

use super::accumulator::FixedTimestep;
use super::contacts::{is_deliverable, ContactEvent, ContactKind, ContactTracker};
use super::debug::{DebugBackend, DebugDraw, MESH_COLLIDER_COLOR};
use super::world::{character_controller, BodyHandle, PhysicsWorld};
use super::{PhysicsError, ShapeDescriptor};
use crate::core::PhysicsConfig;
use crate::ecs::components::{
    CharacterController, CollisionStateComponent, MotionKind, PhysicsBody, TransformComponent,
};
use crate::ecs::{Entity, World};
use crate::foundation::math::{Quat, Vec3};
use crate::scene::hierarchy::consume_transform_changes;

/// Nearest hit of a ray against the simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// Entity owning the hit collider
    pub entity: Entity,
    /// Simulation handle of the hit body
    pub handle: BodyHandle,
    /// Distance from the ray origin
    pub distance: f32,
    /// World-space hit point
    pub position: Vec3,
    /// Always zero; surface normals are not reported
    pub normal: Vec3,
}

/// Bodies whose owning component disappeared, waiting to be removed from the
/// simulation on the next pass
#[derive(Debug, Default)]
struct DetachedBodies(Vec<BodyHandle>);

fn detach_physics_body(world: &mut World, entity: Entity) {
    let handle = world
        .get_component_mut::<PhysicsBody>(entity)
        .and_then(PhysicsBody::unbind);
    if let Some(handle) = handle {
        world.resource_or_default::<DetachedBodies>().0.push(handle);
    }
}

fn detach_character(world: &mut World, entity: Entity) {
    let handle = world
        .get_component_mut::<CharacterController>(entity)
        .and_then(CharacterController::unbind);
    if let Some(handle) = handle {
        world.resource_or_default::<DetachedBodies>().0.push(handle);
    }
}

/// Owner of the simulation and the entity ↔ body mapping
pub struct PhysicsSync {
    physics: PhysicsWorld,
    timestep: FixedTimestep,
    controller: KinematicCharacterController,
    tracker: ContactTracker,
    events: Vec<ContactEvent>,
    body_entities: HashMap<RigidBodyHandle, Entity>,
    parallel_pull_threshold: usize,
    debug_draw: bool,
}

impl PhysicsSync {
    /// Create the simulation and register destroy hooks on `world`
    pub fn new(config: &PhysicsConfig, world: &mut World) -> Result<Self, PhysicsError> {
        config.validate().map_err(PhysicsError::InvalidConfig)?;
        let physics = PhysicsWorld::new(config.gravity, config.fixed_timestep)?;

        world.on_destroy::<PhysicsBody>(detach_physics_body);
        world.on_destroy::<CharacterController>(detach_character);
        world.on_replace::<PhysicsBody>(detach_physics_body);
        world.on_replace::<CharacterController>(detach_character);
        world.insert_resource(DetachedBodies::default());

        debug!(
            "Physics ready: step {:.4}s, gravity {:?}, max {} substeps",
            config.fixed_timestep, config.gravity, config.max_substeps
        );

        Ok(Self {
            physics,
            timestep: FixedTimestep::new(config.fixed_timestep, config.max_substeps),
            controller: character_controller(&config.character),
            tracker: ContactTracker::new(),
            events: Vec::new(),
            body_entities: HashMap::new(),
            parallel_pull_threshold: config.parallel_pull_threshold,
            debug_draw: config.debug_draw,
        })
    }

    /// Run one frame of synchronization: push, step, pull, contacts
    pub fn update(&mut self, world: &mut World, dt: f32) {
        if !self.events.is_empty() {
            trace!("Discarding {} undrained contact events", self.events.len());
            self.events.clear();
        }

        self.reap_detached(world);
        self.sync_characters(world, dt);
        self.sync_bodies(world);
        consume_transform_changes(world);

        let physics = &mut self.physics;
        let tracker = &mut self.tracker;
        let events = &mut self.events;
        let body_entities = &self.body_entities;
        let steps = self.timestep.advance(dt, || {
            physics.step();
            let touching = physics.touching_pairs();
            tracker.update(
                &touching,
                |collider| {
                    physics
                        .collider_body(collider)
                        .and_then(|body| body_entities.get(&body).copied())
                },
                events,
            );
        });
        trace!("Physics: {steps} steps, {} events", self.events.len());

        if steps > 0 {
            self.pull(world);
        }
        self.refresh_collision_state(world);
    }

    /// Take every queued contact event still deliverable to its entity
    pub fn drain_contact_events(&mut self, world: &World) -> Vec<ContactEvent> {
        self.events
            .drain(..)
            .filter(|event| is_deliverable(world, event))
            .collect()
    }

    /// Events queued by the last update, undelivered and unfiltered
    #[must_use]
    pub fn pending_contact_events(&self) -> &[ContactEvent] {
        &self.events
    }

    /// Nearest body along a ray. `direction` need not be normalized; a zero
    /// direction hits nothing.
    #[must_use]
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RaycastHit> {
        let direction = direction.try_normalize(f32::EPSILON)?;
        let (collider, distance) = self.physics.cast_ray(&origin, &direction, max_distance)?;
        let body = self.physics.collider_body(collider)?;
        let entity = *self.body_entities.get(&body)?;
        Some(RaycastHit {
            entity,
            handle: BodyHandle::from_parts(body, collider),
            distance,
            position: origin + direction * distance,
            normal: Vec3::zeros(),
        })
    }

    /// Linear velocity of an entity's body
    #[must_use]
    pub fn linear_velocity(&self, world: &World, entity: Entity) -> Option<Vec3> {
        self.physics.linear_velocity(body_handle(world, entity)?)
    }

    /// Overwrite the linear velocity of an entity's body
    pub fn set_linear_velocity(&mut self, world: &World, entity: Entity, velocity: Vec3) -> bool {
        let Some(handle) = body_handle(world, entity) else {
            return false;
        };
        self.physics.set_linear_velocity(handle, &velocity);
        true
    }

    /// Apply an impulse to an entity's body
    pub fn apply_impulse(&mut self, world: &World, entity: Entity, impulse: Vec3) -> bool {
        let Some(handle) = body_handle(world, entity) else {
            return false;
        };
        self.physics.apply_impulse(handle, &impulse);
        true
    }

    /// Entity owning a body
    #[must_use]
    pub fn entity_for_body(&self, handle: BodyHandle) -> Option<Entity> {
        self.body_entities.get(&handle.body()).copied()
    }

    /// Number of bodies in the simulation
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.physics.body_count()
    }

    /// Whether debug drawing is enabled by configuration
    #[must_use]
    pub const fn debug_draw_enabled(&self) -> bool {
        self.debug_draw
    }

    /// Send collider wireframes and mesh collider triangles to `target`
    pub fn debug_draw(&mut self, target: &mut impl DebugDraw) {
        self.physics.debug_render(&mut DebugBackend { target: &mut *target });
        let triangles = self.physics.mesh_triangles();
        if !triangles.is_empty() {
            target.draw_triangles(&triangles, MESH_COLLIDER_COLOR);
        }
    }

    /// The underlying simulation
    #[must_use]
    pub const fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    fn reap_detached(&mut self, world: &mut World) {
        let Some(detached) = world.resource_mut::<DetachedBodies>() else {
            return;
        };
        for handle in std::mem::take(&mut detached.0) {
            self.remove_body(handle);
        }
    }

    fn remove_body(&mut self, handle: BodyHandle) {
        if let Some(entity) = self.body_entities.remove(&handle.body()) {
            trace!("Removing body of {entity:?}");
        }
        self.physics.remove_body(handle);
    }

    fn sync_characters(&mut self, world: &mut World, dt: f32) {
        let gravity = self.physics.gravity().y;

        for entity in world.view::<(CharacterController, TransformComponent)>() {
            let (Some(position), Some(rotation)) =
                (world.world_position(entity), world.world_rotation(entity))
            else {
                continue;
            };
            let pushed = world.transformed_lately(entity);
            let Some(character) = world.get_component_mut::<CharacterController>(entity) else {
                continue;
            };

            let handle = if let Some(handle) = character.handle() {
                if pushed {
                    self.physics.teleport_body(handle, &position);
                }
                handle
            } else {
                let handle = self.physics.insert_character(
                    character.half_height(),
                    character.radius(),
                    &position,
                );
                character.bind(handle);
                self.body_entities.insert(handle.body(), entity);
                debug!("Bound character {entity:?}");
                handle
            };

            let shape = Capsule::new_y(character.half_height(), character.radius());
            let desired = character.take_velocity(gravity, dt) * dt;
            let moved = self.physics.move_character(
                &self.controller,
                handle,
                &shape,
                &position,
                &desired,
                dt,
            );
            character.set_grounded(moved.grounded);

            let target = position + moved.translation;
            self.physics.set_body_pose(handle, &target, &Quat::identity());
            match world.world_to_local(entity, target, rotation) {
                Ok((local_position, local_rotation)) => {
                    if let Some(transform) = world.get_component_mut::<TransformComponent>(entity) {
                        transform.set_physics_affected(true);
                        transform.apply_physics_pose(local_position, local_rotation);
                    }
                }
                Err(err) => warn!("Character {entity:?} not written back: {err}"),
            }
        }
    }

    fn sync_bodies(&mut self, world: &mut World) {
        for entity in world.view::<(PhysicsBody, TransformComponent)>() {
            let Some(body) = world.get_component_mut::<PhysicsBody>(entity) else {
                continue;
            };

            if body.needs_rebuild() {
                body.clear_rebuild();
                if let Some(handle) = body.unbind() {
                    debug!("Rebuilding body of {entity:?}");
                    self.remove_body(handle);
                    continue;
                }
            }

            match body.handle() {
                Some(handle) => {
                    if world.transformed_lately(entity) {
                        self.push(world, entity, handle);
                    }
                }
                None => self.bind(world, entity),
            }
        }
    }

    fn push(&mut self, world: &World, entity: Entity, handle: BodyHandle) {
        let (Some(position), Some(rotation)) =
            (world.world_position(entity), world.world_rotation(entity))
        else {
            return;
        };
        trace!("Pushing {entity:?} to {position:?}");
        self.physics.set_body_pose(handle, &position, &rotation);
    }

    fn bind(&mut self, world: &mut World, entity: Entity) {
        let (Some(position), Some(rotation), Some(scale)) = (
            world.world_position(entity),
            world.world_rotation(entity),
            world.world_scale(entity),
        ) else {
            return;
        };
        let Some(body) = world.get_component_mut::<PhysicsBody>(entity) else {
            return;
        };

        let motion = body.motion();
        let fallback = if motion == MotionKind::Dynamic {
            body.shape().convex_fallback()
        } else {
            None
        };
        if fallback.is_some() && body.bind_error().is_none() {
            warn!("Dynamic {entity:?} cannot use a triangle mesh; using its convex hull");
        }
        let descriptor: ShapeDescriptor = fallback.unwrap_or_else(|| body.shape().clone());

        let shape = match descriptor.build(&scale) {
            Ok(shape) => shape,
            Err(err) => {
                if body.record_bind_error(err.clone()) {
                    error!(
                        "Cannot build {} collider for {entity:?}: {err}",
                        descriptor.kind_name()
                    );
                }
                return;
            }
        };

        let handle = self
            .physics
            .insert_body(shape, motion, body.material(), &position, &rotation);
        body.bind(handle);
        self.body_entities.insert(handle.body(), entity);
        debug!("Bound {motion:?} body for {entity:?}");

        if let Some(transform) = world.get_component_mut::<TransformComponent>(entity) {
            transform.set_physics_affected(motion == MotionKind::Dynamic);
        }
    }

    fn pull(&self, world: &mut World) {
        let poses: Vec<(Entity, Vec3, Quat)> = world
            .query::<PhysicsBody>()
            .filter(|(_, body)| body.motion().pulls_pose())
            .filter_map(|(entity, body)| {
                let (position, rotation) = self.physics.body_pose(body.handle()?)?;
                Some((entity, position, rotation))
            })
            .collect();

        let shared: &World = world;
        let convert = |&(entity, position, rotation): &(Entity, Vec3, Quat)| {
            shared
                .world_to_local(entity, position, rotation)
                .ok()
                .map(|local| (entity, local))
        };
        let locals: Vec<(Entity, (Vec3, Quat))> = if poses.len() >= self.parallel_pull_threshold {
            poses.par_iter().filter_map(convert).collect()
        } else {
            poses.iter().filter_map(convert).collect()
        };

        for (entity, (position, rotation)) in locals {
            if let Some(transform) = world.get_component_mut::<TransformComponent>(entity) {
                transform.apply_physics_pose(position, rotation);
            }
        }
    }

    fn refresh_collision_state(&self, world: &mut World) {
        for (_, state) in world.query_mut::<CollisionStateComponent>() {
            state.begin_frame();
        }
        for event in &self.events {
            let Some(state) = world.get_component_mut::<CollisionStateComponent>(event.entity)
            else {
                continue;
            };
            match event.kind {
                ContactKind::Begin => state.enter(event.other),
                ContactKind::End => state.exit(event.other),
                ContactKind::Persist => {}
            }
        }
    }
}

fn body_handle(world: &World, entity: Entity) -> Option<BodyHandle> {
    world
        .get_component::<PhysicsBody>(entity)
        .and_then(PhysicsBody::handle)
        .or_else(|| {
            world
                .get_component::<CharacterController>(entity)
                .and_then(CharacterController::handle)
        })
}
