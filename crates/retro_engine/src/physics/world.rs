//! rapier3d simulation world
//!
//! Owns every rapier set and pipeline. The rest of the engine talks to it in
//! engine math types through [`BodyHandle`]s; nothing outside `physics`
//! touches rapier directly.

use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::parry::shape::Capsule;
use rapier3d::prelude::*;

use super::conversions::{
    from_rapier_point, from_rapier_quat, from_rapier_vec, to_isometry, to_rapier_point,
    to_rapier_quat, to_rapier_vec,
};
use super::PhysicsError;
use crate::core::CharacterConfig;
use crate::ecs::components::{MotionKind, PhysicsMaterial};
use crate::foundation::math::{utils, Quat, Vec3};

/// Simulation-owned identifier of a body and its single collider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle {
    body: RigidBodyHandle,
    collider: ColliderHandle,
}

impl BodyHandle {
    pub(crate) const fn from_parts(body: RigidBodyHandle, collider: ColliderHandle) -> Self {
        Self { body, collider }
    }

    /// rapier rigid body handle
    #[must_use]
    pub const fn body(&self) -> RigidBodyHandle {
        self.body
    }

    /// rapier collider handle
    #[must_use]
    pub const fn collider(&self) -> ColliderHandle {
        self.collider
    }
}

/// Collider pair with a stable order, so `(a, b)` and `(b, a)` are the same key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderPair(pub ColliderHandle, pub ColliderHandle);

impl ColliderPair {
    /// Order the pair
    #[must_use]
    pub fn new(a: ColliderHandle, b: ColliderHandle) -> Self {
        if a.into_raw_parts() <= b.into_raw_parts() {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }
}

/// Touching collider pair with a summary of the contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchingPair {
    /// Ordered colliders
    pub pair: ColliderPair,
    /// Where and how they touch, seen from `pair.0`
    pub contact: ContactSummary,
}

/// Contact information delivered with collision events
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactSummary {
    /// World-space contact point
    pub position: Vec3,
    /// World-space contact normal, pointing away from the receiving body
    /// (zero for sensor overlaps)
    pub normal: Vec3,
    /// Average restitution of the two surfaces
    pub restitution: f32,
}

/// Result of a character move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterMove {
    /// Translation actually applied after collide-and-slide
    pub translation: Vec3,
    /// Whether the capsule ended up standing on something
    pub grounded: bool,
}

/// The simulation
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    debug_pipeline: DebugRenderPipeline,
}

impl PhysicsWorld {
    /// Create an empty world stepping by `fixed_timestep` seconds
    pub fn new(gravity: Vec3, fixed_timestep: f32) -> Result<Self, PhysicsError> {
        if !(fixed_timestep.is_finite() && fixed_timestep > 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "fixed timestep must be positive, got {fixed_timestep}"
            )));
        }
        if !gravity.iter().all(|g| g.is_finite()) {
            return Err(PhysicsError::InvalidConfig(format!(
                "gravity must be finite, got {gravity:?}"
            )));
        }

        let integration_parameters = IntegrationParameters {
            dt: fixed_timestep,
            ..IntegrationParameters::default()
        };

        Ok(Self {
            gravity: to_rapier_vec(&gravity),
            integration_parameters,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            debug_pipeline: DebugRenderPipeline::default(),
        })
    }

    /// Advance the simulation by one fixed step. Blocks until integrated.
    pub fn step(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }

    /// Gravity vector
    #[must_use]
    pub fn gravity(&self) -> Vec3 {
        from_rapier_vec(&self.gravity)
    }

    /// Number of bodies in the simulation
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Whether `handle` still refers to a live body
    #[must_use]
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle.body)
    }

    /// Create a body with a single collider at the given world pose
    pub fn insert_body(
        &mut self,
        shape: SharedShape,
        motion: MotionKind,
        material: &PhysicsMaterial,
        position: &Vec3,
        rotation: &Quat,
    ) -> BodyHandle {
        let builder = match motion {
            MotionKind::Static => RigidBodyBuilder::fixed(),
            MotionKind::Kinematic | MotionKind::Sensor => {
                RigidBodyBuilder::kinematic_position_based()
            }
            MotionKind::Dynamic => RigidBodyBuilder::dynamic(),
        };
        let body = builder
            .pose(to_isometry(position, rotation))
            .linear_damping(material.linear_damping)
            .angular_damping(material.angular_damping)
            .can_sleep(material.allow_sleep)
            .build();

        let mut collider = ColliderBuilder::new(shape)
            .friction(material.friction)
            .restitution(material.restitution);
        if motion == MotionKind::Dynamic {
            collider = collider.mass(material.mass);
        }
        if motion == MotionKind::Sensor {
            collider = collider
                .sensor(true)
                .active_collision_types(ActiveCollisionTypes::all());
        }

        self.attach(body, collider.build())
    }

    /// Create the kinematic capsule backing a character controller
    pub fn insert_character(&mut self, half_height: f32, radius: f32, position: &Vec3) -> BodyHandle {
        let body = RigidBodyBuilder::kinematic_position_based()
            .pose(to_isometry(position, &Quat::identity()))
            .build();
        let collider = ColliderBuilder::capsule_y(half_height, radius).build();
        self.attach(body, collider)
    }

    fn attach(&mut self, body: RigidBody, collider: Collider) -> BodyHandle {
        let body = self.bodies.insert(body);
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);
        BodyHandle { body, collider }
    }

    /// Remove a body and its collider. Unknown handles are ignored.
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        self.bodies
            .remove(
                handle.body,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    /// Current world pose of a body
    #[must_use]
    pub fn body_pose(&self, handle: BodyHandle) -> Option<(Vec3, Quat)> {
        let body = self.bodies.get(handle.body)?;
        Some((
            from_rapier_vec(body.translation()),
            from_rapier_quat(body.rotation()),
        ))
    }

    /// Teleport a body to a new pose
    pub fn set_body_pose(&mut self, handle: BodyHandle, position: &Vec3, rotation: &Quat) {
        if let Some(body) = self.bodies.get_mut(handle.body) {
            if body.is_kinematic() {
                body.set_next_kinematic_translation(to_rapier_vec(position));
                body.set_next_kinematic_rotation(to_rapier_quat(rotation));
            } else {
                body.set_translation(to_rapier_vec(position), true);
                body.set_rotation(to_rapier_quat(rotation), true);
            }
        }
    }

    /// Place a body immediately, kinematic or not
    pub fn teleport_body(&mut self, handle: BodyHandle, position: &Vec3) {
        if let Some(body) = self.bodies.get_mut(handle.body) {
            body.set_translation(to_rapier_vec(position), true);
            if body.is_kinematic() {
                body.set_next_kinematic_translation(to_rapier_vec(position));
            }
        }
    }

    /// Linear velocity of a body
    #[must_use]
    pub fn linear_velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        self.bodies
            .get(handle.body)
            .map(|body| from_rapier_vec(body.linvel()))
    }

    /// Overwrite the linear velocity of a body
    pub fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: &Vec3) {
        if let Some(body) = self.bodies.get_mut(handle.body) {
            body.set_linvel(to_rapier_vec(velocity), true);
        }
    }

    /// Apply an instantaneous impulse at the center of mass
    pub fn apply_impulse(&mut self, handle: BodyHandle, impulse: &Vec3) {
        if let Some(body) = self.bodies.get_mut(handle.body) {
            body.apply_impulse(to_rapier_vec(impulse), true);
        }
    }

    /// Body a collider is attached to
    #[must_use]
    pub fn collider_body(&self, collider: ColliderHandle) -> Option<RigidBodyHandle> {
        self.colliders.get(collider)?.parent()
    }

    /// Nearest solid collider along a ray, with the hit distance.
    /// `direction` must be normalized.
    #[must_use]
    pub fn cast_ray(&self, origin: &Vec3, direction: &Vec3, max_distance: f32) -> Option<(ColliderHandle, f32)> {
        let ray = Ray::new(to_rapier_point(origin), to_rapier_vec(direction));
        let query_pipeline = self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            QueryFilter::default().exclude_sensors(),
        );
        query_pipeline.cast_ray(&ray, max_distance, true)
    }

    /// Collide-and-slide a character capsule from `position` by `desired`
    #[must_use]
    pub fn move_character(
        &self,
        controller: &KinematicCharacterController,
        handle: BodyHandle,
        shape: &Capsule,
        position: &Vec3,
        desired: &Vec3,
        dt: f32,
    ) -> CharacterMove {
        let query_pipeline = self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            QueryFilter::default()
                .exclude_rigid_body(handle.body)
                .exclude_sensors(),
        );
        let corrected = controller.move_shape(
            dt,
            &query_pipeline,
            shape,
            &to_isometry(position, &Quat::identity()),
            to_rapier_vec(desired),
            |_| {},
        );
        CharacterMove {
            translation: from_rapier_vec(&corrected.translation),
            grounded: corrected.grounded,
        }
    }

    /// Every collider pair currently touching or overlapping
    #[must_use]
    pub fn touching_pairs(&self) -> Vec<TouchingPair> {
        let mut touching = Vec::new();

        for contact_pair in self.narrow_phase.contact_pairs() {
            let Some(manifold) = contact_pair
                .manifolds
                .iter()
                .find(|manifold| !manifold.data.solver_contacts.is_empty())
            else {
                continue;
            };
            let pair = ColliderPair::new(contact_pair.collider1, contact_pair.collider2);
            // rapier's normal points from collider1 into collider2
            let normal = from_rapier_vec(&manifold.data.normal);
            let normal = if pair.0 == contact_pair.collider1 { normal } else { -normal };
            touching.push(TouchingPair {
                pair,
                contact: ContactSummary {
                    position: from_rapier_point(&manifold.data.solver_contacts[0].point),
                    normal,
                    restitution: self.combined_restitution(pair),
                },
            });
        }

        for (a, b, intersecting) in self.narrow_phase.intersection_pairs() {
            if !intersecting {
                continue;
            }
            let pair = ColliderPair::new(a, b);
            let position = match (self.colliders.get(a), self.colliders.get(b)) {
                (Some(first), Some(second)) => {
                    (from_rapier_vec(first.translation()) + from_rapier_vec(second.translation())) * 0.5
                }
                _ => Vec3::zeros(),
            };
            touching.push(TouchingPair {
                pair,
                contact: ContactSummary {
                    position,
                    normal: Vec3::zeros(),
                    restitution: self.combined_restitution(pair),
                },
            });
        }

        touching
    }

    fn combined_restitution(&self, pair: ColliderPair) -> f32 {
        let first = self.colliders.get(pair.0).map_or(0.0, Collider::restitution);
        let second = self.colliders.get(pair.1).map_or(0.0, Collider::restitution);
        (first + second) * 0.5
    }

    /// Feed collider wireframes to a debug renderer
    pub fn debug_render(&mut self, backend: &mut impl DebugRenderBackend) {
        self.debug_pipeline.render(
            backend,
            &self.bodies,
            &self.colliders,
            &self.impulse_joints,
            &self.multibody_joints,
            &self.narrow_phase,
        );
    }

    /// World-space triangles of every triangle-mesh collider
    #[must_use]
    pub fn mesh_triangles(&self) -> Vec<[Vec3; 3]> {
        let mut triangles = Vec::new();
        for (_, collider) in self.colliders.iter() {
            let Some(mesh) = collider.shape().as_trimesh() else {
                continue;
            };
            let pose = collider.position();
            for triangle in mesh.triangles() {
                triangles.push([
                    from_rapier_point(&(pose * triangle.a)),
                    from_rapier_point(&(pose * triangle.b)),
                    from_rapier_point(&(pose * triangle.c)),
                ]);
            }
        }
        triangles
    }
}

/// Build the shared character controller from configuration
#[must_use]
pub fn character_controller(config: &CharacterConfig) -> KinematicCharacterController {
    KinematicCharacterController {
        offset: CharacterLength::Absolute(config.skin_offset),
        max_slope_climb_angle: utils::deg_to_rad(config.max_slope_climb_degrees),
        min_slope_slide_angle: utils::deg_to_rad(config.min_slope_slide_degrees),
        snap_to_ground: (config.snap_to_ground > 0.0)
            .then_some(CharacterLength::Absolute(config.snap_to_ground)),
        autostep: (config.autostep_height > 0.0).then_some(CharacterAutostep {
            max_height: CharacterLength::Absolute(config.autostep_height),
            include_dynamic_bodies: false,
            ..CharacterAutostep::default()
        }),
        ..KinematicCharacterController::default()
    }
}
