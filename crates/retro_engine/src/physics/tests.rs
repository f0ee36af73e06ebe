//! Synchronization tests against a live rapier world

use approx::assert_relative_eq;

use super::*;
use crate::core::PhysicsConfig;
use crate::ecs::components::{
    CharacterController, CollisionStateComponent, ContactEventMask, MotionKind, PhysicsBody,
    PhysicsMaterial, TransformComponent,
};
use crate::ecs::{Entity, World};
use crate::foundation::math::Vec3;
use crate::scene::register_hooks;

const DT: f32 = 1.0 / 60.0;
const EPSILON: f32 = 1e-4;

fn setup_with(config: &PhysicsConfig) -> (World, PhysicsSync) {
    let mut world = World::new();
    register_hooks(&mut world);
    let sync = PhysicsSync::new(config, &mut world).unwrap();
    (world, sync)
}

fn setup() -> (World, PhysicsSync) {
    setup_with(&PhysicsConfig::default())
}

fn spawn(world: &mut World, position: Vec3, body: PhysicsBody) -> Entity {
    let entity = world.create_entity();
    world.add_component(entity, TransformComponent::from_position(position));
    world.add_component(entity, body);
    entity
}

fn spawn_ground(world: &mut World) -> Entity {
    spawn(
        world,
        Vec3::zeros(),
        PhysicsBody::fixed(ShapeDescriptor::cuboid(Vec3::new(10.0, 0.5, 10.0))),
    )
}

fn handle_of(world: &World, entity: Entity) -> BodyHandle {
    world
        .get_component::<PhysicsBody>(entity)
        .and_then(PhysicsBody::handle)
        .unwrap()
}

fn cube_corners() -> Vec<Vec3> {
    let mut corners = Vec::new();
    for x in [-0.5, 0.5] {
        for y in [-0.5, 0.5] {
            for z in [-0.5, 0.5] {
                corners.push(Vec3::new(x, y, z));
            }
        }
    }
    corners
}

#[test]
fn test_invalid_config_rejected() {
    let mut world = World::new();
    let config = PhysicsConfig::default().with_fixed_timestep(0.0);
    assert!(matches!(
        PhysicsSync::new(&config, &mut world),
        Err(PhysicsError::InvalidConfig(_))
    ));
}

#[test]
fn test_body_bound_after_first_pass() {
    let (mut world, mut sync) = setup();
    let entity = spawn_ground(&mut world);
    assert!(!world.get_component::<PhysicsBody>(entity).unwrap().is_bound());

    sync.update(&mut world, 0.0);

    let handle = handle_of(&world, entity);
    assert_eq!(sync.body_count(), 1);
    assert_eq!(sync.entity_for_body(handle), Some(entity));
    assert!(sync.physics().contains(handle));
}

#[test]
fn test_empty_hull_binds_once_populated() {
    let (mut world, mut sync) = setup();
    let entity = spawn(
        &mut world,
        Vec3::new(0.0, 5.0, 0.0),
        PhysicsBody::dynamic(ShapeDescriptor::ConvexHull { points: Vec::new() }),
    );

    sync.update(&mut world, DT);
    let body = world.get_component::<PhysicsBody>(entity).unwrap();
    assert!(!body.is_bound());
    assert_eq!(body.bind_error(), Some(&ShapeError::NotEnoughPoints(0)));
    assert_eq!(sync.body_count(), 0);

    // Still unbound on retry
    sync.update(&mut world, DT);
    assert!(!world.get_component::<PhysicsBody>(entity).unwrap().is_bound());

    if let ShapeDescriptor::ConvexHull { points } = world
        .get_component_mut::<PhysicsBody>(entity)
        .unwrap()
        .shape_mut()
    {
        *points = cube_corners();
    }
    sync.update(&mut world, DT);

    let body = world.get_component::<PhysicsBody>(entity).unwrap();
    assert!(body.is_bound());
    assert!(body.bind_error().is_none());
    assert_eq!(sync.body_count(), 1);
}

#[test]
fn test_flat_hull_stays_unbound() {
    let (mut world, mut sync) = setup();
    let points = (0..6)
        .map(|i| Vec3::new(i as f32, (i * i) as f32, 0.0))
        .collect();
    let entity = spawn(
        &mut world,
        Vec3::new(0.0, 5.0, 0.0),
        PhysicsBody::dynamic(ShapeDescriptor::ConvexHull { points }),
    );

    sync.update(&mut world, DT);
    let body = world.get_component::<PhysicsBody>(entity).unwrap();
    assert!(!body.is_bound());
    assert_eq!(body.bind_error(), Some(&ShapeError::DegenerateHull(6)));
    assert_eq!(sync.body_count(), 0);
}

#[test]
fn test_dynamic_sphere_falls() {
    let (mut world, mut sync) = setup();
    let entity = spawn(
        &mut world,
        Vec3::new(0.0, 10.0, 0.0),
        PhysicsBody::dynamic(ShapeDescriptor::sphere(0.5)),
    );

    for _ in 0..30 {
        sync.update(&mut world, DT);
    }

    let transform = world.get_component::<TransformComponent>(entity).unwrap();
    assert!(transform.is_physics_affected());
    assert!(!transform.is_dirty());
    let y = world.world_position(entity).unwrap().y;
    assert!(y < 9.0, "sphere should have fallen, y = {y}");
    assert!(y > 5.0, "sphere fell too far, y = {y}");
}

#[test]
fn test_kinematic_push_moves_body() {
    let (mut world, mut sync) = setup();
    let entity = spawn(
        &mut world,
        Vec3::zeros(),
        PhysicsBody::kinematic(ShapeDescriptor::cuboid(Vec3::new(0.5, 0.5, 0.5))),
    );
    sync.update(&mut world, DT);

    world
        .get_component_mut::<TransformComponent>(entity)
        .unwrap()
        .set_local_position(Vec3::new(3.0, 1.0, 0.0));
    sync.update(&mut world, DT);

    let (position, _) = sync.physics().body_pose(handle_of(&world, entity)).unwrap();
    assert_relative_eq!(position, Vec3::new(3.0, 1.0, 0.0), epsilon = EPSILON);
    assert!(!world.transformed_lately(entity));
}

#[test]
fn test_parent_move_pushes_child_body() {
    let (mut world, mut sync) = setup();
    let parent = world.create_entity();
    world.add_component(parent, TransformComponent::identity());
    let child = spawn(
        &mut world,
        Vec3::new(1.0, 0.0, 0.0),
        PhysicsBody::kinematic(ShapeDescriptor::sphere(0.25)),
    );
    world.set_parent(child, Some(parent)).unwrap();
    sync.update(&mut world, DT);

    world
        .get_component_mut::<TransformComponent>(parent)
        .unwrap()
        .set_local_position(Vec3::new(0.0, 0.0, 4.0));
    assert!(world.transformed_lately(child));
    sync.update(&mut world, DT);

    let (position, _) = sync.physics().body_pose(handle_of(&world, child)).unwrap();
    assert_relative_eq!(position, Vec3::new(1.0, 0.0, 4.0), epsilon = EPSILON);
    assert_relative_eq!(
        world.world_position(child).unwrap(),
        Vec3::new(1.0, 0.0, 4.0),
        epsilon = EPSILON
    );
}

#[test]
fn test_raycast_hits_box() {
    let (mut world, mut sync) = setup();
    let target = spawn(
        &mut world,
        Vec3::new(0.0, 0.0, -10.0),
        PhysicsBody::fixed(ShapeDescriptor::cuboid(Vec3::new(1.0, 1.0, 1.0))),
    );
    sync.update(&mut world, DT);

    let hit = sync
        .raycast(Vec3::zeros(), Vec3::new(0.0, 0.0, -2.0), 100.0)
        .unwrap();
    assert_eq!(hit.entity, target);
    assert_eq!(hit.handle, handle_of(&world, target));
    assert_relative_eq!(hit.distance, 9.0, epsilon = EPSILON);
    assert_relative_eq!(hit.position, Vec3::new(0.0, 0.0, -9.0), epsilon = EPSILON);
    assert_relative_eq!(hit.normal, Vec3::zeros());

    assert!(sync.raycast(Vec3::zeros(), Vec3::z(), 100.0).is_none());
    assert!(sync.raycast(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0), 5.0).is_none());
    assert!(sync.raycast(Vec3::zeros(), Vec3::zeros(), 100.0).is_none());
}

#[test]
fn test_removed_body_receives_no_events() {
    let (mut world, mut sync) = setup();
    let ground = spawn_ground(&mut world);
    let ball = spawn(
        &mut world,
        Vec3::new(0.0, 1.5, 0.0),
        PhysicsBody::dynamic(ShapeDescriptor::sphere(0.5))
            .with_material(PhysicsMaterial::default().with_restitution(0.5)),
    );

    let mut landed = false;
    for _ in 0..120 {
        sync.update(&mut world, DT);
        let events = sync.drain_contact_events(&world);
        if let Some(begin) = events
            .iter()
            .find(|event| event.kind == ContactKind::Begin && event.entity == ball)
        {
            assert_eq!(begin.other, ground);
            assert_relative_eq!(begin.summary.restitution, 0.25, epsilon = EPSILON);
            landed = true;
            break;
        }
    }
    assert!(landed, "ball never touched the ground");

    world.remove_component::<PhysicsBody>(ball);
    sync.update(&mut world, DT);
    assert_eq!(sync.body_count(), 1);

    let events = sync.drain_contact_events(&world);
    assert!(events.iter().all(|event| event.entity != ball));
    assert!(events
        .iter()
        .any(|event| event.kind == ContactKind::End && event.entity == ground));
}

#[test]
fn test_undrained_events_discarded_next_update() {
    let (mut world, mut sync) = setup();
    let ground = spawn_ground(&mut world);
    let ball = spawn(
        &mut world,
        Vec3::new(0.0, 1.0, 0.0),
        PhysicsBody::dynamic(ShapeDescriptor::sphere(0.5))
            .with_material(PhysicsMaterial::default().with_sleep(false)),
    );

    let mut landed = false;
    for _ in 0..120 {
        sync.update(&mut world, DT);
        if sync
            .pending_contact_events()
            .iter()
            .any(|event| event.kind == ContactKind::Begin && event.entity == ball)
        {
            landed = true;
            break;
        }
    }
    assert!(landed, "ball never touched the ground");

    // Nobody drained the begin; the next update drops it
    sync.update(&mut world, DT);
    assert!(!sync
        .pending_contact_events()
        .iter()
        .any(|event| event.kind == ContactKind::Begin && event.other == ground));
    let pending = sync.pending_contact_events().len();
    assert_eq!(sync.drain_contact_events(&world).len(), pending);
    assert!(sync.pending_contact_events().is_empty());
}

#[test]
fn test_collision_state_tracks_contacts() {
    let (mut world, mut sync) = setup();
    let ground = spawn_ground(&mut world);
    let ball = spawn(
        &mut world,
        Vec3::new(0.0, 1.5, 0.0),
        PhysicsBody::dynamic(ShapeDescriptor::sphere(0.5))
            .with_material(PhysicsMaterial::default().with_sleep(false)),
    );
    world.add_component(ball, CollisionStateComponent::default());

    let mut entered = false;
    for _ in 0..90 {
        sync.update(&mut world, DT);
        let state = world.get_component::<CollisionStateComponent>(ball).unwrap();
        if state.just_collided_with(ground) {
            entered = true;
        }
    }
    assert!(entered);
    let state = world.get_component::<CollisionStateComponent>(ball).unwrap();
    assert!(state.is_colliding_with(ground));
}

#[test]
fn test_persist_events_only_when_requested() {
    let (mut world, mut sync) = setup();
    spawn_ground(&mut world);
    let ball = spawn(
        &mut world,
        Vec3::new(0.0, 1.0, 0.0),
        PhysicsBody::dynamic(ShapeDescriptor::sphere(0.5))
            .with_material(PhysicsMaterial::default().with_sleep(false)),
    );

    let mut persisted = 0;
    for frame in 0..90 {
        if frame == 45 {
            world
                .get_component_mut::<PhysicsBody>(ball)
                .unwrap()
                .set_contact_events(ContactEventMask::all());
        }
        sync.update(&mut world, DT);
        let events = sync.drain_contact_events(&world);
        let count = events
            .iter()
            .filter(|event| event.kind == ContactKind::Persist && event.entity == ball)
            .count();
        if frame < 45 {
            assert_eq!(count, 0);
        }
        persisted += count;
    }
    assert!(persisted > 0);
}

#[test]
fn test_destroy_entity_removes_body() {
    let (mut world, mut sync) = setup();
    let entity = spawn_ground(&mut world);
    sync.update(&mut world, DT);
    let handle = handle_of(&world, entity);

    world.destroy_entity(entity);
    sync.update(&mut world, DT);

    assert_eq!(sync.body_count(), 0);
    assert!(!sync.physics().contains(handle));
    assert_eq!(sync.entity_for_body(handle), None);
}

#[test]
fn test_shape_change_rebuilds_body() {
    let (mut world, mut sync) = setup();
    let entity = spawn_ground(&mut world);
    sync.update(&mut world, DT);
    let first = handle_of(&world, entity);

    world
        .get_component_mut::<PhysicsBody>(entity)
        .unwrap()
        .set_shape(ShapeDescriptor::sphere(2.0));
    sync.update(&mut world, DT);
    assert!(!world.get_component::<PhysicsBody>(entity).unwrap().is_bound());
    assert_eq!(sync.body_count(), 0);

    sync.update(&mut world, DT);
    let second = handle_of(&world, entity);
    assert_ne!(first, second);
    assert_eq!(sync.body_count(), 1);
}

#[test]
fn test_rebuilding_resting_body_ends_then_begins_contact() {
    let (mut world, mut sync) = setup();
    let ground = spawn_ground(&mut world);
    let ball = spawn(
        &mut world,
        Vec3::new(0.0, 1.0, 0.0),
        PhysicsBody::dynamic(ShapeDescriptor::sphere(0.5))
            .with_material(PhysicsMaterial::default().with_sleep(false)),
    );
    for _ in 0..60 {
        sync.update(&mut world, DT);
        sync.drain_contact_events(&world);
    }

    world
        .get_component_mut::<PhysicsBody>(ball)
        .unwrap()
        .set_shape(ShapeDescriptor::sphere(0.5));
    sync.update(&mut world, DT);
    let events = sync.drain_contact_events(&world);
    assert!(events.iter().any(|event| {
        event.kind == ContactKind::End && event.entity == ball && event.other == ground
    }));

    let mut begun = false;
    for _ in 0..30 {
        sync.update(&mut world, DT);
        if sync
            .drain_contact_events(&world)
            .iter()
            .any(|event| event.kind == ContactKind::Begin && event.entity == ball)
        {
            begun = true;
            break;
        }
    }
    assert!(begun, "rebuilt ball never touched the ground again");
}

#[test]
fn test_replacing_component_removes_old_body() {
    let (mut world, mut sync) = setup();
    let entity = spawn_ground(&mut world);
    sync.update(&mut world, DT);

    world.add_component(entity, PhysicsBody::fixed(ShapeDescriptor::sphere(1.0)));
    sync.update(&mut world, DT);

    assert_eq!(sync.body_count(), 1);
    assert!(world.get_component::<PhysicsBody>(entity).unwrap().is_bound());
}

#[test]
fn test_parallel_pull_matches_sequential() {
    let run = |threshold: usize| {
        let config = PhysicsConfig::default().with_parallel_pull_threshold(threshold);
        let (mut world, mut sync) = setup_with(&config);
        spawn_ground(&mut world);
        let balls: Vec<Entity> = (0..6u8)
            .map(|i| {
                let x = f32::from(i) * 1.5 - 4.0;
                spawn(
                    &mut world,
                    Vec3::new(x, 2.0 + f32::from(i), 0.0),
                    PhysicsBody::dynamic(ShapeDescriptor::sphere(0.5)),
                )
            })
            .collect();
        for _ in 0..40 {
            sync.update(&mut world, DT);
        }
        balls
            .iter()
            .map(|ball| world.world_position(*ball).unwrap())
            .collect::<Vec<_>>()
    };

    let parallel = run(0);
    let sequential = run(usize::MAX);
    for (a, b) in parallel.iter().zip(&sequential) {
        assert_relative_eq!(a, b, epsilon = 1e-5);
    }
}

#[test]
fn test_pull_converts_to_parent_space() {
    let (mut world, mut sync) = setup_with(&PhysicsConfig::default().with_gravity(Vec3::zeros()));
    let parent = world.create_entity();
    world.add_component(
        parent,
        TransformComponent::from_position(Vec3::new(10.0, 0.0, 0.0)),
    );
    let child = spawn(
        &mut world,
        Vec3::new(1.0, 0.0, 0.0),
        PhysicsBody::dynamic(ShapeDescriptor::sphere(0.5)),
    );
    world.set_parent(child, Some(parent)).unwrap();
    sync.update(&mut world, DT);

    assert!(sync.set_linear_velocity(&world, child, Vec3::new(0.0, 6.0, 0.0)));
    for _ in 0..10 {
        sync.update(&mut world, DT);
    }

    let world_position = world.world_position(child).unwrap();
    let local = world
        .get_component::<TransformComponent>(child)
        .unwrap()
        .local_position();
    assert_relative_eq!(world_position.x, 11.0, epsilon = EPSILON);
    assert!(world_position.y > 0.5);
    assert_relative_eq!(local, world_position - Vec3::new(10.0, 0.0, 0.0), epsilon = EPSILON);
}

#[test]
fn test_impulse_and_velocity() {
    let (mut world, mut sync) = setup_with(&PhysicsConfig::default().with_gravity(Vec3::zeros()));
    let entity = spawn(
        &mut world,
        Vec3::zeros(),
        PhysicsBody::dynamic(ShapeDescriptor::sphere(0.5)),
    );
    assert!(!sync.apply_impulse(&world, entity, Vec3::x()));
    sync.update(&mut world, DT);

    assert!(sync.apply_impulse(&world, entity, Vec3::new(2.0, 0.0, 0.0)));
    let velocity = sync.linear_velocity(&world, entity).unwrap();
    assert!(velocity.x > 1.0);

    sync.update(&mut world, DT);
    assert!(world.world_position(entity).unwrap().x > 0.0);
}

#[test]
fn test_sensor_reports_overlap() {
    let (mut world, mut sync) = setup_with(&PhysicsConfig::default().with_gravity(Vec3::zeros()));
    let sensor = spawn(
        &mut world,
        Vec3::zeros(),
        PhysicsBody::sensor(ShapeDescriptor::cuboid(Vec3::new(2.0, 2.0, 2.0))),
    );
    let visitor = spawn(
        &mut world,
        Vec3::new(0.5, 0.0, 0.0),
        PhysicsBody::dynamic(ShapeDescriptor::sphere(0.5)),
    );

    let mut overlapped = false;
    for _ in 0..5 {
        sync.update(&mut world, DT);
        overlapped |= sync
            .drain_contact_events(&world)
            .iter()
            .any(|event| event.entity == sensor && event.other == visitor);
    }
    assert!(overlapped);
    assert_eq!(
        world.get_component::<PhysicsBody>(sensor).unwrap().motion(),
        MotionKind::Sensor
    );
}

#[test]
fn test_mesh_colliders() {
    let (mut world, mut sync) = setup();
    let floor = ShapeDescriptor::TriangleMesh {
        vertices: vec![
            Vec3::new(-5.0, 0.0, -5.0),
            Vec3::new(5.0, 0.0, -5.0),
            Vec3::new(5.0, 0.0, 5.0),
            Vec3::new(-5.0, 0.0, 5.0),
        ],
        indices: vec![[0, 2, 1], [0, 3, 2]],
    };
    spawn(&mut world, Vec3::zeros(), PhysicsBody::fixed(floor));

    let crate_mesh = ShapeDescriptor::TriangleMesh {
        vertices: cube_corners(),
        indices: vec![[0, 1, 2], [1, 3, 2], [4, 6, 5], [5, 6, 7]],
    };
    let falling = spawn(
        &mut world,
        Vec3::new(0.0, 3.0, 0.0),
        PhysicsBody::dynamic(crate_mesh),
    );
    sync.update(&mut world, DT);
    assert!(world.get_component::<PhysicsBody>(falling).unwrap().is_bound());
    assert_eq!(sync.body_count(), 2);

    let mut lines = DebugLines::default();
    sync.debug_draw(&mut lines);
    assert!(!lines.lines.is_empty());
    assert_eq!(lines.triangles.len(), 2);
}

#[test]
fn test_character_lands_and_moves() {
    let (mut world, mut sync) = setup();
    spawn_ground(&mut world);
    let player = world.create_entity();
    world.add_component(
        player,
        TransformComponent::from_position(Vec3::new(0.0, 3.0, 0.0)),
    );
    world.add_component(player, CharacterController::new(0.5, 0.3));

    for _ in 0..120 {
        sync.update(&mut world, DT);
    }
    let character = world.get_component::<CharacterController>(player).unwrap();
    assert!(character.is_grounded());
    assert!(character.handle().is_some());
    let landed = world.world_position(player).unwrap();
    assert!(landed.y > 0.5 && landed.y < 2.0, "y = {}", landed.y);

    for _ in 0..30 {
        world
            .get_component_mut::<CharacterController>(player)
            .unwrap()
            .add_movement_input(Vec3::new(2.0, 0.0, 0.0));
        sync.update(&mut world, DT);
    }
    let moved = world.world_position(player).unwrap();
    assert!(moved.x > 0.5, "x = {}", moved.x);
    assert_relative_eq!(moved.y, landed.y, epsilon = 0.05);
    assert_relative_eq!(
        world
            .get_component::<CharacterController>(player)
            .unwrap()
            .movement_input(),
        Vec3::zeros()
    );
}
