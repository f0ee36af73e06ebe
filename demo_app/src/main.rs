//! Crate drop demo: a stack of boxes falls onto a floor while a character
//! walks around and a satellite orbits a spinning pylon.
//!
//! Runs headless for a fixed number of frames unless built with the
//! `window` feature.

use rand::Rng;
use retro_engine::foundation::logging;
use retro_engine::prelude::*;

const STACK_HEIGHT: usize = 8;
const CRATE_HALF_EXTENT: f32 = 0.5;
const MAX_CRATE_JITTER: f32 = 0.1;
const PYLON_SPIN_DEGREES_PER_SECOND: f32 = 45.0;
const SATELLITE_ORBIT_RADIUS: f32 = 3.0;
const WALK_SPEED: f32 = 3.0;
const JUMP_SPEED: f32 = 5.0;
#[cfg(not(feature = "window"))]
const HEADLESS_FRAMES: u64 = 600;
const CONFIG_PATH: &str = "crate_drop.toml";

const FLOOR_MESH: u32 = 0;
const CRATE_MESH: u32 = 1;
const PYLON_MESH: u32 = 2;

#[derive(thiserror::Error, Debug)]
enum DemoError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Config(#[from] retro_engine::config::ConfigError),
    #[cfg(feature = "window")]
    #[error(transparent)]
    Platform(#[from] retro_engine::platform::PlatformError),
}

#[derive(Default)]
struct CrateDrop {
    crates: Vec<Entity>,
    pylon: Option<Entity>,
    satellite: Option<Entity>,
    player: Option<Entity>,
    landed: usize,
    elapsed: f32,
}

impl CrateDrop {
    fn spawn_floor(world: &mut World) {
        let floor = world.create_entity();
        world.add_component(floor, TransformComponent::identity());
        world.add_component(
            floor,
            PhysicsBody::fixed(ShapeDescriptor::cuboid(Vec3::new(20.0, 0.5, 20.0)))
                .with_material(PhysicsMaterial::default().with_restitution(0.1)),
        );
        world.add_component(floor, MeshComponent::new(FLOOR_MESH, 30.0));
    }

    fn spawn_stack(&mut self, world: &mut World) {
        let mut rng = rand::thread_rng();
        for level in 0..STACK_HEIGHT {
            let jitter = Vec3::new(
                rng.gen_range(-MAX_CRATE_JITTER..MAX_CRATE_JITTER),
                0.0,
                rng.gen_range(-MAX_CRATE_JITTER..MAX_CRATE_JITTER),
            );
            let height = 2.0 + level as f32 * (CRATE_HALF_EXTENT * 2.0 + 0.05);

            let crate_entity = world.create_entity();
            world.add_component(
                crate_entity,
                TransformComponent::from_position(Vec3::new(4.0, height, 0.0) + jitter),
            );
            world.add_component(
                crate_entity,
                PhysicsBody::dynamic(ShapeDescriptor::cuboid(Vec3::repeat(CRATE_HALF_EXTENT)))
                    .with_contact_events(ContactEventMask::BEGIN),
            );
            world.add_component(
                crate_entity,
                MeshComponent::new(CRATE_MESH, CRATE_HALF_EXTENT * 1.8)
                    .with_color([0.8, 0.6, 0.3, 1.0]),
            );
            world.add_component(
                crate_entity,
                AudioSourceComponent::new("crate_hum", 0.5).with_max_distance(15.0),
            );
            self.crates.push(crate_entity);
        }
    }

    fn spawn_pylon(&mut self, world: &mut World) -> Result<(), AppError> {
        let pylon = world.create_entity();
        world.add_component(pylon, TransformComponent::from_position(Vec3::new(-4.0, 2.0, 0.0)));
        world.add_component(
            pylon,
            PhysicsBody::kinematic(ShapeDescriptor::cuboid(Vec3::new(0.3, 1.5, 0.3))),
        );
        world.add_component(pylon, MeshComponent::new(PYLON_MESH, 1.6));

        let satellite = world.create_entity();
        world.add_component(
            satellite,
            TransformComponent::from_position(Vec3::new(SATELLITE_ORBIT_RADIUS, 1.0, 0.0))
                .with_uniform_scale(0.5),
        );
        world.add_component(satellite, PhysicsBody::sensor(ShapeDescriptor::sphere(0.5)));
        world.add_component(satellite, MeshComponent::new(CRATE_MESH, 0.5));
        world.set_parent(satellite, Some(pylon))?;

        self.pylon = Some(pylon);
        self.satellite = Some(satellite);
        Ok(())
    }

    fn spawn_player(&mut self, world: &mut World) -> Result<(), AppError> {
        let player = world.create_entity();
        world.add_component(player, TransformComponent::from_position(Vec3::new(0.0, 3.0, 6.0)));
        world.add_component(player, CharacterController::new(0.5, 0.4));

        let camera = world.create_entity();
        world.add_component(
            camera,
            TransformComponent::from_position(Vec3::new(0.0, 1.5, 4.0))
                .with_rotation_euler(Vec3::new(-15.0, 0.0, 0.0)),
        );
        world.add_component(camera, CameraComponent::perspective(70.0, 0.1, 200.0));
        world.set_parent(camera, Some(player))?;

        self.player = Some(player);
        Ok(())
    }

    fn drive_player(&self, engine: &mut Engine) {
        let Some(player) = self.player else {
            return;
        };

        // Walk in a slow circle when nobody is at the keyboard.
        let mut axis = engine.input.movement_axis();
        if axis.norm_squared() < f32::EPSILON && !cfg!(feature = "window") {
            axis = Vec3::new(self.elapsed.cos(), 0.0, self.elapsed.sin());
        }
        let jump = engine.input.just_pressed(KeyCode::Space);

        if let Some(character) = engine.world.get_component_mut::<CharacterController>(player) {
            character.add_movement_input(axis * WALK_SPEED);
            if jump && character.is_grounded() {
                character.jump(JUMP_SPEED);
            }
        }
    }

    fn report_contacts(&mut self, engine: &mut Engine) {
        for event in engine.physics.drain_contact_events(&engine.world) {
            if event.kind == ContactKind::Begin && self.crates.contains(&event.entity) {
                self.landed += 1;
                log::debug!(
                    "{:?} touched {:?} at {:?} (restitution {:.2})",
                    event.entity,
                    event.other,
                    event.summary.position,
                    event.summary.restitution
                );
            }
        }
    }
}

impl Game for CrateDrop {
    fn begin_play(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        Self::spawn_floor(&mut engine.world);
        self.spawn_stack(&mut engine.world);
        self.spawn_pylon(&mut engine.world)?;
        self.spawn_player(&mut engine.world)?;
        engine.set_listener(self.player);

        log::info!(
            "Spawned {} entities, {} crates",
            engine.world.entity_count(),
            self.crates.len()
        );
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError> {
        self.elapsed += delta_time;

        if engine.input.just_pressed(KeyCode::Escape) {
            engine.request_exit();
        }

        if let Some(pylon) = self.pylon {
            if let Some(transform) = engine.world.get_component_mut::<TransformComponent>(pylon) {
                transform.add_yaw(PYLON_SPIN_DEGREES_PER_SECOND * delta_time);
            }
        }

        self.drive_player(engine);
        self.report_contacts(engine);

        if engine.frame_number() % 120 == 0 {
            if let Some(player) = self.player {
                let origin = engine.world.world_position(player).unwrap_or_else(Vec3::zeros);
                match engine.physics.raycast(origin, -Vec3::y(), 50.0) {
                    Some(hit) => log::info!(
                        "Ground below player at {:.2}m ({:?})",
                        hit.distance,
                        hit.entity
                    ),
                    None => log::info!("Nothing below player"),
                }
            }
            if let Some(satellite) = self.satellite {
                log::info!(
                    "Satellite at {:?}",
                    engine.world.world_position(satellite)
                );
            }
        }
        Ok(())
    }

    fn handle_event(&mut self, _engine: &mut Engine, event: &AppEvent) -> Result<(), AppError> {
        if let AppEvent::WindowResized { width, height } = event {
            log::info!("Window resized to {width}x{height}");
        }
        Ok(())
    }

    fn end_play(&mut self, engine: &mut Engine) {
        let resting = self
            .crates
            .iter()
            .filter_map(|crate_entity| engine.world.world_position(*crate_entity))
            .filter(|position| position.y < 2.0)
            .count();
        log::info!(
            "Finished after {:.1}s: {} crate contacts, {resting}/{} crates near the floor",
            engine.total_time(),
            self.landed,
            self.crates.len()
        );
    }
}

#[cfg(not(feature = "window"))]
fn create_engine(config: EngineConfig) -> Result<Engine, DemoError> {
    let platform =
        HeadlessPlatform::new(config.window.width, config.window.height).with_frame_limit(HEADLESS_FRAMES);
    Ok(Engine::new(config, Box::new(platform), Box::new(HeadlessRenderer::new()))?)
}

#[cfg(feature = "window")]
fn create_engine(config: EngineConfig) -> Result<Engine, DemoError> {
    let platform = retro_engine::platform::GlfwPlatform::new(&config.window)?;
    Ok(Engine::new(config, Box::new(platform), Box::new(HeadlessRenderer::new()))?)
}

fn main() -> Result<(), DemoError> {
    let config = EngineConfig::load_or_default(CONFIG_PATH)?;
    logging::init_with_level(&config.log_level);

    let mut engine = create_engine(config)?;
    let mut game = CrateDrop::default();
    engine.run(&mut game)?;
    Ok(())
}
