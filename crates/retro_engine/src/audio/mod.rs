//! Audio system
//!
//! Spatializes [`AudioSourceComponent`]s against a listener entity once per
//! frame and forwards the resulting gains to an [`AudioBackend`].

pub mod backend;
pub mod spatial;

use log::{debug, warn};
use thiserror::Error;

pub use backend::{AudioBackend, SilentBackend};
pub use spatial::linear_attenuation;

use crate::core::AudioConfig;
use crate::ecs::components::{AudioSourceComponent, TransformComponent};
use crate::ecs::{Entity, World};
use crate::foundation::math::Vec3;

/// Backend voice identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(pub u32);

/// Audio errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// The backend does not know the clip
    #[error("Unknown audio clip: '{0}'")]
    UnknownClip(String),

    /// The voice is not playing
    #[error("Invalid voice: {0:?}")]
    InvalidVoice(VoiceId),

    /// Device-level failure
    #[error("Audio backend error: {0}")]
    Backend(String),
}

/// Voices whose source component went away, stopped on the next update
#[derive(Debug, Default)]
struct OrphanedVoices(Vec<VoiceId>);

fn orphan_voice(world: &mut World, entity: Entity) {
    let voice = world
        .get_component::<AudioSourceComponent>(entity)
        .and_then(AudioSourceComponent::voice);
    if let Some(voice) = voice {
        world.resource_or_default::<OrphanedVoices>().0.push(voice);
    }
}

/// Drives audio sources from world transforms
pub struct AudioSystem {
    backend: Box<dyn AudioBackend>,
    master_volume: f32,
    default_max_distance: f32,
}

impl AudioSystem {
    /// Create the system and register its destroy hook on `world`
    pub fn new(config: &AudioConfig, backend: Box<dyn AudioBackend>, world: &mut World) -> Self {
        world.on_destroy::<AudioSourceComponent>(orphan_voice);
        world.on_replace::<AudioSourceComponent>(orphan_voice);
        world.insert_resource(OrphanedVoices::default());
        Self {
            backend,
            master_volume: config.master_volume,
            default_max_distance: config.default_max_distance,
        }
    }

    /// Silent system for headless runs
    pub fn silent(config: &AudioConfig, world: &mut World) -> Self {
        Self::new(config, Box::new(SilentBackend::new()), world)
    }

    /// Swap the playback backend. Voices of the old backend are forgotten.
    pub fn set_backend(&mut self, backend: Box<dyn AudioBackend>, world: &mut World) {
        self.backend = backend;
        for (_, source) in world.query_mut::<AudioSourceComponent>() {
            source.set_voice(None);
        }
    }

    /// Master volume, 0 to 1
    #[must_use]
    pub const fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Set the master volume, clamped to 0..1
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
    }

    /// Recompute every source gain relative to `listener` (the origin when
    /// `None`) and start or update backend voices
    pub fn update(&mut self, world: &mut World, listener: Option<Entity>) {
        if let Some(orphaned) = world.resource_mut::<OrphanedVoices>() {
            for voice in std::mem::take(&mut orphaned.0) {
                self.backend.stop(voice);
            }
        }

        let listener_position = listener
            .and_then(|listener| world.world_position(listener))
            .unwrap_or_else(Vec3::zeros);

        for entity in world.view::<(AudioSourceComponent, TransformComponent)>() {
            let Some(position) = world.world_position(entity) else {
                continue;
            };
            let Some(source) = world.get_component_mut::<AudioSourceComponent>(entity) else {
                continue;
            };

            let attenuation = if source.spatial {
                let max_distance = source.max_distance.unwrap_or(self.default_max_distance);
                linear_attenuation((position - listener_position).norm(), max_distance)
            } else {
                1.0
            };
            let gain = source.volume * attenuation * self.master_volume;
            source.set_gain(gain);

            match source.voice() {
                Some(voice) if self.backend.is_playing(voice) => {
                    if let Err(err) = self.backend.set_gain(voice, gain) {
                        warn!("Failed to update gain of {entity:?}: {err}");
                    }
                }
                Some(_) => {}
                None => match self.backend.play(&source.clip, gain, source.looping) {
                    Ok(voice) => {
                        debug!("Playing '{}' for {entity:?}", source.clip);
                        source.set_voice(Some(voice));
                    }
                    Err(err) => {
                        warn!("Failed to play '{}' for {entity:?}: {err}", source.clip);
                        source.set_voice(None);
                    }
                },
            }
        }
    }
}
