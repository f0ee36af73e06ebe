//! Audio source component

use crate::audio::VoiceId;
use crate::ecs::Component;

/// A sound emitted from an entity's world position
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSourceComponent {
    /// Clip identifier understood by the audio backend
    pub clip: String,
    /// Volume at the source, 0 to 1
    pub volume: f32,
    /// Distance at which the source becomes silent; `None` uses the configured default
    pub max_distance: Option<f32>,
    /// Non-spatial sources ignore distance (music, UI)
    pub spatial: bool,
    /// Whether the clip restarts when it ends
    pub looping: bool,
    voice: Option<VoiceId>,
    gain: f32,
}

impl Component for AudioSourceComponent {}

impl AudioSourceComponent {
    /// Create a spatial source
    pub fn new(clip: impl Into<String>, volume: f32) -> Self {
        Self {
            clip: clip.into(),
            volume,
            max_distance: None,
            spatial: true,
            looping: false,
            voice: None,
            gain: 0.0,
        }
    }

    /// Builder pattern: Set the audible radius
    #[must_use]
    pub const fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = Some(max_distance);
        self
    }

    /// Builder pattern: Make the source ignore distance
    #[must_use]
    pub const fn non_spatial(mut self) -> Self {
        self.spatial = false;
        self
    }

    /// Builder pattern: Loop the clip
    #[must_use]
    pub const fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    /// Gain computed by the last audio update
    #[must_use]
    pub const fn gain(&self) -> f32 {
        self.gain
    }

    /// Backend voice playing this source, if started
    #[must_use]
    pub const fn voice(&self) -> Option<VoiceId> {
        self.voice
    }

    pub(crate) fn set_voice(&mut self, voice: Option<VoiceId>) {
        self.voice = voice;
    }

    pub(crate) fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }
}
