//! Audio backend abstraction
//!
//! The engine decides what plays and how loud; a backend turns that into
//! sound. Decoding and mixing live entirely behind this trait.

use std::collections::HashMap;

use super::{AudioError, VoiceId};

/// Playback device
pub trait AudioBackend {
    /// Start a clip at the given gain
    fn play(&mut self, clip: &str, gain: f32, looping: bool) -> Result<VoiceId, AudioError>;

    /// Change the gain of a playing voice
    fn set_gain(&mut self, voice: VoiceId, gain: f32) -> Result<(), AudioError>;

    /// Stop a voice. Unknown voices are ignored.
    fn stop(&mut self, voice: VoiceId);

    /// Whether a voice is still audible
    fn is_playing(&self, voice: VoiceId) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
struct SilentVoice {
    clip: String,
    gain: f32,
    looping: bool,
}

/// Backend that plays nothing but keeps voice bookkeeping, for headless runs
#[derive(Debug, Default)]
pub struct SilentBackend {
    voices: HashMap<VoiceId, SilentVoice>,
    next_voice: u32,
}

impl SilentBackend {
    /// Create a backend with no voices
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of voices currently playing
    #[must_use]
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Gain last assigned to a voice
    #[must_use]
    pub fn gain(&self, voice: VoiceId) -> Option<f32> {
        self.voices.get(&voice).map(|v| v.gain)
    }

    /// Clip a voice is playing
    #[must_use]
    pub fn clip(&self, voice: VoiceId) -> Option<&str> {
        self.voices.get(&voice).map(|v| v.clip.as_str())
    }

    /// Whether a voice was started looping
    #[must_use]
    pub fn is_looping(&self, voice: VoiceId) -> bool {
        self.voices.get(&voice).is_some_and(|v| v.looping)
    }
}

impl AudioBackend for SilentBackend {
    fn play(&mut self, clip: &str, gain: f32, looping: bool) -> Result<VoiceId, AudioError> {
        if clip.is_empty() {
            return Err(AudioError::UnknownClip(clip.to_string()));
        }
        let voice = VoiceId(self.next_voice);
        self.next_voice = self.next_voice.wrapping_add(1);
        self.voices.insert(
            voice,
            SilentVoice {
                clip: clip.to_string(),
                gain,
                looping,
            },
        );
        Ok(voice)
    }

    fn set_gain(&mut self, voice: VoiceId, gain: f32) -> Result<(), AudioError> {
        let slot = self
            .voices
            .get_mut(&voice)
            .ok_or(AudioError::InvalidVoice(voice))?;
        slot.gain = gain;
        Ok(())
    }

    fn stop(&mut self, voice: VoiceId) {
        self.voices.remove(&voice);
    }

    fn is_playing(&self, voice: VoiceId) -> bool {
        self.voices.contains_key(&voice)
    }
}
