use serde::{Deserialize, Serialize};
use tracing::debug;

use super::music::MusicPlayer;
use super::output::{ContextState, CueOutput};
use super::synth::CueBuffer;
use crate::error::AudioError;

/// Snapshot of the audio side of a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioStatus {
    pub cue_context: ContextState,
    pub music_playing: bool,
    pub music_volume: f32,
}

/// The cue output plus the music player, created lazily and disposed once.
pub struct AudioSession {
    output: Box<dyn CueOutput>,
    context: ContextState,
    sample_rate: u32,
    music: MusicPlayer,
}

impl AudioSession {
    pub fn new(output: Box<dyn CueOutput>, music: MusicPlayer, sample_rate: u32) -> Self {
        Self {
            output,
            context: ContextState::Uninitialized,
            sample_rate,
            music,
        }
    }

    pub fn context_state(&self) -> ContextState {
        self.context
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Open the cue output on first use and resume it when suspended.
    ///
    /// Idempotent. A failed open leaves the context uninitialized so the
    /// next cue tries again.
    pub fn get_or_create_context(&mut self) -> Result<ContextState, AudioError> {
        if self.context == ContextState::Uninitialized {
            self.context = self.output.open(self.sample_rate)?;
            debug!(state = ?self.context, "cue context opened");
        }
        match self.context {
            ContextState::Closed => Err(AudioError::ContextClosed),
            ContextState::Suspended => {
                self.context = self.output.resume()?;
                Ok(self.context)
            }
            state => Ok(state),
        }
    }

    pub fn submit(&mut self, buffer: CueBuffer) -> Result<(), AudioError> {
        match self.get_or_create_context()? {
            ContextState::Running => self.output.submit(buffer),
            _ => Err(AudioError::Suspended),
        }
    }

    pub fn play_clip(&mut self, url: &str, volume: f32) -> Result<(), AudioError> {
        self.get_or_create_context()?;
        self.output.play_clip(url, volume)
    }

    pub fn music(&self) -> &MusicPlayer {
        &self.music
    }

    pub fn music_mut(&mut self) -> &mut MusicPlayer {
        &mut self.music
    }

    /// Stop the music and close the cue output. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.music.stop();
        if self.context != ContextState::Closed {
            if self.context != ContextState::Uninitialized {
                self.output.close();
            }
            self.context = ContextState::Closed;
        }
    }

    pub fn status(&self) -> AudioStatus {
        AudioStatus {
            cue_context: self.context,
            music_playing: self.music.is_playing(),
            music_volume: self.music.volume(),
        }
    }
}

impl std::fmt::Debug for AudioSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioSession")
            .field("context", &self.context)
            .field("sample_rate", &self.sample_rate)
            .field("music", &self.music)
            .finish_non_exhaustive()
    }
}
