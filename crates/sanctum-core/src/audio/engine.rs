use rand::SeedableRng;
use rand_pcg::Pcg64;
use tracing::debug;

use super::cue::CueKind;
use super::output::Haptics;
use super::session::AudioSession;
use super::synth::{CueBuffer, Synth};
use crate::config::RevealConfig;
use crate::error::AudioError;

/// Renders cues and hands them to the session's output.
///
/// Playback never fails from the caller's point of view: every audio error
/// is logged at debug level and dropped.
pub struct SoundEngine {
    synth: Synth,
    haptics: Option<Box<dyn Haptics>>,
    intensity: u32,
    glass_clip: Option<(String, f32)>,
    master_gain: f32,
}

impl SoundEngine {
    pub fn new(config: &RevealConfig, haptics: Option<Box<dyn Haptics>>) -> Self {
        let rng = match config.audio.seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None => Pcg64::from_entropy(),
        };
        Self {
            synth: Synth::new(config.audio.sample_rate, rng),
            haptics,
            intensity: 0,
            glass_clip: config
                .assets
                .glass_clip_url
                .clone()
                .map(|url| (url, config.audio.glass_clip_volume)),
            master_gain: config.audio.master_gain,
        }
    }

    pub fn intensity(&self) -> u32 {
        self.intensity
    }

    /// Cheers intensity; detunes the next glass clinks.
    pub fn set_intensity(&mut self, level: u32) {
        self.intensity = level;
    }

    /// Render a cue without playing it.
    pub fn render(&mut self, kind: CueKind) -> CueBuffer {
        let layers = kind.layers(self.intensity, self.synth.rng_mut());
        let mut buffer = self.synth.render(&layers);
        if self.master_gain != 1.0 {
            buffer.scale(self.master_gain);
        }
        buffer
    }

    /// Play a cue and its haptic pattern. Returns whether any sound was
    /// produced.
    pub fn play_cue(&mut self, session: &mut AudioSession, kind: CueKind) -> bool {
        if let (Some(haptics), Some(pattern)) = (self.haptics.as_mut(), kind.haptic_pattern()) {
            haptics.vibrate(pattern);
        }
        match self.try_play(session, kind) {
            Ok(()) => true,
            Err(e) => {
                debug!(cue = %kind, error = %e, "cue dropped");
                false
            }
        }
    }

    fn try_play(&mut self, session: &mut AudioSession, kind: CueKind) -> Result<(), AudioError> {
        if kind == CueKind::GlassClink {
            if let Some((url, volume)) = &self.glass_clip {
                match session.play_clip(url, *volume) {
                    Ok(()) => return Ok(()),
                    Err(e) => debug!(error = %e, "glass clip failed, synthesizing"),
                }
            }
        }
        let buffer = self.render(kind);
        session.submit(buffer)
    }
}

impl std::fmt::Debug for SoundEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundEngine")
            .field("sample_rate", &self.synth.sample_rate())
            .field("intensity", &self.intensity)
            .field("glass_clip", &self.glass_clip)
            .field("master_gain", &self.master_gain)
            .finish_non_exhaustive()
    }
}
