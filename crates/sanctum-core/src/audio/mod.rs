//! Sound: synthesized cues, the cue output, and background music.

mod cue;
mod engine;
mod music;
mod output;
mod session;
pub mod synth;

pub use cue::CueKind;
pub use engine::SoundEngine;
pub use music::{smoothstep, MusicElement, MusicPlayer, SimulatedElement};
pub use output::{CaptureOutput, ContextState, CueOutput, Haptics, RecordingHaptics};
pub use session::{AudioSession, AudioStatus};
pub use synth::CueBuffer;
