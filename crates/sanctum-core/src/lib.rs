//! # Sanctum Core Library
//!
//! This library provides the core logic behind the Sanctum gift reveal: a
//! vault door swings open, a confidential folder unfolds, the photo is
//! revealed, and the guest may toast it or close the case and watch it
//! self-destruct.
//!
//! ## Architecture
//!
//! - **Reveal Timeline**: A timestamp-driven state machine. Nothing runs on
//!   its own; the caller passes the current monotonic time to `tick()` and
//!   receives the [`Event`]s that became due.
//! - **Sound Engine**: Procedural cue synthesis (oscillators, noise, biquad
//!   filters, gain envelopes) rendered to PCM and handed to a [`CueOutput`].
//! - **Music Player**: One looping track with smoothstep fades, independent
//!   of the cue output.
//! - **Session**: [`RevealSession`] wires the timeline to the sound engine,
//!   the music player and the host's [`EffectsSink`].
//!
//! ## Key Components
//!
//! - [`RevealTimeline`]: Phase sequencer, cheers easter egg, self-destruct
//! - [`SoundEngine`]: Cue rendering and playback
//! - [`MusicPlayer`]: Background music with eased fades
//! - [`RevealConfig`]: TOML configuration (assets, timing, messages)

pub mod audio;
pub mod clock;
pub mod config;
pub mod effects;
pub mod error;
pub mod events;
pub mod session;
pub mod timeline;

pub use audio::{
    AudioSession, AudioStatus, CaptureOutput, ContextState, CueBuffer, CueKind, CueOutput,
    Haptics, MusicElement, MusicPlayer, RecordingHaptics, SimulatedElement, SoundEngine,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::RevealConfig;
pub use effects::{Effect, EffectsSink, ParticleKind, Point, PulseTarget, RecordingSink, VisualFlag};
pub use error::{AudioError, ConfigError, CoreError, ScheduleError, TimelineError};
pub use events::Event;
pub use session::{Collaborators, RevealSession, SessionStatus};
pub use timeline::{
    Action, CheersState, CountdownState, Gesture, Phase, RevealTimeline, TimelineSchedule,
};
