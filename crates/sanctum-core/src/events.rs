use serde::{Deserialize, Serialize};

use crate::audio::CueKind;
use crate::effects::Effect;
use crate::timeline::Phase;

/// Every state change in the reveal produces an Event.
/// The session dispatches them; the CLI prints them.
///
/// `at_ms` is the monotonic timestamp the event became due, not the time
/// the caller happened to sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimelineStarted {
        at_ms: u64,
    },
    PhaseChanged {
        from: Phase,
        to: Phase,
        at_ms: u64,
    },
    CueRequested {
        cue: CueKind,
        at_ms: u64,
    },
    EffectRequested {
        effect: Effect,
        at_ms: u64,
    },
    /// A toast counted. The message is shown later with the impact.
    CheersRegistered {
        count: u32,
        intensity_level: u32,
        message: String,
        at_ms: u64,
    },
    /// Gesture arrived while the cool-down lock was held.
    CheersIgnored {
        count: u32,
        locked_for_ms: u64,
        at_ms: u64,
    },
    CountdownStarted {
        duration_ms: u64,
        at_ms: u64,
    },
    CountdownTick {
        second: u32,
        remaining_ms: f64,
        at_ms: u64,
    },
    Exploded {
        at_ms: u64,
    },
    SizzleStopped {
        at_ms: u64,
    },
    Terminated {
        at_ms: u64,
    },
    MusicStarted {
        target_volume: f32,
        at_ms: u64,
    },
    /// The element refused to play (autoplay policy).
    MusicBlocked {
        at_ms: u64,
    },
    MusicPausing {
        at_ms: u64,
    },
    /// Fade-out finished and the element was physically paused.
    MusicStopped {
        at_ms: u64,
    },
}

impl Event {
    pub fn at_ms(&self) -> u64 {
        match self {
            Event::TimelineStarted { at_ms }
            | Event::PhaseChanged { at_ms, .. }
            | Event::CueRequested { at_ms, .. }
            | Event::EffectRequested { at_ms, .. }
            | Event::CheersRegistered { at_ms, .. }
            | Event::CheersIgnored { at_ms, .. }
            | Event::CountdownStarted { at_ms, .. }
            | Event::CountdownTick { at_ms, .. }
            | Event::Exploded { at_ms }
            | Event::SizzleStopped { at_ms }
            | Event::Terminated { at_ms }
            | Event::MusicStarted { at_ms, .. }
            | Event::MusicBlocked { at_ms }
            | Event::MusicPausing { at_ms }
            | Event::MusicStopped { at_ms } => *at_ms,
        }
    }

    /// Variant name as serialized in the `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::TimelineStarted { .. } => "TimelineStarted",
            Event::PhaseChanged { .. } => "PhaseChanged",
            Event::CueRequested { .. } => "CueRequested",
            Event::EffectRequested { .. } => "EffectRequested",
            Event::CheersRegistered { .. } => "CheersRegistered",
            Event::CheersIgnored { .. } => "CheersIgnored",
            Event::CountdownStarted { .. } => "CountdownStarted",
            Event::CountdownTick { .. } => "CountdownTick",
            Event::Exploded { .. } => "Exploded",
            Event::SizzleStopped { .. } => "SizzleStopped",
            Event::Terminated { .. } => "Terminated",
            Event::MusicStarted { .. } => "MusicStarted",
            Event::MusicBlocked { .. } => "MusicBlocked",
            Event::MusicPausing { .. } => "MusicPausing",
            Event::MusicStopped { .. } => "MusicStopped",
        }
    }
}
