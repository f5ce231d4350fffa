//! Background music with eased fades.
//!
//! The player owns one looping element and at most one fade. Fades are
//! sampled on `tick()` against the timestamp they started at, so a slow
//! caller only makes the curve coarser, never longer.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::config::MusicConfig;
use crate::error::AudioError;
use crate::events::Event;

/// Host capability for the looping track.
pub trait MusicElement {
    /// Start or resume playback. May be refused by autoplay policy.
    fn play(&mut self) -> Result<(), AudioError>;
    fn pause(&mut self);
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
    fn is_paused(&self) -> bool;
}

/// `p²(3 − 2p)` on a clamped progress.
pub fn smoothstep(p: f32) -> f32 {
    let p = p.clamp(0.0, 1.0);
    p * p * (3.0 - 2.0 * p)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fade {
    from: f32,
    to: f32,
    started_at_ms: u64,
    duration_ms: u64,
}

impl Fade {
    fn progress(&self, now_ms: u64) -> f32 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        now_ms.saturating_sub(self.started_at_ms) as f32 / self.duration_ms as f32
    }

    fn volume_at(&self, now_ms: u64) -> f32 {
        self.from + (self.to - self.from) * smoothstep(self.progress(now_ms))
    }
}

pub struct MusicPlayer {
    element: Box<dyn MusicElement>,
    config: MusicConfig,
    fade: Option<Fade>,
    pending_stop_ms: Option<u64>,
    playing: bool,
}

impl MusicPlayer {
    pub fn new(element: Box<dyn MusicElement>, config: MusicConfig) -> Self {
        Self {
            element,
            config,
            fade: None,
            pending_stop_ms: None,
            playing: false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn volume(&self) -> f32 {
        self.element.volume()
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Start playback and fade in to the target volume.
    ///
    /// If the element refuses to play, nothing changes (a pending stop
    /// still comes due) and `MusicBlocked` is returned. Otherwise a pending
    /// stop is cancelled and a paused element restarts from silence.
    pub fn play(&mut self, now_ms: u64) -> Event {
        let was_paused = self.element.is_paused();
        if let Err(e) = self.element.play() {
            debug!(error = %e, "music play rejected");
            return Event::MusicBlocked { at_ms: now_ms };
        }
        self.pending_stop_ms = None;
        if was_paused {
            self.element.set_volume(0.0);
        }
        self.playing = true;
        self.fade_to(self.config.target_volume, self.config.fade_in_ms, now_ms);
        Event::MusicStarted {
            target_volume: self.config.target_volume,
            at_ms: now_ms,
        }
    }

    /// Fade out and pause once the stop grace has elapsed.
    pub fn pause(&mut self, now_ms: u64) -> Event {
        self.playing = false;
        self.fade_to(0.0, self.config.fade_out_ms, now_ms);
        self.pending_stop_ms = Some(now_ms.saturating_add(self.config.stop_grace_ms));
        Event::MusicPausing { at_ms: now_ms }
    }

    pub fn toggle(&mut self, now_ms: u64) -> Event {
        if self.playing {
            self.pause(now_ms)
        } else {
            self.play(now_ms)
        }
    }

    /// Advance the fade and the pending stop.
    pub fn tick(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = Vec::new();

        if let Some(fade) = self.fade {
            self.element.set_volume(fade.volume_at(now_ms).clamp(0.0, 1.0));
            if fade.progress(now_ms) >= 1.0 {
                self.fade = None;
            }
        }

        // A stop that comes due while the volume is still audible waits for
        // the fade instead of cutting the track.
        if let Some(due) = self.pending_stop_ms {
            if now_ms >= due && self.element.volume() <= self.config.stop_threshold {
                self.pending_stop_ms = None;
                self.element.pause();
                events.push(Event::MusicStopped { at_ms: now_ms });
            }
        }
        events
    }

    /// Silence immediately, dropping any fade and pending stop.
    pub fn stop(&mut self) {
        self.fade = None;
        self.pending_stop_ms = None;
        self.playing = false;
        self.element.set_volume(0.0);
        self.element.pause();
    }

    /// Replaces any running fade.
    fn fade_to(&mut self, target: f32, duration_ms: u64, now_ms: u64) {
        self.fade = Some(Fade {
            from: self.element.volume(),
            to: target,
            started_at_ms: now_ms,
            duration_ms,
        });
    }
}

impl std::fmt::Debug for MusicPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MusicPlayer")
            .field("config", &self.config)
            .field("fade", &self.fade)
            .field("pending_stop_ms", &self.pending_stop_ms)
            .field("playing", &self.playing)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
struct ElementState {
    volume: f32,
    paused: bool,
    autoplay_allowed: bool,
    play_calls: u32,
    pause_calls: u32,
}

/// In-memory element. Clones share state so a test can keep a handle
/// after boxing one into the player.
#[derive(Debug, Clone)]
pub struct SimulatedElement {
    state: Rc<RefCell<ElementState>>,
}

impl SimulatedElement {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(ElementState {
                volume: 1.0,
                paused: true,
                autoplay_allowed: true,
                play_calls: 0,
                pause_calls: 0,
            })),
        }
    }

    /// Element that rejects `play()` until [`allow_autoplay`](Self::allow_autoplay).
    pub fn blocked() -> Self {
        let element = Self::new();
        element.state.borrow_mut().autoplay_allowed = false;
        element
    }

    pub fn allow_autoplay(&self) {
        self.state.borrow_mut().autoplay_allowed = true;
    }

    pub fn block_autoplay(&self) {
        self.state.borrow_mut().autoplay_allowed = false;
    }

    pub fn play_calls(&self) -> u32 {
        self.state.borrow().play_calls
    }

    pub fn pause_calls(&self) -> u32 {
        self.state.borrow().pause_calls
    }
}

impl Default for SimulatedElement {
    fn default() -> Self {
        Self::new()
    }
}

impl MusicElement for SimulatedElement {
    fn play(&mut self) -> Result<(), AudioError> {
        let mut state = self.state.borrow_mut();
        state.play_calls += 1;
        if !state.autoplay_allowed {
            return Err(AudioError::AutoplayRejected);
        }
        state.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        let mut state = self.state.borrow_mut();
        state.pause_calls += 1;
        state.paused = true;
    }

    fn volume(&self) -> f32 {
        self.state.borrow().volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.borrow_mut().volume = volume;
    }

    fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }
}
