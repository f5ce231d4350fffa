//! Host facade.
//!
//! [`RevealSession`] owns the timeline, the sound engine, the audio session
//! and the host collaborators. Every operation reads the clock once, runs
//! the timeline, and routes the resulting events:
//!
//! - `CueRequested` to the sound engine
//! - `EffectRequested` to the effects sink
//! - `CheersRegistered` to the sound engine's intensity

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audio::{
    AudioSession, AudioStatus, ContextState, CueOutput, Haptics, MusicElement, MusicPlayer,
    SoundEngine,
};
use crate::clock::Clock;
use crate::config::RevealConfig;
use crate::effects::{self, EffectsSink};
use crate::error::{Result, TimelineError};
use crate::events::Event;
use crate::timeline::{CheersState, CountdownState, Gesture, Phase, RevealTimeline};

/// Everything the host provides.
pub struct Collaborators {
    pub clock: Box<dyn Clock>,
    pub output: Box<dyn CueOutput>,
    pub music: Box<dyn MusicElement>,
    pub haptics: Option<Box<dyn Haptics>>,
    pub effects: Box<dyn EffectsSink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub phase: Phase,
    pub active: bool,
    pub cheers: CheersState,
    pub countdown: CountdownState,
    pub audio: AudioStatus,
}

pub struct RevealSession {
    config: RevealConfig,
    clock: Box<dyn Clock>,
    timeline: RevealTimeline,
    engine: SoundEngine,
    audio: AudioSession,
    effects: Box<dyn EffectsSink>,
    active: bool,
    torn_down: bool,
}

impl RevealSession {
    /// Validate `config` and wire the collaborators together.
    pub fn new(config: RevealConfig, collaborators: Collaborators) -> Result<Self> {
        config.validate()?;
        let timeline = RevealTimeline::new(&config)?;
        let engine = SoundEngine::new(&config, collaborators.haptics);
        let music = MusicPlayer::new(collaborators.music, config.music.clone());
        let audio = AudioSession::new(collaborators.output, music, config.audio.sample_rate);
        Ok(Self {
            config,
            clock: collaborators.clock,
            timeline,
            engine,
            audio,
            effects: collaborators.effects,
            active: false,
            torn_down: false,
        })
    }

    pub fn config(&self) -> &RevealConfig {
        &self.config
    }

    pub fn timeline(&self) -> &RevealTimeline {
        &self.timeline
    }

    pub fn engine(&self) -> &SoundEngine {
        &self.engine
    }

    pub fn phase(&self) -> Phase {
        self.timeline.phase()
    }

    /// Start the timeline when the host becomes active.
    ///
    /// Activating an already started timeline is a no-op.
    pub fn activate(&mut self, is_active: bool) -> Vec<Event> {
        if !is_active || self.torn_down {
            return Vec::new();
        }
        self.active = true;
        let now = self.clock.now_ms();
        match self.timeline.start(now) {
            Ok(events) => {
                self.dispatch(&events);
                events
            }
            Err(TimelineError::AlreadyStarted) => {
                debug!("activate ignored, timeline already started");
                Vec::new()
            }
            Err(e) => {
                debug!(error = %e, "activate ignored");
                Vec::new()
            }
        }
    }

    /// Fire everything due on the timeline and the music fader.
    pub fn tick(&mut self) -> Vec<Event> {
        let now = self.clock.now_ms();
        let mut events = self.timeline.tick(now);
        if !self.torn_down {
            events.extend(self.audio.music_mut().tick(now));
        }
        self.dispatch(&events);
        events
    }

    pub fn cheers(&mut self, gesture: Gesture) -> Result<Vec<Event>> {
        let now = self.clock.now_ms();
        let events = self.timeline.trigger_cheers(gesture, now)?;
        self.dispatch(&events);
        Ok(events)
    }

    pub fn close_case(&mut self) -> Result<Vec<Event>> {
        let now = self.clock.now_ms();
        let events = self.timeline.trigger_case_closed(now)?;
        self.dispatch(&events);
        Ok(events)
    }

    /// Open or resume the cue output ahead of the first cue. Hosts call this
    /// from the first user gesture; cues still open it lazily otherwise.
    pub fn resume_audio(&mut self) -> Result<ContextState> {
        Ok(self.audio.get_or_create_context()?)
    }

    pub fn play_music(&mut self) -> Event {
        let now = self.clock.now_ms();
        self.audio.music_mut().play(now)
    }

    pub fn pause_music(&mut self) -> Event {
        let now = self.clock.now_ms();
        self.audio.music_mut().pause(now)
    }

    pub fn toggle_music(&mut self) -> Event {
        let now = self.clock.now_ms();
        self.audio.music_mut().toggle(now)
    }

    pub fn music_playing(&self) -> bool {
        self.audio.music().is_playing()
    }

    /// Discard all timeline state and build a fresh one from the same
    /// config. A session that was active starts the new timeline at once.
    pub fn restart(&mut self) -> Result<Vec<Event>> {
        self.timeline.teardown();
        self.timeline = RevealTimeline::new(&self.config)?;
        self.engine.set_intensity(0);
        if self.active && !self.torn_down {
            return Ok(self.activate(true));
        }
        Ok(Vec::new())
    }

    /// Cancel follow-ups, stop the sizzle and the music, close the output.
    /// Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.timeline.teardown();
        self.audio.dispose();
        debug!("session torn down");
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            phase: self.timeline.phase(),
            active: self.active,
            cheers: self.timeline.cheers(),
            countdown: self.timeline.countdown(),
            audio: self.audio.status(),
        }
    }

    fn dispatch(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::CueRequested { cue, .. } => {
                    self.engine.play_cue(&mut self.audio, *cue);
                }
                Event::EffectRequested { effect, .. } => {
                    effects::apply(self.effects.as_mut(), effect);
                }
                Event::CheersRegistered {
                    intensity_level, ..
                } => self.engine.set_intensity(*intensity_level),
                _ => {}
            }
        }
    }
}

impl std::fmt::Debug for RevealSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealSession")
            .field("timeline", &self.timeline)
            .field("engine", &self.engine)
            .field("audio", &self.audio)
            .field("active", &self.active)
            .field("torn_down", &self.torn_down)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{CaptureOutput, SimulatedElement};
    use crate::clock::ManualClock;
    use crate::effects::RecordingSink;
    use crate::error::{AudioError, CoreError};

    struct Rig {
        clock: ManualClock,
        output: CaptureOutput,
        sink: RecordingSink,
        session: RevealSession,
    }

    fn rig() -> Rig {
        rig_with_output(CaptureOutput::new())
    }

    fn rig_with_output(output: CaptureOutput) -> Rig {
        let mut config = RevealConfig::default();
        config.audio.sample_rate = 8_000;
        config.audio.seed = Some(1);
        config.cheers.seed = Some(1);
        config.assets.glass_clip_url = None;

        let clock = ManualClock::new();
        let sink = RecordingSink::new();
        let session = RevealSession::new(
            config,
            Collaborators {
                clock: Box::new(clock.clone()),
                output: Box::new(output.clone()),
                music: Box::new(SimulatedElement::new()),
                haptics: None,
                effects: Box::new(sink.clone()),
            },
        )
        .unwrap();
        Rig {
            clock,
            output,
            sink,
            session,
        }
    }

    #[test]
    fn inactive_host_does_not_start() {
        let mut r = rig();
        assert!(r.session.activate(false).is_empty());
        assert!(!r.session.timeline().is_started());
    }

    #[test]
    fn second_activation_is_a_no_op() {
        let mut r = rig();
        assert!(!r.session.activate(true).is_empty());
        r.clock.advance(500);
        assert!(r.session.activate(true).is_empty());
        assert_eq!(r.session.timeline().started_at_ms(), Some(0));
    }

    #[test]
    fn cues_reach_the_output_and_effects_the_sink() {
        let mut r = rig();
        r.session.activate(true);
        r.clock.advance(7_000);
        r.session.tick();
        assert_eq!(r.output.voices(), 5);
        assert_eq!(r.sink.len(), 3);
        assert_eq!(r.session.phase(), Phase::Revealed);
    }

    #[test]
    fn cheers_drive_engine_intensity() {
        let mut r = rig();
        r.session.activate(true);
        r.clock.set(7_000);
        r.session.tick();
        for _ in 0..4 {
            r.session.cheers(Gesture::default()).unwrap();
            r.clock.advance(5_000);
            r.session.tick();
        }
        assert_eq!(r.session.engine().intensity(), 2);
        assert_eq!(r.sink.toasts().len(), 4);
    }

    #[test]
    fn wrong_phase_operations_are_timeline_errors() {
        let mut r = rig();
        r.session.activate(true);
        let err = r.session.cheers(Gesture::default()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Timeline(TimelineError::InvalidPhase {
                expected: Phase::Revealed,
                actual: Phase::Door,
            })
        ));
        assert!(matches!(
            r.session.close_case(),
            Err(CoreError::Timeline(TimelineError::InvalidPhase { .. }))
        ));
    }

    #[test]
    fn resume_audio_reports_output_failures() {
        let output = CaptureOutput::suspended();
        output.refuse_resume();
        let mut r = rig_with_output(output.clone());
        assert!(matches!(
            r.session.resume_audio(),
            Err(CoreError::Audio(AudioError::Suspended))
        ));

        let mut ok = rig_with_output(CaptureOutput::suspended());
        assert_eq!(ok.session.resume_audio().unwrap(), ContextState::Running);
        assert_eq!(ok.session.status().audio.cue_context, ContextState::Running);
        assert_eq!(ok.output.resumes(), 1);
    }

    #[test]
    fn restart_discards_progress() {
        let mut r = rig();
        r.session.activate(true);
        r.clock.set(7_000);
        r.session.tick();
        r.session.cheers(Gesture::default()).unwrap();

        let events = r.session.restart().unwrap();
        assert_eq!(events.first(), Some(&Event::TimelineStarted { at_ms: 7_000 }));
        assert_eq!(r.session.phase(), Phase::Door);
        assert_eq!(r.session.status().cheers.count, 0);
        assert_eq!(r.session.engine().intensity(), 0);
    }

    #[test]
    fn music_toggles_through_session() {
        let mut r = rig();
        assert!(matches!(r.session.toggle_music(), Event::MusicStarted { .. }));
        assert!(r.session.music_playing());
        r.clock.advance(650);
        r.session.tick();
        assert!((r.session.status().audio.music_volume - 0.6).abs() < 1e-6);
        assert!(matches!(r.session.toggle_music(), Event::MusicPausing { .. }));
        assert!(!r.session.music_playing());
    }

    #[test]
    fn teardown_twice_is_safe() {
        let mut r = rig();
        r.session.activate(true);
        r.session.teardown();
        r.session.teardown();
        r.clock.advance(10_000);
        assert!(r.session.tick().is_empty());
        assert!(r.session.activate(true).is_empty());
    }
}
