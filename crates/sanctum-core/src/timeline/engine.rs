//! Reveal timeline.
//!
//! A timestamp-driven state machine. It does not use internal threads or
//! timers: the caller passes the current monotonic time to every operation
//! and gets back the events that became due.
//!
//! ## State Transitions
//!
//! ```text
//! Door -> FolderClosed -> FolderOpening -> Revealed
//!                                            |
//!                          (close case)      v
//!                     CaseClosed -> SelfDestructing -> Terminated
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut timeline = RevealTimeline::new(&config)?;
//! timeline.start(clock.now_ms())?;
//! // In a loop:
//! for event in timeline.tick(clock.now_ms()) { /* dispatch */ }
//! ```

use std::collections::BTreeMap;
use std::f32::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::cheers::{double_vision, CheersState, CheersTracker};
use super::countdown::{CountdownSignal, CountdownState, SelfDestruct};
use super::phase::Phase;
use super::schedule::{Action, TimelineSchedule};
use crate::audio::CueKind;
use crate::config::{RevealConfig, TimingConfig};
use crate::effects::{Effect, ParticleKind, Point, PulseTarget, VisualFlag};
use crate::error::{ScheduleError, TimelineError};
use crate::events::Event;

/// A toast gesture on the revealed photo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Gesture {
    /// Where the pointer touched, if known. Toasts and refraction appear here.
    pub origin: Option<Point>,
}

impl Gesture {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            origin: Some(Point::new(x, y)),
        }
    }
}

#[derive(Debug, Clone)]
enum Pending {
    Run(Action),
    ArmSelfDestruct,
}

/// Phase sequencer, cheers easter egg and self-destruct.
#[derive(Debug, Clone)]
pub struct RevealTimeline {
    schedule: TimelineSchedule,
    timing: TimingConfig,
    phase: Phase,
    started_at_ms: Option<u64>,
    /// Follow-ups keyed by (due time, insertion order).
    queue: BTreeMap<(u64, u64), Pending>,
    next_seq: u64,
    cheers: CheersTracker,
    countdown: SelfDestruct,
    rng: Pcg64,
    torn_down: bool,
}

impl RevealTimeline {
    /// Build a timeline with the schedule resolved from `config.timing`.
    pub fn new(config: &RevealConfig) -> Result<Self, ScheduleError> {
        let schedule = TimelineSchedule::from_timing(&config.timing)?;
        Ok(Self::with_schedule(config, schedule))
    }

    pub fn with_schedule(config: &RevealConfig, schedule: TimelineSchedule) -> Self {
        let rng = match config.cheers.seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None => Pcg64::from_entropy(),
        };
        Self {
            schedule,
            timing: config.timing.clone(),
            phase: Phase::Door,
            started_at_ms: None,
            queue: BTreeMap::new(),
            next_seq: 0,
            cheers: CheersTracker::new(config.cheers.clone()),
            countdown: SelfDestruct::new(config.countdown.clone()),
            rng,
            torn_down: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn schedule(&self) -> &TimelineSchedule {
        &self.schedule
    }

    pub fn is_started(&self) -> bool {
        self.started_at_ms.is_some()
    }

    pub fn started_at_ms(&self) -> Option<u64> {
        self.started_at_ms
    }

    pub fn cheers(&self) -> CheersState {
        self.cheers.state()
    }

    pub fn cheers_locked(&self, now_ms: u64) -> bool {
        self.cheers.is_locked(now_ms)
    }

    pub fn countdown(&self) -> CountdownState {
        self.countdown.state()
    }

    pub fn sizzle_running(&self) -> bool {
        self.countdown.sizzle_running()
    }

    /// Scheduled actions and follow-ups not yet fired.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Due time of the next queued follow-up.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Load the schedule relative to `now_ms` and fire anything already due.
    pub fn start(&mut self, now_ms: u64) -> Result<Vec<Event>, TimelineError> {
        if self.started_at_ms.is_some() {
            return Err(TimelineError::AlreadyStarted);
        }
        if self.phase != Phase::Door {
            return Err(TimelineError::InvalidPhase {
                expected: Phase::Door,
                actual: self.phase,
            });
        }
        self.started_at_ms = Some(now_ms);
        info!(entries = self.schedule.len(), "reveal timeline started");

        let entries = self.schedule.entries().to_vec();
        for entry in entries {
            self.enqueue(now_ms.saturating_add(entry.offset_ms), Pending::Run(entry.action));
        }

        let mut events = vec![Event::TimelineStarted { at_ms: now_ms }];
        events.extend(self.tick(now_ms));
        Ok(events)
    }

    /// Fire every due follow-up in due order, then sample the countdown.
    pub fn tick(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = Vec::new();
        if self.torn_down {
            return events;
        }

        while let Some(entry) = self.queue.first_entry() {
            let (due, _) = *entry.key();
            if due > now_ms {
                break;
            }
            let pending = entry.remove();
            self.fire(pending, due, &mut events);
        }

        for signal in self.countdown.advance(now_ms) {
            self.on_countdown(signal, now_ms, &mut events);
        }
        events
    }

    /// Register a toast on the revealed photo.
    ///
    /// While the cool-down lock is held the gesture is reported as
    /// `CheersIgnored` and nothing changes.
    pub fn trigger_cheers(
        &mut self,
        gesture: Gesture,
        now_ms: u64,
    ) -> Result<Vec<Event>, TimelineError> {
        self.require(Phase::Revealed)?;

        let Some(registered) = self.cheers.register(now_ms) else {
            return Ok(vec![Event::CheersIgnored {
                count: self.cheers.state().count,
                locked_for_ms: self.cheers.lock_remaining_ms(now_ms),
                at_ms: now_ms,
            }]);
        };
        info!(
            count = registered.count,
            level = registered.intensity_level,
            "cheers"
        );

        let mut events = vec![Event::CheersRegistered {
            count: registered.count,
            intensity_level: registered.intensity_level,
            message: registered.message.clone(),
            at_ms: now_ms,
        }];

        if registered.intensity_level > 0 {
            let angle = self.rng.gen_range(0.0..TAU);
            let (offset_x, offset_y, blur_px) =
                double_vision(registered.intensity_level, angle, self.cheers.config());
            events.push(Event::EffectRequested {
                effect: Effect::Visual {
                    flag: VisualFlag::DoubleVision {
                        level: registered.intensity_level,
                        offset_x,
                        offset_y,
                        blur_px,
                    },
                },
                at_ms: now_ms,
            });
        }

        let impact_at = now_ms.saturating_add(self.cheers.config().impact_delay_ms);
        let toast_at = impact_at.saturating_add(self.cheers.config().toast_delay_ms);
        let refraction = self.cheers.config().refraction_particles;
        self.enqueue(impact_at, Pending::Run(Action::PlayCue(CueKind::GlassClink)));
        self.enqueue(
            impact_at,
            Pending::Run(Action::SpawnEffect(Effect::Particles {
                kind: ParticleKind::Refraction,
                count: refraction,
                origin: gesture.origin,
            })),
        );
        for target in [PulseTarget::PhotoFrame, PulseTarget::Screen] {
            self.enqueue(
                impact_at,
                Pending::Run(Action::SpawnEffect(Effect::Pulse { target })),
            );
        }
        self.enqueue(
            toast_at,
            Pending::Run(Action::SpawnEffect(Effect::Toast {
                message: registered.message,
                origin: gesture.origin,
            })),
        );
        Ok(events)
    }

    /// Close the case: slam, stamp, then arm the self-destruct.
    pub fn trigger_case_closed(&mut self, now_ms: u64) -> Result<Vec<Event>, TimelineError> {
        self.require(Phase::Revealed)?;

        let mut events = Vec::new();
        self.set_phase(Phase::CaseClosed, now_ms, &mut events);
        events.push(Event::CueRequested {
            cue: CueKind::DoorSlam,
            at_ms: now_ms,
        });
        self.enqueue(
            now_ms.saturating_add(self.timing.stamp_delay_ms),
            Pending::Run(Action::PlayCue(CueKind::StampImpact)),
        );
        self.enqueue(
            now_ms.saturating_add(self.timing.self_destruct_delay_ms),
            Pending::ArmSelfDestruct,
        );
        Ok(events)
    }

    /// Drop queued follow-ups and stop the sizzle loop. Idempotent.
    ///
    /// Returns true only on the call that actually released something.
    pub fn teardown(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        self.torn_down = true;
        self.queue.clear();
        self.countdown.teardown();
        true
    }

    // ── Internals ────────────────────────────────────────────────────

    fn require(&self, expected: Phase) -> Result<(), TimelineError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(TimelineError::InvalidPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    fn enqueue(&mut self, due_ms: u64, pending: Pending) {
        self.queue.insert((due_ms, self.next_seq), pending);
        self.next_seq += 1;
    }

    fn fire(&mut self, pending: Pending, at_ms: u64, events: &mut Vec<Event>) {
        match pending {
            Pending::Run(Action::SetPhase(phase)) => self.set_phase(phase, at_ms, events),
            Pending::Run(Action::PlayCue(cue)) => events.push(Event::CueRequested { cue, at_ms }),
            Pending::Run(Action::SpawnEffect(effect)) => {
                events.push(Event::EffectRequested { effect, at_ms })
            }
            Pending::ArmSelfDestruct => match self.countdown.start(at_ms) {
                Ok(CountdownSignal::Started { duration_ms }) => {
                    self.set_phase(Phase::SelfDestructing, at_ms, events);
                    events.push(Event::CountdownStarted { duration_ms, at_ms });
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "self-destruct not armed"),
            },
        }
    }

    fn on_countdown(&mut self, signal: CountdownSignal, at_ms: u64, events: &mut Vec<Event>) {
        match signal {
            CountdownSignal::Started { duration_ms } => {
                events.push(Event::CountdownStarted { duration_ms, at_ms })
            }
            CountdownSignal::Tick {
                second,
                remaining_ms,
            } => {
                events.push(Event::CountdownTick {
                    second,
                    remaining_ms,
                    at_ms,
                });
                events.push(Event::CueRequested {
                    cue: CueKind::CountdownTick,
                    at_ms,
                });
            }
            CountdownSignal::Crackle => events.push(Event::CueRequested {
                cue: CueKind::Crackle,
                at_ms,
            }),
            CountdownSignal::Explosion => {
                events.push(Event::Exploded { at_ms });
                events.push(Event::CueRequested {
                    cue: CueKind::Explosion,
                    at_ms,
                });
                for flag in [VisualFlag::Flash, VisualFlag::ScreenShake] {
                    events.push(Event::EffectRequested {
                        effect: Effect::Visual { flag },
                        at_ms,
                    });
                }
            }
            CountdownSignal::SizzleStopped => events.push(Event::SizzleStopped { at_ms }),
            CountdownSignal::Terminated => {
                self.set_phase(Phase::Terminated, at_ms, events);
                events.push(Event::Terminated { at_ms });
            }
        }
    }

    /// Forward-only. A backward or repeated transition is logged and dropped.
    fn set_phase(&mut self, next: Phase, at_ms: u64, events: &mut Vec<Event>) {
        if !self.phase.can_transition_to(next) {
            warn!(from = %self.phase, to = %next, "refused phase transition");
            return;
        }
        info!(from = %self.phase, to = %next, at_ms, "phase changed");
        events.push(Event::PhaseChanged {
            from: self.phase,
            to: next,
            at_ms,
        });
        self.phase = next;
    }
}
