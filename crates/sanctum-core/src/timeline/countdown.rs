//! Self-destruct countdown.
//!
//! Remaining time is derived from the captured start timestamp on every
//! sample, so throttled or irregular ticks never accumulate drift.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Active (ticks 5..1, sizzle loop) -> Exploded (flash) -> Terminated
//! ```

use serde::{Deserialize, Serialize};

use crate::config::CountdownConfig;
use crate::error::TimelineError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountdownState {
    pub remaining_ms: f64,
    pub active: bool,
    pub terminated: bool,
}

/// What a countdown sample produced, in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CountdownSignal {
    Started { duration_ms: u64 },
    /// Whole second reached (5, 4, 3, 2, 1 for the default duration).
    Tick { second: u32, remaining_ms: f64 },
    Crackle,
    Explosion,
    SizzleStopped,
    Terminated,
}

/// Recurring crackle. Dropping the handle is the cancellation.
#[derive(Debug, Clone, Copy)]
struct SizzleLoop {
    interval_ms: u64,
    next_due_ms: u64,
}

#[derive(Debug, Clone)]
pub struct SelfDestruct {
    config: CountdownConfig,
    state: CountdownState,
    started_at_ms: Option<u64>,
    next_tick_second: u32,
    exploded_at_ms: Option<u64>,
    sizzle: Option<SizzleLoop>,
}

impl SelfDestruct {
    pub fn new(config: CountdownConfig) -> Self {
        let duration = config.duration_ms as f64;
        Self {
            next_tick_second: whole_seconds(config.duration_ms),
            config,
            state: CountdownState {
                remaining_ms: duration,
                active: false,
                terminated: false,
            },
            started_at_ms: None,
            exploded_at_ms: None,
            sizzle: None,
        }
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn is_started(&self) -> bool {
        self.started_at_ms.is_some()
    }

    pub fn sizzle_running(&self) -> bool {
        self.sizzle.is_some()
    }

    /// Arm the countdown with `at_ms` as its origin.
    pub fn start(&mut self, at_ms: u64) -> Result<CountdownSignal, TimelineError> {
        if self.started_at_ms.is_some() {
            return Err(TimelineError::CountdownAlreadyStarted);
        }
        self.started_at_ms = Some(at_ms);
        self.state.active = true;
        self.sizzle = Some(SizzleLoop {
            interval_ms: self.config.sizzle_interval_ms,
            next_due_ms: at_ms.saturating_add(self.config.sizzle_interval_ms),
        });
        Ok(CountdownSignal::Started {
            duration_ms: self.config.duration_ms,
        })
    }

    /// Sample the countdown at `now_ms`.
    pub fn advance(&mut self, now_ms: u64) -> Vec<CountdownSignal> {
        let mut signals = Vec::new();
        if self.state.terminated {
            return signals;
        }
        let Some(started_at) = self.started_at_ms else {
            return signals;
        };

        if self.exploded_at_ms.is_none() {
            let elapsed = now_ms.saturating_sub(started_at) as f64;
            let remaining = (self.config.duration_ms as f64 - elapsed)
                .max(0.0)
                .min(self.state.remaining_ms);
            self.state.remaining_ms = remaining;

            while self.next_tick_second > 0 && remaining <= self.next_tick_second as f64 * 1000.0 {
                signals.push(CountdownSignal::Tick {
                    second: self.next_tick_second,
                    remaining_ms: remaining,
                });
                self.next_tick_second -= 1;
            }

            if remaining > 0.0 {
                if let Some(sizzle) = self.sizzle.as_mut() {
                    if now_ms >= sizzle.next_due_ms {
                        signals.push(CountdownSignal::Crackle);
                        sizzle.next_due_ms = now_ms.saturating_add(sizzle.interval_ms);
                    }
                }
                return signals;
            }

            signals.push(CountdownSignal::Explosion);
            self.exploded_at_ms = Some(now_ms);
            if self.cancel_sizzle() {
                signals.push(CountdownSignal::SizzleStopped);
            }
        }

        if let Some(exploded_at) = self.exploded_at_ms {
            if now_ms >= exploded_at.saturating_add(self.config.flash_ms) {
                self.state.terminated = true;
                self.state.active = false;
                signals.push(CountdownSignal::Terminated);
            }
        }
        signals
    }

    /// Stop the sizzle loop. Returns false when it was already stopped.
    pub fn teardown(&mut self) -> bool {
        self.cancel_sizzle()
    }

    fn cancel_sizzle(&mut self) -> bool {
        self.sizzle.take().is_some()
    }
}

fn whole_seconds(duration_ms: u64) -> u32 {
    duration_ms.div_ceil(1000) as u32
}
