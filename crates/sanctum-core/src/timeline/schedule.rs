use serde::{Deserialize, Serialize};

use super::phase::Phase;
use crate::audio::CueKind;
use crate::config::TimingConfig;
use crate::effects::{Effect, ParticleKind, VisualFlag};
use crate::error::ScheduleError;

/// Something the timeline does at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "kebab-case")]
pub enum Action {
    SetPhase(Phase),
    PlayCue(CueKind),
    SpawnEffect(Effect),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledAction {
    /// Milliseconds after `start()`.
    pub offset_ms: u64,
    pub action: Action,
}

impl ScheduledAction {
    pub fn new(offset_ms: u64, action: Action) -> Self {
        Self { offset_ms, action }
    }
}

/// Declarative door-to-reveal sequence.
///
/// Offsets are non-decreasing; entries with equal offsets fire in table order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSchedule {
    entries: Vec<ScheduledAction>,
}

impl TimelineSchedule {
    pub fn new(entries: Vec<ScheduledAction>) -> Result<Self, ScheduleError> {
        if entries.is_empty() {
            return Err(ScheduleError::Empty);
        }
        for (index, pair) in entries.windows(2).enumerate() {
            if pair[1].offset_ms < pair[0].offset_ms {
                return Err(ScheduleError::NonMonotonic {
                    index: index + 1,
                    offset_ms: pair[1].offset_ms,
                    previous_ms: pair[0].offset_ms,
                });
            }
        }
        Ok(Self { entries })
    }

    /// The vault door → folder → reveal sequence.
    pub fn from_timing(timing: &TimingConfig) -> Result<Self, ScheduleError> {
        use Action::*;

        Self::new(vec![
            ScheduledAction::new(timing.slam_ms, PlayCue(CueKind::DoorSlam)),
            ScheduledAction::new(
                timing.unlock_ms,
                SpawnEffect(Effect::Visual {
                    flag: VisualFlag::HandleRotation {
                        degrees: timing.handle_rotation_deg,
                    },
                }),
            ),
            ScheduledAction::new(timing.unlock_ms, PlayCue(CueKind::Unlock)),
            ScheduledAction::new(timing.grind_ms, PlayCue(CueKind::Grind)),
            ScheduledAction::new(
                timing.grind_ms,
                SpawnEffect(Effect::Visual {
                    flag: VisualFlag::DoorOpening,
                }),
            ),
            ScheduledAction::new(timing.folder_closed_ms, SetPhase(Phase::FolderClosed)),
            ScheduledAction::new(timing.folder_open_ms, PlayCue(CueKind::FolderOpen)),
            ScheduledAction::new(timing.folder_open_ms, SetPhase(Phase::FolderOpening)),
            ScheduledAction::new(
                timing.confetti_ms,
                SpawnEffect(Effect::Particles {
                    kind: ParticleKind::Confetti,
                    count: timing.confetti_count,
                    origin: None,
                }),
            ),
            ScheduledAction::new(timing.confetti_ms, PlayCue(CueKind::Applause)),
            ScheduledAction::new(timing.revealed_ms, SetPhase(Phase::Revealed)),
        ])
    }

    pub fn entries(&self) -> &[ScheduledAction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Offset of the last entry.
    pub fn total_duration_ms(&self) -> u64 {
        self.entries.last().map(|e| e.offset_ms).unwrap_or(0)
    }

    /// Phases in the order the schedule sets them.
    pub fn phases(&self) -> Vec<Phase> {
        self.entries
            .iter()
            .filter_map(|e| match e.action {
                Action::SetPhase(phase) => Some(phase),
                _ => None,
            })
            .collect()
    }
}
