use std::fmt;

use serde::{Deserialize, Serialize};

/// Presentation phase of the reveal.
///
/// Phases are strictly ordered and the timeline only ever moves forward.
/// `CaseClosed` and later are an optional branch entered from `Revealed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Door,
    FolderClosed,
    FolderOpening,
    Revealed,
    CaseClosed,
    SelfDestructing,
    Terminated,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Door,
        Phase::FolderClosed,
        Phase::FolderOpening,
        Phase::Revealed,
        Phase::CaseClosed,
        Phase::SelfDestructing,
        Phase::Terminated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Door => "door",
            Phase::FolderClosed => "folder-closed",
            Phase::FolderOpening => "folder-opening",
            Phase::Revealed => "revealed",
            Phase::CaseClosed => "case-closed",
            Phase::SelfDestructing => "self-destructing",
            Phase::Terminated => "terminated",
        }
    }

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Forward-only: any later phase is reachable, nothing earlier or equal.
    pub fn can_transition_to(self, next: Phase) -> bool {
        next > self
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Terminated
    }

    /// True once the folder content is visible.
    pub fn is_open(self) -> bool {
        matches!(
            self,
            Phase::FolderOpening | Phase::Revealed | Phase::CaseClosed
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
