//! Core error types for sanctum-core.
//!
//! Audio failures are never fatal: the sound engine logs and drops them.
//! They still get a typed error so outputs and music elements can report
//! what went wrong.

use std::path::PathBuf;
use thiserror::Error;

use crate::timeline::Phase;

/// Core error type for sanctum-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Timeline misuse (double start, wrong phase)
    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),

    /// Schedule construction errors
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Audio capability errors
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Programmer errors on the reveal timeline.
///
/// None of these are shown to the guest; the session turns a duplicate
/// start into a no-op.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    /// `start()` called on a timeline that already ran
    #[error("timeline already started")]
    AlreadyStarted,

    /// Operation not valid in the current phase
    #[error("operation requires phase '{expected}', current phase is '{actual}'")]
    InvalidPhase { expected: Phase, actual: Phase },

    /// Self-destruct armed twice
    #[error("self-destruct countdown already started")]
    CountdownAlreadyStarted,
}

/// Schedule table errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Offsets must be non-decreasing
    #[error("entry {index} at {offset_ms}ms is earlier than the previous entry at {previous_ms}ms")]
    NonMonotonic {
        index: usize,
        offset_ms: u64,
        previous_ms: u64,
    },

    #[error("schedule has no entries")]
    Empty,
}

/// Audio capability errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// The platform has no usable audio graph
    #[error("audio unsupported: {0}")]
    Unsupported(String),

    /// Cue context was disposed
    #[error("audio context closed")]
    ContextClosed,

    /// Cue context exists but refuses to run (no user gesture yet)
    #[error("audio context suspended")]
    Suspended,

    /// Playback requires a user gesture
    #[error("playback rejected by autoplay policy")]
    AutoplayRejected,

    /// External clip could not be played
    #[error("clip '{url}' failed: {message}")]
    ClipFailed { url: String, message: String },

    /// Generic output failure
    #[error("audio output failed: {0}")]
    Output(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
