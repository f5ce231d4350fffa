//! Host audio capabilities: the cue output device and haptics.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::synth::CueBuffer;
use crate::error::AudioError;

/// Lifecycle of the cue output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextState {
    Uninitialized,
    Suspended,
    Running,
    Closed,
}

/// Device that plays rendered cues.
pub trait CueOutput {
    /// Acquire the device. May come up suspended until a user gesture.
    fn open(&mut self, sample_rate: u32) -> Result<ContextState, AudioError>;

    fn resume(&mut self) -> Result<ContextState, AudioError>;

    /// Queue a rendered voice. Voices overlap; none is stolen.
    fn submit(&mut self, buffer: CueBuffer) -> Result<(), AudioError>;

    /// Play an external clip by URL.
    fn play_clip(&mut self, url: &str, _volume: f32) -> Result<(), AudioError> {
        Err(AudioError::Unsupported(format!("clip playback ({url})")))
    }

    fn close(&mut self);
}

/// Vibration motor.
pub trait Haptics {
    fn vibrate(&mut self, pattern: &[u32]);
}

#[derive(Debug, Default)]
enum ClipMode {
    #[default]
    Unsupported,
    Accept,
    Fail(String),
}

#[derive(Debug, Default)]
struct CaptureState {
    start_suspended: bool,
    refuse_resume: bool,
    fail_open: bool,
    clip_mode: ClipMode,
    opens: u32,
    resumes: u32,
    closed: bool,
    buffers: Vec<CueBuffer>,
    clips: Vec<(String, f32)>,
}

/// Output that keeps every submitted buffer. Clones share the capture.
#[derive(Debug, Clone, Default)]
pub struct CaptureOutput {
    state: Rc<RefCell<CaptureState>>,
}

impl CaptureOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open into `Suspended`, like a browser context before a gesture.
    pub fn suspended() -> Self {
        let output = Self::new();
        output.state.borrow_mut().start_suspended = true;
        output
    }

    /// Every `open` fails.
    pub fn failing() -> Self {
        let output = Self::new();
        output.state.borrow_mut().fail_open = true;
        output
    }

    pub fn refuse_resume(&self) {
        self.state.borrow_mut().refuse_resume = true;
    }

    /// Accept clips, or reject them with `message`.
    pub fn with_clip_support(self, failure: Option<&str>) -> Self {
        self.state.borrow_mut().clip_mode = match failure {
            None => ClipMode::Accept,
            Some(message) => ClipMode::Fail(message.to_string()),
        };
        self
    }

    pub fn buffers(&self) -> Vec<CueBuffer> {
        self.state.borrow().buffers.clone()
    }

    pub fn voices(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn clips(&self) -> Vec<(String, f32)> {
        self.state.borrow().clips.clone()
    }

    pub fn opens(&self) -> u32 {
        self.state.borrow().opens
    }

    pub fn resumes(&self) -> u32 {
        self.state.borrow().resumes
    }

    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }
}

impl CueOutput for CaptureOutput {
    fn open(&mut self, _sample_rate: u32) -> Result<ContextState, AudioError> {
        let mut state = self.state.borrow_mut();
        if state.fail_open {
            return Err(AudioError::Unsupported("no audio device".into()));
        }
        state.opens += 1;
        state.closed = false;
        Ok(if state.start_suspended {
            ContextState::Suspended
        } else {
            ContextState::Running
        })
    }

    fn resume(&mut self) -> Result<ContextState, AudioError> {
        let mut state = self.state.borrow_mut();
        if state.refuse_resume {
            return Err(AudioError::Suspended);
        }
        state.resumes += 1;
        Ok(ContextState::Running)
    }

    fn submit(&mut self, buffer: CueBuffer) -> Result<(), AudioError> {
        let mut state = self.state.borrow_mut();
        if state.closed {
            return Err(AudioError::ContextClosed);
        }
        state.buffers.push(buffer);
        Ok(())
    }

    fn play_clip(&mut self, url: &str, volume: f32) -> Result<(), AudioError> {
        let state = &mut *self.state.borrow_mut();
        match &state.clip_mode {
            ClipMode::Unsupported => Err(AudioError::Unsupported(format!("clip playback ({url})"))),
            ClipMode::Accept => {
                state.clips.push((url.to_string(), volume));
                Ok(())
            }
            ClipMode::Fail(message) => Err(AudioError::ClipFailed {
                url: url.to_string(),
                message: message.clone(),
            }),
        }
    }

    fn close(&mut self) {
        self.state.borrow_mut().closed = true;
    }
}

/// Haptics that record every pattern. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingHaptics {
    patterns: Rc<RefCell<Vec<Vec<u32>>>>,
}

impl RecordingHaptics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn patterns(&self) -> Vec<Vec<u32>> {
        self.patterns.borrow().clone()
    }
}

impl Haptics for RecordingHaptics {
    fn vibrate(&mut self, pattern: &[u32]) {
        self.patterns.borrow_mut().push(pattern.to_vec());
    }
}
