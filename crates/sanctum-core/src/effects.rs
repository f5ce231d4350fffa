//! Visual effects requested by the timeline.
//!
//! The core never touches a display. It describes what should appear and
//! the host renders it through an [`EffectsSink`].

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Position in host coordinates (pixels for a browser host).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParticleKind {
    /// Falling confetti rain while the folder opens.
    Confetti,
    /// Short refraction flash on the photo at glass impact.
    Refraction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PulseTarget {
    PhotoFrame,
    Screen,
}

/// Persistent or transient visual state toggles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "flag", rename_all = "kebab-case")]
pub enum VisualFlag {
    HandleRotation { degrees: f32 },
    DoorOpening,
    /// Double-vision offset of the photo; replaces the previous one.
    DoubleVision {
        level: u32,
        offset_x: f32,
        offset_y: f32,
        blur_px: f32,
    },
    Flash,
    ScreenShake,
}

/// One effect command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "kebab-case")]
pub enum Effect {
    Particles {
        kind: ParticleKind,
        count: u32,
        origin: Option<Point>,
    },
    Toast {
        message: String,
        origin: Option<Point>,
    },
    Pulse {
        target: PulseTarget,
    },
    Visual {
        flag: VisualFlag,
    },
}

/// Host capability that renders effects.
pub trait EffectsSink {
    fn spawn_particles(&mut self, kind: ParticleKind, count: u32, origin: Option<Point>);
    fn toast(&mut self, message: &str, origin: Option<Point>);
    fn pulse(&mut self, target: PulseTarget);
    fn visual(&mut self, flag: VisualFlag);
}

/// Route an [`Effect`] to the matching sink operation.
pub fn apply(sink: &mut dyn EffectsSink, effect: &Effect) {
    match effect {
        Effect::Particles {
            kind,
            count,
            origin,
        } => sink.spawn_particles(*kind, *count, *origin),
        Effect::Toast { message, origin } => sink.toast(message, *origin),
        Effect::Pulse { target } => sink.pulse(*target),
        Effect::Visual { flag } => sink.visual(*flag),
    }
}

/// Sink that keeps every effect in order. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    log: Rc<RefCell<Vec<Effect>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn effects(&self) -> Vec<Effect> {
        self.log.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.borrow().is_empty()
    }

    pub fn toasts(&self) -> Vec<String> {
        self.log
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Effect::Toast { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

impl EffectsSink for RecordingSink {
    fn spawn_particles(&mut self, kind: ParticleKind, count: u32, origin: Option<Point>) {
        self.log.borrow_mut().push(Effect::Particles {
            kind,
            count,
            origin,
        });
    }

    fn toast(&mut self, message: &str, origin: Option<Point>) {
        self.log.borrow_mut().push(Effect::Toast {
            message: message.to_string(),
            origin,
        });
    }

    fn pulse(&mut self, target: PulseTarget) {
        self.log.borrow_mut().push(Effect::Pulse { target });
    }

    fn visual(&mut self, flag: VisualFlag) {
        self.log.borrow_mut().push(Effect::Visual { flag });
    }
}
