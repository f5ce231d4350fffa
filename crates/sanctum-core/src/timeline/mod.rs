pub mod cheers;
pub mod countdown;
mod engine;
mod phase;
mod schedule;

pub use cheers::{CheersState, CheersTracker, MessageBucket};
pub use countdown::{CountdownSignal, CountdownState, SelfDestruct};
pub use engine::{Gesture, RevealTimeline};
pub use phase::Phase;
pub use schedule::{Action, ScheduledAction, TimelineSchedule};
