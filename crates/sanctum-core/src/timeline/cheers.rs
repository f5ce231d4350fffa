//! Cheers easter egg: a repeatable toast gesture on the revealed photo.
//!
//! Each registered gesture bumps a counter. The counter picks a message
//! from a bucketed table and drives an intensity level that grows with
//! every toast until it saturates.

use serde::{Deserialize, Serialize};

use crate::config::CheersConfig;

/// Messages for a range of counts. `max_count = None` means open-ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBucket {
    pub min_count: u32,
    #[serde(default)]
    pub max_count: Option<u32>,
    pub messages: Vec<String>,
}

impl MessageBucket {
    pub fn exact(count: u32, message: &str) -> Self {
        Self {
            min_count: count,
            max_count: Some(count),
            messages: vec![message.to_string()],
        }
    }

    pub fn range(min_count: u32, max_count: u32, messages: &[&str]) -> Self {
        Self {
            min_count,
            max_count: Some(max_count),
            messages: messages.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn open_ended(min_count: u32, message: &str) -> Self {
        Self {
            min_count,
            max_count: None,
            messages: vec![message.to_string()],
        }
    }

    pub fn contains(&self, count: u32) -> bool {
        count >= self.min_count && self.max_count.map_or(true, |max| count <= max)
    }

    /// Rotates through the bucket's messages as the count advances.
    pub fn message_for(&self, count: u32) -> Option<&str> {
        if !self.contains(count) || self.messages.is_empty() {
            return None;
        }
        let index = (count - self.min_count) as usize % self.messages.len();
        Some(self.messages[index].as_str())
    }
}

/// Pick the message for `count` from the first bucket that contains it.
pub fn message_for(buckets: &[MessageBucket], count: u32) -> Option<&str> {
    buckets.iter().find_map(|b| b.message_for(count))
}

/// `clamp(count - threshold, 0, max_level)`.
pub fn intensity_level(count: u32, threshold: u32, max_level: u32) -> u32 {
    count.saturating_sub(threshold).min(max_level)
}

/// Double-vision offset for a level and a direction in radians.
pub fn double_vision(level: u32, angle: f32, config: &CheersConfig) -> (f32, f32, f32) {
    let magnitude = level as f32 * config.magnitude_per_level;
    (
        angle.cos() * magnitude,
        angle.sin() * magnitude,
        level as f32 * config.blur_per_level,
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheersState {
    pub count: u32,
    pub intensity_level: u32,
}

/// Outcome of a registered gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct Registered {
    pub count: u32,
    pub intensity_level: u32,
    pub message: String,
}

/// Counter plus the cool-down lock.
#[derive(Debug, Clone)]
pub struct CheersTracker {
    config: CheersConfig,
    state: CheersState,
    locked_until_ms: Option<u64>,
}

impl CheersTracker {
    pub fn new(config: CheersConfig) -> Self {
        Self {
            config,
            state: CheersState::default(),
            locked_until_ms: None,
        }
    }

    pub fn state(&self) -> CheersState {
        self.state
    }

    pub fn config(&self) -> &CheersConfig {
        &self.config
    }

    pub fn is_locked(&self, now_ms: u64) -> bool {
        self.locked_until_ms.is_some_and(|until| now_ms < until)
    }

    /// Milliseconds until the lock releases, 0 when unlocked.
    pub fn lock_remaining_ms(&self, now_ms: u64) -> u64 {
        self.locked_until_ms
            .map(|until| until.saturating_sub(now_ms))
            .unwrap_or(0)
    }

    /// Count a gesture unless locked. Engages the lock on success.
    pub fn register(&mut self, now_ms: u64) -> Option<Registered> {
        if self.is_locked(now_ms) {
            return None;
        }
        self.locked_until_ms = Some(now_ms.saturating_add(self.config.lock_ms));

        let count = self.state.count.saturating_add(1);
        let level = intensity_level(
            count,
            self.config.intensity_threshold,
            self.config.max_intensity,
        );
        self.state = CheersState {
            count,
            intensity_level: level,
        };

        let message = message_for(&self.config.messages, count)
            .unwrap_or_default()
            .to_string();
        Some(Registered {
            count,
            intensity_level: level,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tracker() -> CheersTracker {
        CheersTracker::new(CheersConfig::default())
    }

    #[test]
    fn intensity_boundaries() {
        assert_eq!(intensity_level(0, 2, 4), 0);
        assert_eq!(intensity_level(2, 2, 4), 0);
        assert_eq!(intensity_level(3, 2, 4), 1);
        assert_eq!(intensity_level(6, 2, 4), 4);
        assert_eq!(intensity_level(11, 2, 4), 4);
    }

    #[test]
    fn default_messages_follow_buckets() {
        let buckets = CheersConfig::default().messages;
        assert_eq!(message_for(&buckets, 1), Some("¡CHIN CHIN! 🥂"));
        assert_eq!(message_for(&buckets, 2), Some("¡SALUD! 🥂"));
        assert_eq!(message_for(&buckets, 3), Some("otro? salud 🥂"));
        assert_eq!(message_for(&buckets, 4), Some("otro? golosa 🤤🍹"));
        assert_eq!(message_for(&buckets, 5), Some("UPS! salud 🥴🥂"));
        assert_eq!(message_for(&buckets, 6), Some("en la pera 🍐🥴🍹"));
        assert_eq!(message_for(&buckets, 7), Some("hic hic... 🥴"));
        assert_eq!(message_for(&buckets, 500), Some("hic hic... 🥴"));
        assert_eq!(message_for(&buckets, 0), None);
    }

    #[test]
    fn lock_blocks_until_cooldown() {
        let mut t = tracker();
        assert!(t.register(0).is_some());
        assert!(t.register(10).is_none());
        assert!(t.register(4_799).is_none());
        assert_eq!(t.state().count, 1);
        let second = t.register(4_800).unwrap();
        assert_eq!(second.count, 2);
        assert_eq!(second.message, "¡SALUD! 🥂");
    }

    #[test]
    fn lock_remaining_counts_down() {
        let mut t = tracker();
        t.register(1_000);
        assert_eq!(t.lock_remaining_ms(1_800), 4_000);
        assert_eq!(t.lock_remaining_ms(10_000), 0);
    }

    #[test]
    fn double_vision_scales_with_level() {
        let config = CheersConfig::default();
        let (x, y, blur) = double_vision(2, 0.0, &config);
        assert!((x - 6.0).abs() < 1e-5);
        assert!(y.abs() < 1e-5);
        assert!((blur - 0.8).abs() < 1e-5);
        let (x0, y0, _) = double_vision(0, 1.3, &config);
        assert_eq!((x0, y0), (0.0, 0.0));
    }

    proptest! {
        #[test]
        fn count_increments_by_one_per_unlocked_gesture(gaps in proptest::collection::vec(4_800u64..20_000, 1..40)) {
            let mut t = tracker();
            let mut now = 0u64;
            let mut previous = t.state();
            for gap in gaps {
                now += gap;
                let registered = t.register(now);
                prop_assert!(registered.is_some());
                let state = t.state();
                prop_assert_eq!(state.count, previous.count + 1);
                prop_assert!(state.intensity_level >= previous.intensity_level);
                previous = state;
            }
        }

        #[test]
        fn locked_gestures_never_change_count(offsets in proptest::collection::vec(0u64..4_800, 1..40)) {
            let mut t = tracker();
            t.register(0);
            for offset in offsets {
                prop_assert!(t.register(offset).is_none());
            }
            prop_assert_eq!(t.state().count, 1);
        }

        #[test]
        fn intensity_is_monotonic_and_clamped(count in 0u32..10_000, threshold in 0u32..10, max in 0u32..10) {
            let level = intensity_level(count, threshold, max);
            prop_assert!(level <= max);
            prop_assert!(intensity_level(count + 1, threshold, max) >= level);
        }
    }
}
