//! TOML-based reveal configuration.
//!
//! One configuration replaces every hand-forked variant of the reveal:
//! - Asset URLs (photo, toast video, music, glass clip)
//! - Door/folder timing table
//! - Cheers escalation (lock, intensity curve, message buckets)
//! - Self-destruct countdown
//! - Music fades and cue rendering
//!
//! Configuration is stored at `~/.config/sanctum/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::timeline::cheers::MessageBucket;
use crate::timeline::TimelineSchedule;

/// Remote media the host loads. Opaque to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    #[serde(default = "default_photo_url")]
    pub photo_url: String,
    #[serde(default = "default_video_url")]
    pub video_url: String,
    #[serde(default = "default_music_url")]
    pub music_url: String,
    /// Recorded glass clink tried before the synthesized one.
    #[serde(default = "default_glass_clip_url")]
    pub glass_clip_url: Option<String>,
    /// Lock-screen metadata for the music track.
    #[serde(default = "default_music_title")]
    pub music_title: String,
    #[serde(default = "default_music_artist")]
    pub music_artist: String,
}

/// Door and folder sequence, in milliseconds from `start()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_slam_ms")]
    pub slam_ms: u64,
    #[serde(default = "default_unlock_ms")]
    pub unlock_ms: u64,
    #[serde(default = "default_grind_ms")]
    pub grind_ms: u64,
    #[serde(default = "default_folder_closed_ms")]
    pub folder_closed_ms: u64,
    #[serde(default = "default_folder_open_ms")]
    pub folder_open_ms: u64,
    #[serde(default = "default_confetti_ms")]
    pub confetti_ms: u64,
    #[serde(default = "default_revealed_ms")]
    pub revealed_ms: u64,
    #[serde(default = "default_confetti_count")]
    pub confetti_count: u32,
    #[serde(default = "default_handle_rotation_deg")]
    pub handle_rotation_deg: f32,
    /// Stamp impact after closing the case.
    #[serde(default = "default_stamp_delay_ms")]
    pub stamp_delay_ms: u64,
    /// Self-destruct arming after closing the case.
    #[serde(default = "default_self_destruct_delay_ms")]
    pub self_destruct_delay_ms: u64,
}

/// Cheers easter egg.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheersConfig {
    /// Gestures are ignored for this long after a registered one.
    #[serde(default = "default_lock_ms")]
    pub lock_ms: u64,
    /// Glass impact relative to the gesture.
    #[serde(default = "default_impact_delay_ms")]
    pub impact_delay_ms: u64,
    /// Toast relative to the impact.
    #[serde(default = "default_toast_delay_ms")]
    pub toast_delay_ms: u64,
    /// Count at which intensity is still 0.
    #[serde(default = "default_intensity_threshold")]
    pub intensity_threshold: u32,
    #[serde(default = "default_max_intensity")]
    pub max_intensity: u32,
    /// Double-vision offset per intensity level, in pixels.
    #[serde(default = "default_magnitude_per_level")]
    pub magnitude_per_level: f32,
    #[serde(default = "default_blur_per_level")]
    pub blur_per_level: f32,
    #[serde(default = "default_refraction_particles")]
    pub refraction_particles: u32,
    /// Fixed seed for the double-vision direction. Random when unset.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_messages")]
    pub messages: Vec<MessageBucket>,
}

/// Self-destruct countdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownConfig {
    #[serde(default = "default_countdown_ms")]
    pub duration_ms: u64,
    /// Flash between explosion and termination.
    #[serde(default = "default_flash_ms")]
    pub flash_ms: u64,
    #[serde(default = "default_sizzle_interval_ms")]
    pub sizzle_interval_ms: u64,
}

/// Background music fades.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicConfig {
    #[serde(default = "default_target_volume")]
    pub target_volume: f32,
    #[serde(default = "default_fade_in_ms")]
    pub fade_in_ms: u64,
    #[serde(default = "default_fade_out_ms")]
    pub fade_out_ms: u64,
    /// Delay before a paused track is physically stopped.
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,
    /// Volume at or below which the stop goes through.
    #[serde(default = "default_stop_threshold")]
    pub stop_threshold: f32,
}

/// Cue rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_master_gain")]
    pub master_gain: f32,
    #[serde(default = "default_glass_clip_volume")]
    pub glass_clip_volume: f32,
    /// Fixed seed for noise sources. Random when unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Reveal configuration.
///
/// Serialized to/from TOML at `~/.config/sanctum/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevealConfig {
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub countdown: CountdownConfig,
    #[serde(default)]
    pub music: MusicConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub cheers: CheersConfig,
}

// Default functions
fn default_photo_url() -> String {
    "https://res.cloudinary.com/dswpi1pb9/image/upload/evidence.jpg".into()
}
fn default_video_url() -> String {
    "https://res.cloudinary.com/dswpi1pb9/video/upload/v1771271800/asset_apperol_gab_whi7ht.mp4"
        .into()
}
fn default_music_url() -> String {
    "https://res.cloudinary.com/dswpi1pb9/video/upload/v1768829177/Bad_Bunny_-_Ojitos_Lindos_8D_AUDIO_HQ_ft._Bomba_Este%CC%81reo_cukav7.mp3".into()
}
fn default_glass_clip_url() -> Option<String> {
    Some("https://cdn.freesound.org/previews/434/434015_9051007-lq.mp3".into())
}
fn default_music_title() -> String {
    "Radio del auto".into()
}
fn default_music_artist() -> String {
    "Bad Bunny ft. Bomba Estéreo".into()
}
fn default_slam_ms() -> u64 {
    200
}
fn default_unlock_ms() -> u64 {
    600
}
fn default_grind_ms() -> u64 {
    1_400
}
fn default_folder_closed_ms() -> u64 {
    3_200
}
fn default_folder_open_ms() -> u64 {
    4_800
}
fn default_confetti_ms() -> u64 {
    5_400
}
fn default_revealed_ms() -> u64 {
    6_600
}
fn default_confetti_count() -> u32 {
    150
}
fn default_handle_rotation_deg() -> f32 {
    720.0
}
fn default_stamp_delay_ms() -> u64 {
    600
}
fn default_self_destruct_delay_ms() -> u64 {
    2_500
}
fn default_lock_ms() -> u64 {
    4_800
}
fn default_impact_delay_ms() -> u64 {
    2_000
}
fn default_toast_delay_ms() -> u64 {
    100
}
fn default_intensity_threshold() -> u32 {
    2
}
fn default_max_intensity() -> u32 {
    4
}
fn default_magnitude_per_level() -> f32 {
    3.0
}
fn default_blur_per_level() -> f32 {
    0.4
}
fn default_refraction_particles() -> u32 {
    1
}
fn default_messages() -> Vec<MessageBucket> {
    vec![
        MessageBucket::exact(1, "¡CHIN CHIN! 🥂"),
        MessageBucket::exact(2, "¡SALUD! 🥂"),
        MessageBucket::exact(3, "otro? salud 🥂"),
        MessageBucket::range(
            4,
            6,
            &["otro? golosa 🤤🍹", "UPS! salud 🥴🥂", "en la pera 🍐🥴🍹"],
        ),
        MessageBucket::open_ended(7, "hic hic... 🥴"),
    ]
}
fn default_countdown_ms() -> u64 {
    5_000
}
fn default_flash_ms() -> u64 {
    100
}
fn default_sizzle_interval_ms() -> u64 {
    60
}
fn default_target_volume() -> f32 {
    0.6
}
fn default_fade_in_ms() -> u64 {
    650
}
fn default_fade_out_ms() -> u64 {
    420
}
fn default_stop_grace_ms() -> u64 {
    450
}
fn default_stop_threshold() -> f32 {
    0.05
}
fn default_sample_rate() -> u32 {
    44_100
}
fn default_master_gain() -> f32 {
    1.0
}
fn default_glass_clip_volume() -> f32 {
    0.75
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            photo_url: default_photo_url(),
            video_url: default_video_url(),
            music_url: default_music_url(),
            glass_clip_url: default_glass_clip_url(),
            music_title: default_music_title(),
            music_artist: default_music_artist(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            slam_ms: default_slam_ms(),
            unlock_ms: default_unlock_ms(),
            grind_ms: default_grind_ms(),
            folder_closed_ms: default_folder_closed_ms(),
            folder_open_ms: default_folder_open_ms(),
            confetti_ms: default_confetti_ms(),
            revealed_ms: default_revealed_ms(),
            confetti_count: default_confetti_count(),
            handle_rotation_deg: default_handle_rotation_deg(),
            stamp_delay_ms: default_stamp_delay_ms(),
            self_destruct_delay_ms: default_self_destruct_delay_ms(),
        }
    }
}

impl Default for CheersConfig {
    fn default() -> Self {
        Self {
            lock_ms: default_lock_ms(),
            impact_delay_ms: default_impact_delay_ms(),
            toast_delay_ms: default_toast_delay_ms(),
            intensity_threshold: default_intensity_threshold(),
            max_intensity: default_max_intensity(),
            magnitude_per_level: default_magnitude_per_level(),
            blur_per_level: default_blur_per_level(),
            refraction_particles: default_refraction_particles(),
            seed: None,
            messages: default_messages(),
        }
    }
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_countdown_ms(),
            flash_ms: default_flash_ms(),
            sizzle_interval_ms: default_sizzle_interval_ms(),
        }
    }
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            target_volume: default_target_volume(),
            fade_in_ms: default_fade_in_ms(),
            fade_out_ms: default_fade_out_ms(),
            stop_grace_ms: default_stop_grace_ms(),
            stop_threshold: default_stop_threshold(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            master_gain: default_master_gain(),
            glass_clip_volume: default_glass_clip_volume(),
            seed: None,
        }
    }
}

/// Returns `~/.config/sanctum[-dev]/` based on SANCTUM_ENV.
///
/// Set SANCTUM_ENV=dev to use the development directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("SANCTUM_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("sanctum-dev")
    } else {
        base_dir.join("sanctum")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::SaveFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

impl RevealConfig {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            // Clearing goes through deserialization, so only optional fields
            // accept it.
            if matches!(value, "none" | "null") {
                obj.insert(part.to_string(), serde_json::Value::Null);
                return Ok(());
            }

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        serde_json::Value::Number(n.into())
                    } else if let Ok(n) = value.parse::<f64>() {
                        serde_json::Number::from_f64(n)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                    } else {
                        return Err(invalid(format!("cannot parse '{value}' as number")));
                    }
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                // Unset optional field: numbers as numbers, anything else as text.
                serde_json::Value::Null => match value {
                    "" => serde_json::Value::Null,
                    _ => match value.parse::<u64>() {
                        Ok(n) => serde_json::Value::Number(n.into()),
                        Err(_) => serde_json::Value::String(value.into()),
                    },
                },
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults when missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Load and validate a config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let cfg: RevealConfig = toml::from_str(&content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(error = %err, "falling back to default config");
                Self::default()
            }
        }
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. The value is parsed according to the
    /// type of the current value, and the result must validate.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: RevealConfig =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Reject values the timeline and audio code cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            })
        };

        if self.countdown.duration_ms == 0 {
            return invalid("countdown.duration_ms", "must be greater than zero");
        }
        if self.countdown.sizzle_interval_ms == 0 {
            return invalid("countdown.sizzle_interval_ms", "must be greater than zero");
        }
        if self.audio.sample_rate < 8_000 {
            return invalid("audio.sample_rate", "must be at least 8000");
        }
        if !(0.0..=1.0).contains(&self.music.target_volume) {
            return invalid("music.target_volume", "must be within 0.0..=1.0");
        }
        if !(0.0..=1.0).contains(&self.music.stop_threshold) {
            return invalid("music.stop_threshold", "must be within 0.0..=1.0");
        }
        if !(0.0..=1.0).contains(&self.audio.glass_clip_volume) {
            return invalid("audio.glass_clip_volume", "must be within 0.0..=1.0");
        }
        if !(0.0..=1.0).contains(&self.audio.master_gain) {
            return invalid("audio.master_gain", "must be within 0.0..=1.0");
        }
        if let Err(e) = TimelineSchedule::from_timing(&self.timing) {
            return invalid("timing", &e.to_string());
        }
        if self.cheers.messages.is_empty() {
            return invalid("cheers.messages", "needs at least one bucket");
        }
        let mut previous_end: Option<u32> = None;
        for (i, bucket) in self.cheers.messages.iter().enumerate() {
            if bucket.messages.is_empty() {
                return invalid("cheers.messages", &format!("bucket {i} has no messages"));
            }
            if bucket.max_count.is_some_and(|max| max < bucket.min_count) {
                return invalid("cheers.messages", &format!("bucket {i} ends before it starts"));
            }
            if previous_end.is_some_and(|end| bucket.min_count <= end) {
                return invalid("cheers.messages", &format!("bucket {i} overlaps its predecessor"));
            }
            match (bucket.max_count, self.cheers.messages.get(i + 1)) {
                (None, Some(_)) => {
                    return invalid(
                        "cheers.messages",
                        "only the last bucket may be open-ended",
                    )
                }
                (max, _) => previous_end = max,
            }
        }
        Ok(())
    }
}
