pub mod config;
pub mod cue;
pub mod intensity;
pub mod play;
pub mod schedule;

use std::path::Path;

use sanctum_core::RevealConfig;

/// Explicit file when given, otherwise the user config (defaults on error).
pub fn load_config(path: Option<&Path>) -> Result<RevealConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(RevealConfig::load_from(path)?),
        None => Ok(RevealConfig::load_or_default()),
    }
}
