use std::path::PathBuf;

use clap::Args;
use sanctum_core::{CueKind, SoundEngine};
use serde::Serialize;

#[derive(Args)]
pub struct CueArgs {
    /// Cue name (door-slam, unlock, grind, glass-clink, ...)
    kind: String,
    /// Cheers intensity level; detunes the glass clink
    #[arg(long, default_value = "0")]
    intensity: u32,
    /// Fixed seed for noise sources
    #[arg(long)]
    seed: Option<u64>,
    /// Read this config file instead of the default one
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Serialize)]
struct CueReport {
    kind: CueKind,
    intensity: u32,
    sample_rate: u32,
    samples: usize,
    duration_ms: u64,
    peak: f32,
    rms: f32,
    haptic: Option<&'static [u32]>,
}

pub fn run(args: CueArgs) -> Result<(), Box<dyn std::error::Error>> {
    let kind: CueKind = args.kind.parse()?;
    let mut config = super::load_config(args.config.as_deref())?;
    if args.seed.is_some() {
        config.audio.seed = args.seed;
    }

    let mut engine = SoundEngine::new(&config, None);
    engine.set_intensity(args.intensity);
    let buffer = engine.render(kind);

    let report = CueReport {
        kind,
        intensity: args.intensity,
        sample_rate: buffer.sample_rate,
        samples: buffer.samples.len(),
        duration_ms: buffer.duration_ms(),
        peak: buffer.peak(),
        rms: buffer.rms(),
        haptic: kind.haptic_pattern(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
