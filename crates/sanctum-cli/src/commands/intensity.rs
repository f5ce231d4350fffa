use sanctum_core::timeline::cheers::{intensity_level, message_for};
use sanctum_core::RevealConfig;
use serde::Serialize;

#[derive(Serialize)]
struct IntensityReport<'a> {
    count: u32,
    intensity_level: u32,
    message: Option<&'a str>,
}

pub fn run(count: u32) -> Result<(), Box<dyn std::error::Error>> {
    let config = RevealConfig::load_or_default();
    let cheers = &config.cheers;
    let report = IntensityReport {
        count,
        intensity_level: intensity_level(count, cheers.intensity_threshold, cheers.max_intensity),
        message: message_for(&cheers.messages, count),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
