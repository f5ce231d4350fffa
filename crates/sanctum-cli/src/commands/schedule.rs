use std::path::PathBuf;

use sanctum_core::TimelineSchedule;
use serde::Serialize;

#[derive(Serialize)]
struct CaseClosedTiming {
    stamp_ms: u64,
    self_destruct_ms: u64,
    countdown_ms: u64,
}

#[derive(Serialize)]
struct ScheduleReport<'a> {
    total_ms: u64,
    #[serde(flatten)]
    schedule: &'a TimelineSchedule,
    case_closed: CaseClosedTiming,
}

pub fn run(config: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config.as_deref())?;
    let schedule = TimelineSchedule::from_timing(&config.timing)?;

    let report = ScheduleReport {
        total_ms: schedule.total_duration_ms(),
        schedule: &schedule,
        case_closed: CaseClosedTiming {
            stamp_ms: config.timing.stamp_delay_ms,
            self_destruct_ms: config.timing.self_destruct_delay_ms,
            countdown_ms: config.countdown.duration_ms,
        },
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
