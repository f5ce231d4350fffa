use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::Args;
use sanctum_core::timeline::Gesture;
use sanctum_core::{
    CaptureOutput, Clock, Collaborators, Event, ManualClock, Phase, RecordingSink, RevealConfig,
    RevealSession, SessionStatus, SimulatedElement, SystemClock,
};
use serde::Serialize;
use tracing::info;

/// Simulated time after which a run that never reaches its goal is aborted.
const STALL_LIMIT_MS: u64 = 120_000;

#[derive(Args)]
pub struct PlayArgs {
    /// Pace frames against the wall clock instead of simulating time
    #[arg(long)]
    realtime: bool,
    /// Close the case once revealed and let it self-destruct
    #[arg(long)]
    close_case: bool,
    /// Number of toasts to make on the revealed photo
    #[arg(long, default_value = "0")]
    cheers: u32,
    /// Start the background music with the reveal
    #[arg(long)]
    music: bool,
    /// Frame length in milliseconds
    #[arg(long, default_value = "16")]
    step_ms: u64,
    /// Fixed seed for noise and double-vision angles
    #[arg(long)]
    seed: Option<u64>,
    /// Read this config file instead of the default one
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Serialize)]
struct EventLine<'a> {
    emitted_at: DateTime<Utc>,
    #[serde(flatten)]
    event: &'a Event,
}

#[derive(Serialize)]
struct SummaryLine<'a> {
    emitted_at: DateTime<Utc>,
    #[serde(rename = "type")]
    kind: &'static str,
    status: &'a SessionStatus,
    cue_voices: usize,
    effects: usize,
}

/// How the run advances between frames.
enum Pace {
    Simulated(ManualClock),
    Realtime(tokio::time::Interval),
}

impl Pace {
    async fn frame(&mut self, step_ms: u64) {
        match self {
            Pace::Simulated(clock) => clock.advance(step_ms),
            Pace::Realtime(interval) => {
                interval.tick().await;
            }
        }
    }
}

struct Run {
    session: RevealSession,
    clock: Box<dyn Clock>,
    pace: Pace,
    step_ms: u64,
    out: std::io::Stdout,
}

impl Run {
    fn emit(&mut self, events: &[Event]) -> Result<(), Box<dyn std::error::Error>> {
        let mut out = self.out.lock();
        for event in events {
            let line = EventLine {
                emitted_at: Utc::now(),
                event,
            };
            writeln!(out, "{}", serde_json::to_string(&line)?)?;
        }
        Ok(())
    }

    async fn frame(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.pace.frame(self.step_ms).await;
        let events = self.session.tick();
        self.emit(&events)
    }

    async fn run_for(&mut self, ms: u64) -> Result<(), Box<dyn std::error::Error>> {
        let end = self.clock.now_ms().saturating_add(ms);
        while self.clock.now_ms() < end {
            self.frame().await?;
        }
        Ok(())
    }

    async fn run_until_phase(&mut self, phase: Phase) -> Result<(), Box<dyn std::error::Error>> {
        let deadline = self.clock.now_ms().saturating_add(STALL_LIMIT_MS);
        while self.session.phase() < phase {
            if self.clock.now_ms() >= deadline {
                return Err(format!(
                    "timeline stalled in phase '{}' before reaching '{phase}'",
                    self.session.phase()
                )
                .into());
            }
            self.frame().await?;
        }
        Ok(())
    }
}

pub fn run(args: PlayArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.step_ms == 0 {
        return Err("--step-ms must be greater than zero".into());
    }
    let mut config = super::load_config(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.audio.seed = Some(seed);
        config.cheers.seed = Some(seed);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(play(args, config))
}

async fn play(args: PlayArgs, config: RevealConfig) -> Result<(), Box<dyn std::error::Error>> {
    let lock_ms = config.cheers.lock_ms;
    let (clock, session_clock, pace): (Box<dyn Clock>, Box<dyn Clock>, Pace) = if args.realtime {
        let clock = SystemClock::new();
        let interval = tokio::time::interval(Duration::from_millis(args.step_ms));
        (Box::new(clock), Box::new(clock), Pace::Realtime(interval))
    } else {
        let clock = ManualClock::new();
        (
            Box::new(clock.clone()),
            Box::new(clock.clone()),
            Pace::Simulated(clock),
        )
    };

    let output = CaptureOutput::new();
    let sink = RecordingSink::new();
    let session = RevealSession::new(
        config,
        Collaborators {
            clock: session_clock,
            output: Box::new(output.clone()),
            music: Box::new(SimulatedElement::new()),
            haptics: None,
            effects: Box::new(sink.clone()),
        },
    )?;

    let mut run = Run {
        session,
        clock,
        pace,
        step_ms: args.step_ms,
        out: std::io::stdout(),
    };

    let started = run.session.activate(true);
    run.emit(&started)?;
    if args.music {
        let event = run.session.play_music();
        run.emit(&[event])?;
    }
    run.run_until_phase(Phase::Revealed).await?;
    info!("revealed");

    for _ in 0..args.cheers {
        let events = run.session.cheers(Gesture::default())?;
        run.emit(&events)?;
        run.run_for(lock_ms).await?;
    }

    if args.close_case {
        let events = run.session.close_case()?;
        run.emit(&events)?;
        run.run_until_phase(Phase::Terminated).await?;
    }

    run.session.teardown();
    let status = run.session.status();
    let summary = SummaryLine {
        emitted_at: Utc::now(),
        kind: "Summary",
        status: &status,
        cue_voices: output.voices(),
        effects: sink.len(),
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
