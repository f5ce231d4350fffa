//! End-to-end reveal scenarios driven through `RevealSession`.
//!
//! Every test runs against a `ManualClock`, a `CaptureOutput` and a
//! `RecordingSink`, so timing is exact and nothing touches a real device.

use sanctum_core::timeline::Gesture;
use sanctum_core::{
    CaptureOutput, Clock, Collaborators, CueKind, Effect, Event, ManualClock, Phase,
    RecordingHaptics, RecordingSink, RevealConfig, RevealSession, SimulatedElement, VisualFlag,
};

// ============================================================================
// Test Helpers
// ============================================================================

struct Rig {
    clock: ManualClock,
    output: CaptureOutput,
    music: SimulatedElement,
    haptics: RecordingHaptics,
    sink: RecordingSink,
    session: RevealSession,
}

fn test_config() -> RevealConfig {
    let mut config = RevealConfig::default();
    config.audio.sample_rate = 8_000;
    config.audio.seed = Some(3);
    config.cheers.seed = Some(3);
    config.assets.glass_clip_url = None;
    config
}

fn rig_with(output: CaptureOutput, music: SimulatedElement) -> Rig {
    let clock = ManualClock::new();
    let haptics = RecordingHaptics::new();
    let sink = RecordingSink::new();
    let session = RevealSession::new(
        test_config(),
        Collaborators {
            clock: Box::new(clock.clone()),
            output: Box::new(output.clone()),
            music: Box::new(music.clone()),
            haptics: Some(Box::new(haptics.clone())),
            effects: Box::new(sink.clone()),
        },
    )
    .unwrap();
    Rig {
        clock,
        output,
        music,
        haptics,
        sink,
        session,
    }
}

fn rig() -> Rig {
    rig_with(CaptureOutput::new(), SimulatedElement::new())
}

/// Advance in `step_ms` frames until `until_ms`, collecting every event.
fn run_until(rig: &mut Rig, until_ms: u64, step_ms: u64) -> Vec<Event> {
    let mut events = Vec::new();
    while rig.clock.now_ms() < until_ms {
        rig.clock.advance(step_ms);
        events.extend(rig.session.tick());
    }
    events
}

/// Advance `duration_ms` past the current clock reading.
fn run_for(rig: &mut Rig, duration_ms: u64, step_ms: u64) -> Vec<Event> {
    let until = rig.clock.now_ms() + duration_ms;
    run_until(rig, until, step_ms)
}

fn reveal(rig: &mut Rig) {
    rig.session.activate(true);
    run_until(rig, 6_600, 16);
    assert_eq!(rig.session.phase(), Phase::Revealed);
}

fn count_cues(events: &[Event], kind: CueKind) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, Event::CueRequested { cue, .. } if *cue == kind))
        .count()
}

// ============================================================================
// Scenario A: phase sequence
// ============================================================================

#[test]
fn scenario_a_phases_arrive_in_order_without_repeats() {
    let mut r = rig();
    let mut observed = vec![r.session.phase()];
    r.session.activate(true);
    for event in run_until(&mut r, 8_000, 16) {
        if let Event::PhaseChanged { from, to, .. } = event {
            assert_eq!(Some(&from), observed.last());
            observed.push(to);
        }
    }
    assert_eq!(
        observed,
        vec![
            Phase::Door,
            Phase::FolderClosed,
            Phase::FolderOpening,
            Phase::Revealed
        ]
    );
}

#[test]
fn scenario_a_side_effects_reach_collaborators() {
    let mut r = rig();
    reveal(&mut r);
    assert_eq!(r.output.voices(), 5);
    assert_eq!(r.haptics.patterns(), vec![vec![200], vec![30, 50, 30], vec![100]]);
    let effects = r.sink.effects();
    assert!(effects.contains(&Effect::Visual {
        flag: VisualFlag::DoorOpening
    }));
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::Particles { count: 150, .. })));
}

// ============================================================================
// Scenario B: cheers lock
// ============================================================================

#[test]
fn scenario_b_rapid_cheers_register_once_until_cooldown() {
    let mut r = rig();
    reveal(&mut r);

    let first = r.session.cheers(Gesture::at(100.0, 80.0)).unwrap();
    assert!(matches!(first[0], Event::CheersRegistered { count: 1, .. }));
    for _ in 0..2 {
        r.clock.advance(40);
        let ignored = r.session.cheers(Gesture::at(100.0, 80.0)).unwrap();
        assert!(matches!(ignored[0], Event::CheersIgnored { count: 1, .. }));
    }
    assert_eq!(r.session.status().cheers.count, 1);

    r.clock.advance(4_800);
    let second = r.session.cheers(Gesture::at(100.0, 80.0)).unwrap();
    assert!(matches!(second[0], Event::CheersRegistered { count: 2, .. }));
    assert_eq!(r.session.status().cheers.count, 2);
}

#[test]
fn scenario_b_toast_follows_impact() {
    let mut r = rig();
    reveal(&mut r);
    let voices_before = r.output.voices();
    r.session.cheers(Gesture::default()).unwrap();

    let events = run_for(&mut r, 2_200, 10);
    assert_eq!(count_cues(&events, CueKind::GlassClink), 1);
    assert_eq!(r.output.voices(), voices_before + 1);
    assert_eq!(r.sink.toasts(), vec!["¡CHIN CHIN! 🥂".to_string()]);
}

// ============================================================================
// Scenario C: case closed arms the countdown on its own
// ============================================================================

#[test]
fn scenario_c_case_closed_arms_self_destruct() {
    let mut r = rig();
    reveal(&mut r);

    let closed_at = r.clock.now_ms();
    r.session.close_case().unwrap();
    assert_eq!(r.session.phase(), Phase::CaseClosed);
    assert!(!r.session.status().countdown.active);

    run_until(&mut r, closed_at + 2_499, 1);
    assert!(!r.session.status().countdown.active);
    run_until(&mut r, closed_at + 2_500, 1);
    assert!(r.session.status().countdown.active);
    assert_eq!(r.session.phase(), Phase::SelfDestructing);
}

// ============================================================================
// Scenario D: countdown
// ============================================================================

#[test]
fn scenario_d_five_ticks_one_explosion_then_terminated() {
    let mut r = rig();
    reveal(&mut r);
    r.session.close_case().unwrap();

    let events = run_for(&mut r, 9_000, 16);
    let seconds: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            Event::CountdownTick { second, .. } => Some(*second),
            _ => None,
        })
        .collect();
    assert_eq!(seconds, vec![5, 4, 3, 2, 1]);
    assert_eq!(count_cues(&events, CueKind::CountdownTick), 5);
    assert_eq!(count_cues(&events, CueKind::Explosion), 1);
    assert!(count_cues(&events, CueKind::Crackle) > 0);

    let exploded = events.iter().position(|e| matches!(e, Event::Exploded { .. }));
    let terminated = events
        .iter()
        .position(|e| matches!(e, Event::Terminated { .. }));
    assert!(exploded.unwrap() < terminated.unwrap());

    let status = r.session.status();
    assert!(status.countdown.terminated);
    assert_eq!(status.countdown.remaining_ms, 0.0);
    assert_eq!(status.phase, Phase::Terminated);
    assert!(!r.session.timeline().sizzle_running());
}

#[test]
fn scenario_d_no_crackle_after_explosion() {
    let mut r = rig();
    reveal(&mut r);
    r.session.close_case().unwrap();

    let events = run_for(&mut r, 9_000, 16);
    let exploded = events
        .iter()
        .position(|e| matches!(e, Event::Exploded { .. }))
        .unwrap();
    assert_eq!(count_cues(&events[exploded..], CueKind::Crackle), 0);
}

#[test]
fn scenario_d_throttled_host_still_ticks_five_times() {
    let mut r = rig();
    reveal(&mut r);
    r.session.close_case().unwrap();

    let events = run_for(&mut r, 9_000, 1_700);
    assert_eq!(count_cues(&events, CueKind::CountdownTick), 5);
    assert_eq!(count_cues(&events, CueKind::Explosion), 1);
}

// ============================================================================
// Scenario E: music play/pause/play
// ============================================================================

#[test]
fn scenario_e_replay_before_fade_out_completes() {
    let mut r = rig();
    r.session.play_music();
    run_until(&mut r, 650, 10);
    assert!((r.session.status().audio.music_volume - 0.6).abs() < 1e-6);

    r.session.pause_music();
    run_until(&mut r, 700, 10);
    let dipped = r.session.status().audio.music_volume;
    r.session.play_music();
    run_until(&mut r, 760, 10);
    let rising = r.session.status().audio.music_volume;
    assert!(rising > dipped);

    run_until(&mut r, 3_000, 10);
    assert!(r.session.music_playing());
    assert!((r.session.status().audio.music_volume - 0.6).abs() < 1e-6);
    assert_eq!(r.music.pause_calls(), 0);
}

#[test]
fn autoplay_rejection_leaves_music_stopped() {
    let mut r = rig_with(CaptureOutput::new(), SimulatedElement::blocked());
    assert!(matches!(r.session.toggle_music(), Event::MusicBlocked { .. }));
    assert!(!r.session.music_playing());

    r.music.allow_autoplay();
    assert!(matches!(r.session.toggle_music(), Event::MusicStarted { .. }));
    assert!(r.session.music_playing());
}

// ============================================================================
// Degradation and teardown
// ============================================================================

#[test]
fn visuals_continue_when_every_sound_fails() {
    let mut r = rig_with(CaptureOutput::failing(), SimulatedElement::new());
    reveal(&mut r);
    r.session.close_case().unwrap();
    run_for(&mut r, 9_000, 16);

    assert_eq!(r.output.voices(), 0);
    assert_eq!(r.session.phase(), Phase::Terminated);
    assert!(r.sink.effects().contains(&Effect::Visual {
        flag: VisualFlag::Flash
    }));
}

#[test]
fn teardown_mid_countdown_is_idempotent() {
    let mut r = rig();
    reveal(&mut r);
    r.session.close_case().unwrap();
    run_for(&mut r, 3_000, 16);
    assert!(r.session.timeline().sizzle_running());

    r.session.teardown();
    r.session.teardown();
    assert!(!r.session.timeline().sizzle_running());
    assert!(r.output.is_closed());
    assert!(run_for(&mut r, 10_000, 16).is_empty());
}
