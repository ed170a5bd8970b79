//! Integration tests for gesture capture
//!
//! Tests the full path: pointer events → GestureRecognizer → Doorman registration
//! and admission.

use doorman::core::{
    fingerprint, rhythm_hash, Clock, Doorman, GestureRecognizer, ManualClock, MemoryStore,
    RegisterOutcome, SeededRandom,
};
use doorman::types::{
    DoormanConfig, DoormanState, FlickDirection, GestureSequence, GestureStep, PointerEvent,
    RecognizerConfig, Region,
};
use pretty_assertions::assert_eq;

const SIZE: f64 = 400.0;

fn recognizer() -> GestureRecognizer {
    GestureRecognizer::new(RecognizerConfig::default(), SIZE, SIZE).unwrap()
}

/// `count` quick taps near the top-left corner; returns the last up time
fn taps(r: &mut GestureRecognizer, count: u32, start: u64) -> u64 {
    let mut t = start;
    for i in 0..count {
        if i > 0 {
            t += 150;
        }
        r.handle(PointerEvent::down(20.0, 20.0, t));
        t += 60;
        r.handle(PointerEvent::up(21.0, 20.0, t));
    }
    t
}

/// Clockwise drag at radius 150 around the center from 0° to `to_deg`
fn radial(r: &mut GestureRecognizer, to_deg: u32, start: u64) -> u64 {
    let point = |deg: f64| {
        let rad = deg.to_radians();
        (SIZE / 2.0 + 150.0 * rad.cos(), SIZE / 2.0 + 150.0 * rad.sin())
    };
    let mut t = start;
    let (x, y) = point(0.0);
    r.handle(PointerEvent::down(x, y, t));
    let mut deg = 0;
    while deg < to_deg {
        deg = (deg + 10).min(to_deg);
        t += 25;
        let (x, y) = point(deg as f64);
        if deg == to_deg {
            r.handle(PointerEvent::up(x, y, t));
        } else {
            r.handle(PointerEvent::moved(x, y, t));
        }
    }
    t
}

/// Center press held for `duration` ms
fn hold(r: &mut GestureRecognizer, duration: u64, start: u64) -> u64 {
    r.handle(PointerEvent::down(200.0, 200.0, start));
    r.handle(PointerEvent::moved(202.0, 201.0, start + duration / 2));
    r.handle(PointerEvent::up(201.0, 200.0, start + duration));
    start + duration
}

/// Fast downward swipe in the lower half: 90 px in 60 ms
fn flick_down(r: &mut GestureRecognizer, start: u64) -> u64 {
    r.handle(PointerEvent::down(200.0, 300.0, start));
    r.handle(PointerEvent::moved(200.0, 330.0, start + 20));
    r.handle(PointerEvent::moved(200.0, 360.0, start + 40));
    r.handle(PointerEvent::up(200.0, 390.0, start + 60));
    start + 60
}

/// The secret ritual, with a per-attempt pause between steps
fn perform_secret(r: &mut GestureRecognizer, start: u64, gap: u64, hold_ms: u64) -> GestureSequence {
    r.start_capture();
    let t = taps(r, 3, start);
    let t = radial(r, 100, t + gap);
    let t = hold(r, hold_ms, t + gap);
    let t = flick_down(r, t + gap);
    r.end_capture(t + 10).unwrap()
}

#[test]
fn test_secret_is_recognized_step_by_step() {
    let mut r = recognizer();
    let seq = perform_secret(&mut r, 0, 400, 800);

    assert_eq!(seq.len(), 4);
    assert_eq!(seq.steps[0], GestureStep::Tap { count: 3, region: Region::Edge });
    match &seq.steps[1] {
        GestureStep::RadialDrag { from_angle_deg, to_angle_deg, notches } => {
            assert!(from_angle_deg.abs() < 1e-6);
            assert!((to_angle_deg - 100.0).abs() < 1e-6);
            assert_eq!(*notches, 3);
        }
        other => panic!("expected radial drag, got {:?}", other),
    }
    assert_eq!(seq.steps[2], GestureStep::Hold { duration_ms: 800, region: Region::Center });
    match &seq.steps[3] {
        GestureStep::Flick { direction, velocity_px_per_ms } => {
            assert_eq!(*direction, FlickDirection::Down);
            assert!(*velocity_px_per_ms >= RecognizerConfig::default().flick_min_velocity);
        }
        other => panic!("expected flick, got {:?}", other),
    }
    assert!(!r.is_capturing());
}

/// Same ritual at a different pace: same fingerprint, different rhythm
#[test]
fn test_pace_changes_rhythm_not_fingerprint() {
    let mut r = recognizer();
    let slow = perform_secret(&mut r, 0, 700, 800);
    let fast = perform_secret(&mut r, 50_000, 250, 900);

    assert_eq!(fingerprint(&slow), fingerprint(&fast));
    assert_ne!(slow.rhythm_hash, fast.rhythm_hash);
    assert!(slow.total_duration_ms > fast.total_duration_ms);
}

/// Step starts read before finalizing reproduce the sequence's rhythm
#[test]
fn test_step_starts_carry_real_timing() {
    let mut r = recognizer();
    let mut rhythms = Vec::new();
    for gap in [300, 900] {
        r.start_capture();
        let t = taps(&mut r, 2, 0);
        let t = hold(&mut r, 800, t + gap);
        flick_down(&mut r, t + gap);

        let starts = r.step_starts().to_vec();
        assert_eq!(starts.len(), 3);
        assert_eq!(starts[0], 0);
        assert!(starts.windows(2).all(|w| w[1] > w[0]));

        let seq = r.end_capture(10_000).unwrap();
        assert_eq!(seq.rhythm_hash, rhythm_hash(&starts));
        rhythms.push(seq.rhythm_hash);
    }
    assert_ne!(rhythms[0], rhythms[1]);
}

#[test]
fn test_register_then_admit_from_pointer_events() {
    let clock = ManualClock::new(0);
    let mut d = Doorman::new(
        DoormanConfig::default(),
        Box::new(MemoryStore::new()),
        Box::new(|payload: &[u8]| hex::encode(&payload[..8])),
    )
    .unwrap()
    .with_clock(clock.clone())
    .with_random(SeededRandom::new(7));
    let mut r = recognizer();

    let first = perform_secret(&mut r, 0, 500, 800);
    assert_eq!(d.register(&first).unwrap(), RegisterOutcome::AwaitingConfirmation);
    let second = perform_secret(&mut r, 20_000, 350, 850);
    assert!(matches!(d.register(&second).unwrap(), RegisterOutcome::Registered { .. }));

    clock.set(100_000);
    d.knock();
    let attempt = perform_secret(&mut r, 100_000, 450, 780);
    clock.set(attempt.timestamp);
    let output = d.submit_gesture(&attempt);

    assert_eq!(output.to, DoormanState::Admitted);
    assert_eq!(d.replay_suspicions(), 0);
    assert!(d.time_remaining().unwrap() <= d.config().admission_ttl_ms);
    assert_eq!(clock.now_ms(), attempt.timestamp);
}

#[test]
fn test_extra_tap_is_rejected() {
    let clock = ManualClock::new(0);
    let mut d = Doorman::new(
        DoormanConfig::default(),
        Box::new(MemoryStore::new()),
        Box::new(|_: &[u8]| String::new()),
    )
    .unwrap()
    .with_clock(clock.clone());
    let mut r = recognizer();

    let secret = perform_secret(&mut r, 0, 500, 800);
    d.register(&secret).unwrap();
    d.register(&secret).unwrap();

    d.knock();
    r.start_capture();
    let t = taps(&mut r, 4, 0);
    let t = radial(&mut r, 100, t + 400);
    let t = hold(&mut r, 800, t + 400);
    let t = flick_down(&mut r, t + 400);
    let attempt = r.end_capture(t).unwrap();

    assert_eq!(attempt.steps[0], GestureStep::Tap { count: 4, region: Region::Edge });
    assert_eq!(d.submit_gesture(&attempt).to, DoormanState::Cooldown);
}

/// Separated taps do not merge; a cancelled stroke leaves nothing
#[test]
fn test_tap_spacing_and_cancel() {
    let mut r = recognizer();
    r.start_capture();
    taps(&mut r, 1, 0);
    taps(&mut r, 1, 1_000);
    r.handle(PointerEvent::down(200.0, 200.0, 2_000));
    r.handle(PointerEvent::cancel(2_100));

    let seq = r.end_capture(2_200).unwrap();
    assert_eq!(
        seq.steps,
        vec![
            GestureStep::Tap { count: 1, region: Region::Edge },
            GestureStep::Tap { count: 1, region: Region::Edge },
        ]
    );
    assert_eq!(seq.total_duration_ms, 2_200);
}

#[test]
fn test_nothing_captured_yields_none() {
    let mut r = recognizer();
    r.start_capture();
    // Slow drag: neither tap, hold, radial nor flick
    r.handle(PointerEvent::down(100.0, 100.0, 0));
    r.handle(PointerEvent::moved(110.0, 100.0, 150));
    r.handle(PointerEvent::up(112.0, 100.0, 300));
    assert!(r.end_capture(400).is_none());
}
