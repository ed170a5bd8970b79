//! Property tests for fingerprints and verifiers

use doorman::core::fingerprint::{constant_time_eq, create_verifier, fingerprint, verify};
use doorman::types::{FlickDirection, GestureSequence, GestureStep, Region};
use proptest::prelude::*;

fn region() -> impl Strategy<Value = Region> {
    prop_oneof![Just(Region::Center), Just(Region::Edge)]
}

fn direction() -> impl Strategy<Value = FlickDirection> {
    prop_oneof![
        Just(FlickDirection::Up),
        Just(FlickDirection::Down),
        Just(FlickDirection::Left),
        Just(FlickDirection::Right),
    ]
}

fn step() -> impl Strategy<Value = GestureStep> {
    prop_oneof![
        (1u32..10, region()).prop_map(|(count, region)| GestureStep::Tap { count, region }),
        (500u32..10_000, region())
            .prop_map(|(duration_ms, region)| GestureStep::Hold { duration_ms, region }),
        (0.0f64..360.0, 0.0f64..360.0, 1u32..12).prop_map(|(from, to, notches)| {
            GestureStep::RadialDrag { from_angle_deg: from, to_angle_deg: to, notches }
        }),
        (direction(), 0.5f64..5.0).prop_map(|(direction, velocity_px_per_ms)| {
            GestureStep::Flick { direction, velocity_px_per_ms }
        }),
    ]
}

/// A structurally different version of `step`
fn mutate(step: &GestureStep) -> GestureStep {
    match step.clone() {
        GestureStep::Tap { count, region } => GestureStep::Tap { count: count + 1, region },
        GestureStep::Hold { duration_ms, region } => {
            GestureStep::Hold { duration_ms: duration_ms + 500, region }
        }
        GestureStep::RadialDrag { from_angle_deg, to_angle_deg, notches } => {
            GestureStep::RadialDrag { from_angle_deg, to_angle_deg, notches: notches + 1 }
        }
        GestureStep::Flick { direction, velocity_px_per_ms } => {
            let direction = match direction {
                FlickDirection::Up => FlickDirection::Right,
                FlickDirection::Right => FlickDirection::Down,
                FlickDirection::Down => FlickDirection::Left,
                FlickDirection::Left => FlickDirection::Up,
            };
            GestureStep::Flick { direction, velocity_px_per_ms }
        }
    }
}

proptest! {
    #[test]
    fn fingerprint_ignores_timing(
        steps in prop::collection::vec(step(), 1..6),
        d1 in 0u64..60_000,
        d2 in 0u64..60_000,
        t1 in any::<u64>(),
        t2 in any::<u64>(),
    ) {
        let a = GestureSequence::new(steps.clone(), d1, "aa", t1);
        let b = GestureSequence::new(steps, d2, "bb", t2);
        prop_assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn verify_accepts_only_the_registered_steps(
        steps in prop::collection::vec(step(), 1..6),
        index in any::<prop::sample::Index>(),
        salt in any::<[u8; 16]>(),
    ) {
        let secret = GestureSequence::new(steps.clone(), 1_000, "r", 0);
        let verifier = create_verifier(&fingerprint(&secret), &salt, "speakeasy.local", 0);
        prop_assert!(verify(&secret, &verifier));

        let i = index.index(steps.len());
        let mut altered = steps.clone();
        altered[i] = mutate(&steps[i]);
        prop_assert!(!verify(&GestureSequence::new(altered, 1_000, "r", 0), &verifier));

        let mut shorter = steps;
        shorter.remove(i);
        prop_assert!(!verify(&GestureSequence::new(shorter, 1_000, "r", 0), &verifier));
    }

    #[test]
    fn verifier_is_bound_to_domain_and_salt(
        steps in prop::collection::vec(step(), 1..4),
        salt in any::<[u8; 16]>(),
    ) {
        let secret = GestureSequence::new(steps, 1_000, "r", 0);
        let fp = fingerprint(&secret);
        let home = create_verifier(&fp, &salt, "speakeasy.local", 0);

        let mut moved = home.clone();
        moved.domain = "elsewhere.local".to_string();
        prop_assert!(!verify(&secret, &moved));

        let mut other_salt = salt;
        other_salt[0] ^= 0xff;
        prop_assert_ne!(create_verifier(&fp, &other_salt, "speakeasy.local", 0).hash, home.hash);
    }

    #[test]
    fn constant_time_eq_matches_slice_eq(a in prop::collection::vec(any::<u8>(), 0..40),
                                         b in prop::collection::vec(any::<u8>(), 0..40)) {
        prop_assert_eq!(constant_time_eq(&a, &b), a == b);
        prop_assert!(constant_time_eq(&a, &a));
    }
}
