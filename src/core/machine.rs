//! Doorman state machine: a pure reducer over DoormanContext
//!
//! State transitions:
//! - IDLE → CHALLENGED: knock (challenge issued)
//! - CHALLENGED → VERIFYING: gesture inside the challenge window
//! - VERIFYING → ADMITTED: verified (capability stored, failures reset)
//! - VERIFYING → COOLDOWN/LOCKED: failure (exponential backoff, then lock)
//! - CHALLENGED/VERIFYING → DECOY/LOCKED: panic gesture
//! - every other state → IDLE: its timeout or an explicit exit
//!
//! `now` is always passed in; nothing here reads a clock, draws randomness or
//! schedules timers. Events with no row in the table leave the context untouched.

use crate::types::{
    CapabilityToken, Challenge, DoormanConfig, DoormanContext, DoormanEvent, DoormanState,
    PanicAction, ReasonCode,
};

/// Result of applying one event
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub context: DoormanContext,
    pub reason: ReasonCode,
}

impl Transition {
    fn to(context: DoormanContext, reason: ReasonCode) -> Self {
        Self { context, reason }
    }

    fn unchanged(ctx: &DoormanContext, reason: ReasonCode) -> Self {
        Self { context: ctx.clone(), reason }
    }
}

/// Apply `event` to `ctx` at time `now`
pub fn transition(
    ctx: &DoormanContext,
    event: &DoormanEvent,
    now: u64,
    config: &DoormanConfig,
) -> Transition {
    use DoormanEvent as E;
    use DoormanState as S;

    match (ctx.state, event) {
        (S::Idle, E::KnockDetected { timestamp, nonce, salt }) => {
            let challenge = Challenge {
                nonce: nonce.clone(),
                salt: salt.clone(),
                issued_at: *timestamp,
                expires_at: timestamp.saturating_add(config.challenge_window_ms),
            };
            Transition::to(
                DoormanContext {
                    state: S::Challenged,
                    challenge: Some(challenge),
                    ..idle(ctx.consecutive_failures)
                },
                ReasonCode::D001_CHALLENGE_ISSUED,
            )
        }

        (S::Challenged, E::GestureComplete { .. }) => {
            let in_window = ctx.challenge.as_ref().is_some_and(|c| c.accepts_at(now));
            if in_window {
                let mut next = ctx.clone();
                next.state = S::Verifying;
                Transition::to(next, ReasonCode::D002_GESTURE_ACCEPTED)
            } else {
                Transition::unchanged(ctx, ReasonCode::D002_GESTURE_STALE)
            }
        }

        (S::Challenged, E::ChallengeTimeout) => Transition::to(
            idle(ctx.consecutive_failures),
            ReasonCode::D001_CHALLENGE_TIMEOUT,
        ),

        (S::Challenged | S::Verifying, E::ExitRequested) => {
            Transition::to(idle(ctx.consecutive_failures), ReasonCode::D005_EXIT)
        }

        (S::Challenged | S::Verifying, E::PanicGesture { decoy }) => {
            panic_transition(ctx, *decoy, now, config)
        }

        (S::Verifying, E::VerificationSuccess { capability }) => {
            if capability.is_valid_at(now) {
                admit(capability, now, config)
            } else {
                // Token outside its validity window counts as a failure
                fail(ctx, now, config)
            }
        }

        (S::Verifying, E::VerificationFailure { .. }) => fail(ctx, now, config),

        (S::Cooldown, E::CooldownElapsed) => Transition::to(
            idle(ctx.consecutive_failures),
            ReasonCode::D005_COOLDOWN_ELAPSED,
        ),

        (S::Locked, E::LockExpired) => Transition::to(idle(0), ReasonCode::D005_LOCK_EXPIRED),

        (S::Admitted | S::Decoy, E::ExitRequested) => {
            Transition::to(idle(ctx.consecutive_failures), ReasonCode::D005_EXIT)
        }

        (S::Admitted | S::Decoy, E::AdmissionTimeout) => Transition::to(
            idle(ctx.consecutive_failures),
            ReasonCode::D003_ADMISSION_TIMEOUT,
        ),

        _ => Transition::unchanged(ctx, ReasonCode::D006_IGNORED),
    }
}

/// IDLE carrying the given failure count, everything else empty
fn idle(consecutive_failures: u32) -> DoormanContext {
    DoormanContext {
        consecutive_failures,
        ..DoormanContext::new()
    }
}

fn admit(capability: &CapabilityToken, now: u64, config: &DoormanConfig) -> Transition {
    Transition::to(
        DoormanContext {
            state: DoormanState::Admitted,
            capability: Some(capability.clone()),
            admission_ends_at: Some(now.saturating_add(config.admission_ttl_ms)),
            ..idle(0)
        },
        ReasonCode::D003_ADMITTED,
    )
}

fn fail(ctx: &DoormanContext, now: u64, config: &DoormanConfig) -> Transition {
    let failures = ctx.consecutive_failures.saturating_add(1);

    if failures < config.max_consecutive_failures {
        let backoff = config
            .cooldown_base_ms
            .saturating_mul(2u64.saturating_pow(failures - 1));
        Transition::to(
            DoormanContext {
                state: DoormanState::Cooldown,
                cooldown_ends_at: Some(now.saturating_add(backoff)),
                ..idle(failures)
            },
            ReasonCode::D004_COOLDOWN_STARTED,
        )
    } else {
        Transition::to(
            DoormanContext {
                state: DoormanState::Locked,
                lock_ends_at: Some(now.saturating_add(config.lock_duration_ms)),
                ..idle(failures)
            },
            ReasonCode::D004_LOCKED_OUT,
        )
    }
}

/// Panic lockouts and decoys leave the failure counter alone
fn panic_transition(
    ctx: &DoormanContext,
    decoy: bool,
    now: u64,
    config: &DoormanConfig,
) -> Transition {
    if !config.panic_gesture_enabled {
        return Transition::unchanged(ctx, ReasonCode::D006_PANIC_DISABLED);
    }

    if decoy {
        return Transition::to(
            DoormanContext {
                state: DoormanState::Decoy,
                admission_ends_at: Some(now.saturating_add(config.decoy_ttl_ms)),
                ..idle(ctx.consecutive_failures)
            },
            ReasonCode::D003_DECOY_ENTERED,
        );
    }

    if config.panic_action == PanicAction::Lock {
        let duration = config
            .lock_duration_ms
            .saturating_mul(config.panic_lock_multiplier as u64);
        return Transition::to(
            DoormanContext {
                state: DoormanState::Locked,
                lock_ends_at: Some(now.saturating_add(duration)),
                ..idle(ctx.consecutive_failures)
            },
            ReasonCode::D004_PANIC_LOCK,
        );
    }

    Transition::unchanged(ctx, ReasonCode::D006_IGNORED)
}

/// Deadline that governs the current state, if any
pub fn deadline(ctx: &DoormanContext) -> Option<u64> {
    match ctx.state {
        DoormanState::Idle => None,
        DoormanState::Challenged | DoormanState::Verifying => {
            ctx.challenge.as_ref().map(|c| c.expires_at)
        }
        DoormanState::Admitted | DoormanState::Decoy => ctx.admission_ends_at,
        DoormanState::Cooldown => ctx.cooldown_ends_at,
        DoormanState::Locked => ctx.lock_ends_at,
    }
}

/// Milliseconds until the current deadline, clamped at zero. `None` in IDLE.
pub fn time_remaining(ctx: &DoormanContext, now: u64) -> Option<u64> {
    deadline(ctx).map(|d| d.saturating_sub(now))
}

pub fn is_admitted(ctx: &DoormanContext) -> bool {
    ctx.state == DoormanState::Admitted
}

// =============================================================================
// TESTS
// =============================================================================
