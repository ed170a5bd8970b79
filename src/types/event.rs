//! Doorman events
//!
//! Every input to the reducer is one of these variants. Randomness needed by a
//! knock is drawn before dispatch and carried in the event, so the reducer
//! itself stays pure.

use serde::{Deserialize, Serialize};

use crate::types::{CapabilityToken, GestureSequence};

/// Why a verification failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Fingerprint did not match the verifier
    Mismatch,
    /// No verifier registered for this domain
    NotRegistered,
    /// Token handed to VERIFICATION_SUCCESS was outside its validity window
    InvalidCapability,
}

/// Input to the doorman state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DoormanEvent {
    KnockDetected {
        timestamp: u64,
        /// 32 random bytes, hex
        nonce: String,
        /// 16 random bytes, hex
        salt: String,
    },
    GestureComplete {
        sequence: GestureSequence,
    },
    ChallengeTimeout,
    ExitRequested,
    PanicGesture {
        decoy: bool,
    },
    VerificationSuccess {
        capability: CapabilityToken,
    },
    VerificationFailure {
        reason: FailureReason,
    },
    CooldownElapsed,
    LockExpired,
    AdmissionTimeout,
}

impl DoormanEvent {
    /// Event name as used in logs
    pub fn name(&self) -> &'static str {
        match self {
            DoormanEvent::KnockDetected { .. } => "KNOCK_DETECTED",
            DoormanEvent::GestureComplete { .. } => "GESTURE_COMPLETE",
            DoormanEvent::ChallengeTimeout => "CHALLENGE_TIMEOUT",
            DoormanEvent::ExitRequested => "EXIT_REQUESTED",
            DoormanEvent::PanicGesture { .. } => "PANIC_GESTURE",
            DoormanEvent::VerificationSuccess { .. } => "VERIFICATION_SUCCESS",
            DoormanEvent::VerificationFailure { .. } => "VERIFICATION_FAILURE",
            DoormanEvent::CooldownElapsed => "COOLDOWN_ELAPSED",
            DoormanEvent::LockExpired => "LOCK_EXPIRED",
            DoormanEvent::AdmissionTimeout => "ADMISSION_TIMEOUT",
        }
    }
}
