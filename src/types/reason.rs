//! Reason codes for doorman transitions and guard rejections

use serde::{Deserialize, Serialize};

/// Reason codes for every reducer outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // D001: Challenge
    // =========================================================================
    /// Knock heard, challenge issued
    D001_CHALLENGE_ISSUED,
    /// Challenge window closed without a gesture
    D001_CHALLENGE_TIMEOUT,

    // =========================================================================
    // D002: Gesture
    // =========================================================================
    /// Gesture arrived inside the window, verifying
    D002_GESTURE_ACCEPTED,
    /// Gesture arrived after the window closed, ignored
    D002_GESTURE_STALE,

    // =========================================================================
    // D003: Admission
    // =========================================================================
    /// Verified, capability issued
    D003_ADMITTED,
    /// Panic gesture, decoy mode entered
    D003_DECOY_ENTERED,
    /// Admission or decoy window closed
    D003_ADMISSION_TIMEOUT,

    // =========================================================================
    // D004: Failure accounting
    // =========================================================================
    /// Verification failed, backing off
    D004_COOLDOWN_STARTED,
    /// Verification failed too many times in a row
    D004_LOCKED_OUT,
    /// Panic gesture, locked
    D004_PANIC_LOCK,

    // =========================================================================
    // D005: Recovery
    // =========================================================================
    /// Cooldown over (failures persist)
    D005_COOLDOWN_ELAPSED,
    /// Lock over, failures reset
    D005_LOCK_EXPIRED,
    /// Explicit exit
    D005_EXIT,
    /// Forced reset
    D005_RESET,

    // =========================================================================
    // D006: No effect
    // =========================================================================
    /// Event has no effect in this state
    D006_IGNORED,
    /// Panic gesture while panic handling is disabled
    D006_PANIC_DISABLED,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::D001_CHALLENGE_ISSUED => "D001_CHALLENGE_ISSUED",
            Self::D001_CHALLENGE_TIMEOUT => "D001_CHALLENGE_TIMEOUT",
            Self::D002_GESTURE_ACCEPTED => "D002_GESTURE_ACCEPTED",
            Self::D002_GESTURE_STALE => "D002_GESTURE_STALE",
            Self::D003_ADMITTED => "D003_ADMITTED",
            Self::D003_DECOY_ENTERED => "D003_DECOY_ENTERED",
            Self::D003_ADMISSION_TIMEOUT => "D003_ADMISSION_TIMEOUT",
            Self::D004_COOLDOWN_STARTED => "D004_COOLDOWN_STARTED",
            Self::D004_LOCKED_OUT => "D004_LOCKED_OUT",
            Self::D004_PANIC_LOCK => "D004_PANIC_LOCK",
            Self::D005_COOLDOWN_ELAPSED => "D005_COOLDOWN_ELAPSED",
            Self::D005_LOCK_EXPIRED => "D005_LOCK_EXPIRED",
            Self::D005_EXIT => "D005_EXIT",
            Self::D005_RESET => "D005_RESET",
            Self::D006_IGNORED => "D006_IGNORED",
            Self::D006_PANIC_DISABLED => "D006_PANIC_DISABLED",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::D001_CHALLENGE_ISSUED => "Knock heard - show me the sign",
            Self::D001_CHALLENGE_TIMEOUT => "Challenge expired",
            Self::D002_GESTURE_ACCEPTED => "Gesture received",
            Self::D002_GESTURE_STALE => "Gesture too late",
            Self::D003_ADMITTED => "Welcome in",
            Self::D003_DECOY_ENTERED => "Welcome in",
            Self::D003_ADMISSION_TIMEOUT => "Time's up",
            Self::D004_COOLDOWN_STARTED => "Wrong sign - wait",
            Self::D004_LOCKED_OUT => "Too many wrong signs - locked",
            Self::D004_PANIC_LOCK => "Door locked",
            Self::D005_COOLDOWN_ELAPSED => "Cooldown over",
            Self::D005_LOCK_EXPIRED => "Lock lifted",
            Self::D005_EXIT => "Left the room",
            Self::D005_RESET => "Doorman reset",
            Self::D006_IGNORED => "No effect",
            Self::D006_PANIC_DISABLED => "No effect",
        }
    }

    /// Guard rejection: the event left the context untouched
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::D002_GESTURE_STALE | Self::D006_IGNORED | Self::D006_PANIC_DISABLED
        )
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
