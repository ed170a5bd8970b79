//! Doorman context: the single invariant-bearing value the reducer evolves

use serde::{Deserialize, Serialize};

use crate::types::{CapabilityToken, Challenge, DoormanState};

/// Live doorman state.
///
/// Invariants after every transition:
/// - challenge is set iff state ∈ {CHALLENGED, VERIFYING}
/// - capability is set iff state == ADMITTED
/// - cooldown_ends_at iff COOLDOWN, lock_ends_at iff LOCKED,
///   admission_ends_at iff ADMITTED or DECOY
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoormanContext {
    pub state: DoormanState,
    pub challenge: Option<Challenge>,
    pub consecutive_failures: u32,
    pub cooldown_ends_at: Option<u64>,
    pub lock_ends_at: Option<u64>,
    pub admission_ends_at: Option<u64>,
    pub capability: Option<CapabilityToken>,
}

impl Default for DoormanContext {
    fn default() -> Self {
        Self::new()
    }
}

impl DoormanContext {
    /// Zero value: IDLE, everything empty
    pub fn new() -> Self {
        Self {
            state: DoormanState::Idle,
            challenge: None,
            consecutive_failures: 0,
            cooldown_ends_at: None,
            lock_ends_at: None,
            admission_ends_at: None,
            capability: None,
        }
    }

    /// Return to the zero value
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// First broken invariant, if any
    pub fn invariant_violation(&self) -> Option<&'static str> {
        let s = self.state;
        if self.challenge.is_some() != s.holds_challenge() {
            return Some("challenge must exist exactly in CHALLENGED/VERIFYING");
        }
        if self.capability.is_some() != (s == DoormanState::Admitted) {
            return Some("capability must exist exactly in ADMITTED");
        }
        if self.cooldown_ends_at.is_some() != (s == DoormanState::Cooldown) {
            return Some("cooldown_ends_at must exist exactly in COOLDOWN");
        }
        if self.lock_ends_at.is_some() != (s == DoormanState::Locked) {
            return Some("lock_ends_at must exist exactly in LOCKED");
        }
        if self.admission_ends_at.is_some() != s.holds_admission() {
            return Some("admission_ends_at must exist exactly in ADMITTED/DECOY");
        }
        None
    }

    pub fn is_consistent(&self) -> bool {
        self.invariant_violation().is_none()
    }
}
