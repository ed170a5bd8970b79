//! Timer boundary: turns elapsed time into timeout events
//!
//! The reducer never schedules anything. A host loop asks the scheduler which
//! timeout (if any) is due and dispatches it, or sleeps until `next_deadline`.

use crate::core::machine::deadline;
use crate::types::{DoormanContext, DoormanEvent, DoormanState};

/// Stateless deadline observer
#[derive(Debug, Default, Clone, Copy)]
pub struct Scheduler;

impl Scheduler {
    pub fn new() -> Self {
        Self
    }

    /// Timeout event whose deadline has passed at `now`.
    ///
    /// The challenge times out strictly after `expires_at`, since a gesture at
    /// exactly `expires_at` is still accepted. The other deadlines fire on arrival.
    pub fn due_event(&self, ctx: &DoormanContext, now: u64) -> Option<DoormanEvent> {
        let at = deadline(ctx)?;
        match ctx.state {
            DoormanState::Challenged if now > at => Some(DoormanEvent::ChallengeTimeout),
            DoormanState::Cooldown if now >= at => Some(DoormanEvent::CooldownElapsed),
            DoormanState::Locked if now >= at => Some(DoormanEvent::LockExpired),
            DoormanState::Admitted | DoormanState::Decoy if now >= at => {
                Some(DoormanEvent::AdmissionTimeout)
            }
            _ => None,
        }
    }

    /// When the next timeout could become due
    pub fn next_deadline(&self, ctx: &DoormanContext) -> Option<u64> {
        match ctx.state {
            // VERIFYING resolves synchronously; it has no timeout of its own
            DoormanState::Idle | DoormanState::Verifying => None,
            DoormanState::Challenged => deadline(ctx).map(|d| d.saturating_add(1)),
            _ => deadline(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Challenge;

    fn challenged(expires_at: u64) -> DoormanContext {
        DoormanContext {
            state: DoormanState::Challenged,
            challenge: Some(Challenge {
                nonce: String::new(),
                salt: String::new(),
                issued_at: 0,
                expires_at,
            }),
            ..DoormanContext::new()
        }
    }

    #[test]
    fn test_challenge_times_out_after_expiry() {
        let s = Scheduler::new();
        let ctx = challenged(1_000);
        assert_eq!(s.due_event(&ctx, 1_000), None);
        assert_eq!(s.due_event(&ctx, 1_001), Some(DoormanEvent::ChallengeTimeout));
        assert_eq!(s.next_deadline(&ctx), Some(1_001));
    }

    #[test]
    fn test_cooldown_and_lock_fire_on_arrival() {
        let s = Scheduler::new();
        let cooldown = DoormanContext {
            state: DoormanState::Cooldown,
            cooldown_ends_at: Some(500),
            ..DoormanContext::new()
        };
        assert_eq!(s.due_event(&cooldown, 499), None);
        assert_eq!(s.due_event(&cooldown, 500), Some(DoormanEvent::CooldownElapsed));

        let locked = DoormanContext {
            state: DoormanState::Locked,
            lock_ends_at: Some(900),
            ..DoormanContext::new()
        };
        assert_eq!(s.due_event(&locked, 900), Some(DoormanEvent::LockExpired));
    }

    #[test]
    fn test_decoy_times_out_like_admission() {
        let s = Scheduler::new();
        let decoy = DoormanContext {
            state: DoormanState::Decoy,
            admission_ends_at: Some(10),
            ..DoormanContext::new()
        };
        assert_eq!(s.due_event(&decoy, 10), Some(DoormanEvent::AdmissionTimeout));
    }

    #[test]
    fn test_idle_has_nothing_due() {
        let s = Scheduler::new();
        assert_eq!(s.due_event(&DoormanContext::new(), u64::MAX), None);
        assert_eq!(s.next_deadline(&DoormanContext::new()), None);
    }
}
