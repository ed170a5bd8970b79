//! Two-phase registration: capture A, capture B, commit only if they match
//!
//! Only A's fingerprint is held between phases; nothing is persisted until
//! the second capture confirms it.

use tracing::debug;

use crate::core::fingerprint::{fingerprint, is_panic_gesture};
use crate::error::{DoormanError, Result};
use crate::types::{Fingerprint, GestureSequence, PanicPattern};

/// Where a registration stands after a capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationStep {
    /// First capture stored, repeat the gesture
    AwaitingConfirmation,
    /// Both captures agree
    Confirmed(Fingerprint),
}

/// Registration dialog state
#[derive(Debug, Default)]
pub struct RegistrationFlow {
    first: Option<Fingerprint>,
}

impl RegistrationFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waiting for the confirming capture?
    pub fn is_pending(&self) -> bool {
        self.first.is_some()
    }

    /// Feed one capture.
    ///
    /// A mismatch (or any rejected capture) restarts the flow from phase one.
    pub fn submit(
        &mut self,
        sequence: &GestureSequence,
        panic_pattern: Option<&PanicPattern>,
    ) -> Result<RegistrationStep> {
        if sequence.is_empty() {
            self.restart();
            return Err(DoormanError::EmptySequence);
        }
        if let Some(pattern) = panic_pattern {
            if is_panic_gesture(sequence, pattern) {
                self.restart();
                return Err(DoormanError::PanicCollision);
            }
        }

        let candidate = fingerprint(sequence);
        match self.first.take() {
            None => {
                self.first = Some(candidate);
                debug!(steps = sequence.len(), "registration phase one captured");
                Ok(RegistrationStep::AwaitingConfirmation)
            }
            Some(first) if first == candidate => Ok(RegistrationStep::Confirmed(first)),
            Some(_) => Err(DoormanError::Mismatch),
        }
    }

    /// Drop any phase-one capture
    pub fn restart(&mut self) {
        self.first = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GestureStep, Region};

    fn seq(steps: Vec<GestureStep>) -> GestureSequence {
        GestureSequence::new(steps, 500, "00", 0)
    }

    fn secret() -> GestureSequence {
        seq(vec![
            GestureStep::Tap { count: 3, region: Region::Edge },
            GestureStep::Hold { duration_ms: 1_000, region: Region::Center },
        ])
    }

    #[test]
    fn test_matching_captures_confirm() {
        let mut flow = RegistrationFlow::new();
        assert_eq!(
            flow.submit(&secret(), None).unwrap(),
            RegistrationStep::AwaitingConfirmation
        );
        assert!(flow.is_pending());
        assert_eq!(
            flow.submit(&secret(), None).unwrap(),
            RegistrationStep::Confirmed(fingerprint(&secret()))
        );
        assert!(!flow.is_pending());
    }

    #[test]
    fn test_mismatch_restarts() {
        let mut flow = RegistrationFlow::new();
        flow.submit(&secret(), None).unwrap();
        let other = seq(vec![GestureStep::Tap { count: 1, region: Region::Edge }]);
        assert!(matches!(flow.submit(&other, None), Err(DoormanError::Mismatch)));
        assert!(!flow.is_pending());

        // Next capture starts over as phase one
        assert_eq!(
            flow.submit(&other, None).unwrap(),
            RegistrationStep::AwaitingConfirmation
        );
    }

    #[test]
    fn test_empty_sequence_rejected() {
        let mut flow = RegistrationFlow::new();
        assert!(matches!(flow.submit(&seq(vec![]), None), Err(DoormanError::EmptySequence)));
    }

    #[test]
    fn test_panic_collision_rejected() {
        let mut flow = RegistrationFlow::new();
        let panicky = seq(vec![
            GestureStep::Tap { count: 5, region: Region::Center },
            GestureStep::Hold { duration_ms: 3_000, region: Region::Edge },
        ]);
        let pattern = PanicPattern::default();
        assert!(matches!(
            flow.submit(&panicky, Some(&pattern)),
            Err(DoormanError::PanicCollision)
        ));
        assert!(!flow.is_pending());
    }
}
