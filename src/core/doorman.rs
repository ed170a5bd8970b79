//! Doorman: owns the context and wires Verifier, reducer, scheduler and store
//!
//! Single writer. Every dispatch is applied atomically and observers see the
//! resulting context. Hosts that touch the doorman from several threads must
//! serialize access themselves (one mutex or one actor).

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::core::crypto::{random_hex, Clock, OsRandom, RandomSource, SystemClock};
use crate::core::fingerprint::{create_verifier, is_panic_gesture, verify};
use crate::core::machine::{self, transition};
use crate::core::registration::{RegistrationFlow, RegistrationStep};
use crate::core::scheduler::Scheduler;
use crate::core::store::VerifierStore;
use crate::error::Result;
use crate::types::{
    CapabilityToken, DoormanConfig, DoormanContext, DoormanEvent, DoormanState, FailureReason,
    GestureSequence, PanicAction, ReasonCode, TokenConstraints, TransitionOutput, Verifier,
};

/// Rhythm hashes remembered for replay telemetry
const RHYTHM_MEMORY: usize = 16;

/// Context observer
pub type Observer = Box<dyn Fn(&DoormanContext) + Send>;

/// Handle returned by `subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// External signer for capability tokens
pub trait TokenSigner: Send {
    /// Sign the canonical token bytes, returning an opaque signature
    fn sign(&self, payload: &[u8]) -> String;
}

impl<F> TokenSigner for F
where
    F: Fn(&[u8]) -> String + Send,
{
    fn sign(&self, payload: &[u8]) -> String {
        self(payload)
    }
}

/// Outcome of one registration capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// First capture taken; repeat the gesture to confirm
    AwaitingConfirmation,
    /// Both captures matched; verifier persisted
    Registered { created_at: u64 },
}

/// The doorman
pub struct Doorman {
    config: DoormanConfig,
    context: DoormanContext,
    verifier: Option<Verifier>,
    store: Box<dyn VerifierStore>,
    signer: Box<dyn TokenSigner>,
    random: Box<dyn RandomSource>,
    clock: Box<dyn Clock>,
    scheduler: Scheduler,
    registration: RegistrationFlow,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
    recent_rhythms: VecDeque<String>,
    replay_suspicions: u64,
}

impl std::fmt::Debug for Doorman {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Doorman")
            .field("state", &self.context.state)
            .field("registered", &self.verifier.is_some())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Doorman {
    /// Create a doorman on the system clock and OS entropy.
    ///
    /// Fails on invalid configuration or an unreadable verifier record.
    pub fn new(
        config: DoormanConfig,
        store: Box<dyn VerifierStore>,
        signer: Box<dyn TokenSigner>,
    ) -> Result<Self> {
        config.validate()?;
        let verifier = store.load(&config.domain)?;
        info!(domain = %config.domain, registered = verifier.is_some(), "doorman ready");
        Ok(Self {
            config,
            context: DoormanContext::new(),
            verifier,
            store,
            signer,
            random: Box::new(OsRandom),
            clock: Box::new(SystemClock),
            scheduler: Scheduler::new(),
            registration: RegistrationFlow::new(),
            observers: Vec::new(),
            next_subscription: 0,
            recent_rhythms: VecDeque::with_capacity(RHYTHM_MEMORY),
            replay_suspicions: 0,
        })
    }

    /// Swap the clock (tests, simulations)
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Swap the entropy source (tests, simulations)
    pub fn with_random(mut self, random: impl RandomSource + 'static) -> Self {
        self.random = Box::new(random);
        self
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Apply one event at the current clock time
    pub fn dispatch(&mut self, event: DoormanEvent) -> TransitionOutput {
        let now = self.clock.now_ms();
        let from = self.context.state;
        let step = transition(&self.context, &event, now, &self.config);
        debug_assert!(
            step.context.is_consistent(),
            "{:?}",
            step.context.invariant_violation()
        );

        if step.reason.is_rejection() {
            debug!(event = event.name(), state = %from, reason = step.reason.code(), "event rejected");
        } else {
            log_transition(event.name(), from, step.context.state, step.reason);
        }

        let changed = step.context != self.context;
        self.context = step.context;
        if changed {
            self.notify();
        }

        TransitionOutput::new(
            event.name(),
            from,
            self.context.state,
            step.reason,
            machine::time_remaining(&self.context, now),
            self.context.consecutive_failures,
        )
    }

    /// Knock: draw a fresh nonce and salt and request a challenge
    pub fn knock(&mut self) -> TransitionOutput {
        let timestamp = self.clock.now_ms();
        let nonce = random_hex(self.random.as_mut(), 32);
        let salt = random_hex(self.random.as_mut(), 16);
        self.dispatch(DoormanEvent::KnockDetected { timestamp, nonce, salt })
    }

    /// Submit a finished gesture: GESTURE_COMPLETE, then panic check or
    /// verification, all in one call.
    pub fn submit_gesture(&mut self, sequence: &GestureSequence) -> TransitionOutput {
        self.observe_rhythm(&sequence.rhythm_hash);

        let accepted = self.dispatch(DoormanEvent::GestureComplete {
            sequence: sequence.clone(),
        });
        // Only the submission that opened VERIFYING may be verified
        if accepted.reason != ReasonCode::D002_GESTURE_ACCEPTED {
            return accepted;
        }

        if self.config.panic_gesture_enabled
            && is_panic_gesture(sequence, &self.config.panic_pattern)
        {
            let decoy = self.config.panic_action == PanicAction::Decoy;
            return self.dispatch(DoormanEvent::PanicGesture { decoy });
        }

        let verified = self.verifier.as_ref().map(|v| verify(sequence, v));
        let event = match verified {
            None => DoormanEvent::VerificationFailure {
                reason: FailureReason::NotRegistered,
            },
            Some(true) => DoormanEvent::VerificationSuccess {
                capability: self.mint_capability(),
            },
            Some(false) => DoormanEvent::VerificationFailure {
                reason: FailureReason::Mismatch,
            },
        };
        self.dispatch(event)
    }

    /// Dispatch the timeout that is due now, if any
    pub fn tick(&mut self) -> Option<TransitionOutput> {
        let now = self.clock.now_ms();
        let event = self.scheduler.due_event(&self.context, now)?;
        Some(self.dispatch(event))
    }

    /// Force back to IDLE, dropping challenge, capability and pending registration
    pub fn reset(&mut self) {
        self.context.reset();
        self.registration.restart();
        info!(reason = ReasonCode::D005_RESET.code(), "doorman reset");
        self.notify();
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    /// Feed one registration capture (two-phase; see `RegistrationFlow`)
    pub fn register(&mut self, sequence: &GestureSequence) -> Result<RegisterOutcome> {
        let pattern = self
            .config
            .panic_gesture_enabled
            .then_some(&self.config.panic_pattern);

        match self.registration.submit(sequence, pattern)? {
            RegistrationStep::AwaitingConfirmation => Ok(RegisterOutcome::AwaitingConfirmation),
            RegistrationStep::Confirmed(fingerprint) => {
                let mut salt = [0u8; 16];
                self.random.fill(&mut salt);
                let now = self.clock.now_ms();
                let verifier = create_verifier(&fingerprint, &salt, &self.config.domain, now);
                self.store.save(&verifier)?;
                self.verifier = Some(verifier);
                info!(domain = %self.config.domain, "gesture registered");
                Ok(RegisterOutcome::Registered { created_at: now })
            }
        }
    }

    /// Forget the registered gesture. Returns whether one existed.
    pub fn clear_registration(&mut self) -> Result<bool> {
        self.registration.restart();
        let removed = self.store.remove(&self.config.domain)?;
        let had = self.verifier.take().is_some() || removed;
        if had {
            info!(domain = %self.config.domain, "registration cleared");
        }
        Ok(had)
    }

    /// Is a registration waiting for its confirming capture?
    pub fn registration_pending(&self) -> bool {
        self.registration.is_pending()
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn is_registered(&self) -> bool {
        self.verifier.is_some()
    }

    pub fn is_admitted(&self) -> bool {
        machine::is_admitted(&self.context)
    }

    /// Milliseconds until the current state's deadline (never negative)
    pub fn time_remaining(&self) -> Option<u64> {
        machine::time_remaining(&self.context, self.clock.now_ms())
    }

    /// When the scheduler should next call `tick`
    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline(&self.context)
    }

    pub fn context(&self) -> &DoormanContext {
        &self.context
    }

    pub fn state(&self) -> DoormanState {
        self.context.state
    }

    pub fn capability(&self) -> Option<&CapabilityToken> {
        self.context.capability.as_ref()
    }

    pub fn config(&self) -> &DoormanConfig {
        &self.config
    }

    pub fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Submissions whose rhythm repeated a recent one exactly
    pub fn replay_suspicions(&self) -> u64 {
        self.replay_suspicions
    }

    /// Replace the configuration wholesale.
    ///
    /// A live challenge keeps its expiry; only later knocks see a new window.
    pub fn set_config(&mut self, config: DoormanConfig) -> Result<()> {
        config.validate()?;
        if config.domain != self.config.domain {
            self.verifier = self.store.load(&config.domain)?;
            self.registration.restart();
        }
        self.config = config;
        info!(domain = %self.config.domain, "configuration replaced");
        Ok(())
    }

    // =========================================================================
    // OBSERVERS
    // =========================================================================

    pub fn subscribe(&mut self, observer: Observer) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, observer));
        id
    }

    /// Returns whether the subscription existed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    fn notify(&self) {
        for (_, observer) in &self.observers {
            observer(&self.context);
        }
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn mint_capability(&mut self) -> CapabilityToken {
        let now = self.clock.now_ms();
        let constraints =
            if self.config.token_max_uses.is_some() || self.config.token_allowed_origins.is_some() {
                Some(TokenConstraints {
                    max_uses: self.config.token_max_uses,
                    allowed_origins: self.config.token_allowed_origins.clone(),
                })
            } else {
                None
            };
        let mut token = CapabilityToken {
            token_id: random_hex(self.random.as_mut(), 16),
            issuer: self.config.token_issuer.clone(),
            scopes: self.config.token_scopes.clone(),
            not_before: now,
            expires_at: now.saturating_add(self.config.admission_ttl_ms),
            constraints,
            signature: String::new(),
        };
        token.signature = self.signer.sign(&token.signing_bytes());
        token
    }

    fn observe_rhythm(&mut self, rhythm_hash: &str) {
        if self.recent_rhythms.iter().any(|h| h == rhythm_hash) {
            self.replay_suspicions += 1;
            warn!(
                suspicions = self.replay_suspicions,
                "gesture rhythm repeats a recent attempt exactly, possible replay"
            );
        }
        if self.recent_rhythms.len() == RHYTHM_MEMORY {
            self.recent_rhythms.pop_front();
        }
        self.recent_rhythms.push_back(rhythm_hash.to_string());
    }
}

fn log_transition(event: &str, from: DoormanState, to: DoormanState, reason: ReasonCode) {
    match reason {
        ReasonCode::D004_LOCKED_OUT | ReasonCode::D004_PANIC_LOCK => {
            warn!(event, %from, %to, reason = reason.code(), "doorman locked");
        }
        _ => info!(event, %from, %to, reason = reason.code(), "doorman transition"),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::crypto::{ManualClock, SeededRandom};
    use crate::core::store::MemoryStore;
    use crate::types::{GestureStep, Region};
    use std::sync::{Arc, Mutex};

    fn signer() -> Box<dyn TokenSigner> {
        Box::new(|payload: &[u8]| hex::encode(crate::core::crypto::sha256(payload)))
    }

    fn doorman(clock: &ManualClock) -> Doorman {
        Doorman::new(DoormanConfig::default(), Box::new(MemoryStore::new()), signer())
            .unwrap()
            .with_clock(clock.clone())
            .with_random(SeededRandom::new(1))
    }

    fn secret(rhythm: &str) -> GestureSequence {
        GestureSequence::new(
            vec![
                GestureStep::Tap { count: 2, region: Region::Edge },
                GestureStep::Hold { duration_ms: 1_000, region: Region::Center },
            ],
            1_500,
            rhythm,
            0,
        )
    }

    fn registered(clock: &ManualClock) -> Doorman {
        let mut d = doorman(clock);
        d.register(&secret("r1")).unwrap();
        d.register(&secret("r2")).unwrap();
        d
    }

    #[test]
    fn test_register_two_phase() {
        let clock = ManualClock::new(5);
        let mut d = doorman(&clock);
        assert!(!d.is_registered());
        assert_eq!(d.register(&secret("a")).unwrap(), RegisterOutcome::AwaitingConfirmation);
        assert!(d.registration_pending());
        assert_eq!(
            d.register(&secret("b")).unwrap(),
            RegisterOutcome::Registered { created_at: 5 }
        );
        assert!(d.is_registered());
    }

    #[test]
    fn test_correct_gesture_admits_with_signed_token() {
        let clock = ManualClock::new(0);
        let mut d = registered(&clock);
        d.knock();
        clock.advance(2_000);
        let out = d.submit_gesture(&secret("live"));

        assert_eq!(out.to, DoormanState::Admitted);
        assert!(d.is_admitted());
        let token = d.capability().unwrap();
        assert_eq!(token.not_before, 2_000);
        assert_eq!(token.expires_at, 2_000 + d.config().admission_ttl_ms);
        assert_eq!(token.signature, hex::encode(crate::core::crypto::sha256(&token.signing_bytes())));
        assert_eq!(token.token_id.len(), 32);
    }

    #[test]
    fn test_wrong_gesture_cools_down() {
        let clock = ManualClock::new(0);
        let mut d = registered(&clock);
        d.knock();
        let wrong = GestureSequence::new(
            vec![GestureStep::Tap { count: 1, region: Region::Center }],
            100,
            "x",
            0,
        );
        let out = d.submit_gesture(&wrong);
        assert_eq!(out.to, DoormanState::Cooldown);
        assert_eq!(d.context().consecutive_failures, 1);
        assert_eq!(d.time_remaining(), Some(d.config().cooldown_base_ms));
    }

    #[test]
    fn test_unregistered_submission_fails() {
        let clock = ManualClock::new(0);
        let mut d = doorman(&clock);
        d.knock();
        assert_eq!(d.submit_gesture(&secret("x")).to, DoormanState::Cooldown);
    }

    #[test]
    fn test_submission_without_challenge_ignored() {
        let clock = ManualClock::new(0);
        let mut d = registered(&clock);
        let out = d.submit_gesture(&secret("x"));
        assert_eq!(out.to, DoormanState::Idle);
        assert_eq!(out.reason, ReasonCode::D006_IGNORED);
    }

    #[test]
    fn test_tick_fires_due_timeouts() {
        let clock = ManualClock::new(0);
        let mut d = registered(&clock);
        d.knock();
        assert!(d.tick().is_none());
        clock.advance(d.config().challenge_window_ms + 1);
        let out = d.tick().unwrap();
        assert_eq!(out.reason, ReasonCode::D001_CHALLENGE_TIMEOUT);
        assert_eq!(d.state(), DoormanState::Idle);
    }

    #[test]
    fn test_observers_see_changes_only() {
        let clock = ManualClock::new(0);
        let mut d = registered(&clock);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = d.subscribe(Box::new(move |ctx: &DoormanContext| sink.lock().unwrap().push(ctx.state)));

        d.knock();
        d.knock(); // ignored, no notification
        d.dispatch(DoormanEvent::ExitRequested);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![DoormanState::Challenged, DoormanState::Idle]
        );

        assert!(d.unsubscribe(id));
        assert!(!d.unsubscribe(id));
        d.knock();
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_repeated_rhythm_counts_as_suspicion() {
        let clock = ManualClock::new(0);
        let mut d = registered(&clock);
        d.knock();
        d.submit_gesture(&secret("same"));
        d.dispatch(DoormanEvent::ExitRequested);
        d.knock();
        d.submit_gesture(&secret("same"));
        assert_eq!(d.replay_suspicions(), 1);
        // Telemetry only: still admitted
        assert!(d.is_admitted());
    }

    #[test]
    fn test_clear_registration() {
        let clock = ManualClock::new(0);
        let mut d = registered(&clock);
        assert!(d.clear_registration().unwrap());
        assert!(!d.is_registered());
        assert!(!d.clear_registration().unwrap());
    }

    #[test]
    fn test_set_config_rejects_invalid_and_keeps_old() {
        let clock = ManualClock::new(0);
        let mut d = doorman(&clock);
        let bad = DoormanConfig { challenge_window_ms: 0, ..DoormanConfig::default() };
        assert!(d.set_config(bad).is_err());
        assert_eq!(d.config().challenge_window_ms, crate::DEFAULT_CHALLENGE_WINDOW_MS);
    }

    #[test]
    fn test_reset_drops_everything() {
        let clock = ManualClock::new(0);
        let mut d = registered(&clock);
        d.knock();
        d.submit_gesture(&secret("x"));
        d.reset();
        assert_eq!(*d.context(), DoormanContext::new());
        assert!(d.is_registered());
    }
}
