//! Core modules for the Doorman

pub mod crypto;
pub mod fingerprint;
pub mod recognizer;
pub mod registration;
pub mod machine;
pub mod scheduler;
pub mod store;
pub mod doorman;

pub use crypto::{Clock, ManualClock, OsRandom, RandomSource, SeededRandom, SystemClock};
pub use fingerprint::{create_verifier, fingerprint, is_panic_gesture, rhythm_hash, verify};
pub use recognizer::GestureRecognizer;
pub use registration::{RegistrationFlow, RegistrationStep};
pub use machine::{transition, Transition};
pub use scheduler::Scheduler;
pub use store::{FileStore, MemoryStore, VerifierStore};
pub use doorman::{Doorman, Observer, RegisterOutcome, SubscriptionId, TokenSigner};
