//! Core types for the doorman

mod challenge;
mod config;
mod context;
mod event;
mod gesture;
mod output;
mod reason;
mod state;
mod verifier;

pub use challenge::{CapabilityToken, Challenge, TokenConstraints};
pub use config::{DoormanConfig, PanicAction, RecognizerConfig};
pub use context::DoormanContext;
pub use event::{DoormanEvent, FailureReason};
pub use gesture::{FlickDirection, GestureSequence, GestureStep, PointerEvent, PointerPhase, Region};
pub use output::TransitionOutput;
pub use reason::ReasonCode;
pub use state::DoormanState;
pub use verifier::{Fingerprint, PanicPattern, PatternRegion, Verifier};
