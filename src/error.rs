//! Error types
//!
//! Only configuration, storage and registration problems are errors.
//! Guard rejections and failed verifications are modeled as transitions.

use thiserror::Error;

/// Errors surfaced by the doorman crate
#[derive(Debug, Error)]
pub enum DoormanError {
    /// Malformed configuration (aborts construction)
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Registration attempted with a sequence that has no steps
    #[error("gesture sequence has no steps")]
    EmptySequence,

    /// Second registration capture did not match the first
    #[error("registration gestures do not match")]
    Mismatch,

    /// Secret would trigger the panic pattern
    #[error("gesture collides with the panic pattern")]
    PanicCollision,

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, DoormanError>;
