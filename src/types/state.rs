//! Doorman state definitions

use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};

/// The seven states of the doorman. None is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DoormanState {
    /// Nothing happening, waiting for a knock
    Idle,
    /// Knock heard, challenge live, waiting for the gesture
    Challenged,
    /// Gesture received, verifier running
    Verifying,
    /// Speakeasy mode, capability issued
    Admitted,
    /// Harmless mode entered via the panic gesture
    Decoy,
    /// Backing off after a failure
    Cooldown,
    /// Too many failures (or panic lock)
    Locked,
}

impl DoormanState {
    pub const ALL: [DoormanState; 7] = [
        DoormanState::Idle,
        DoormanState::Challenged,
        DoormanState::Verifying,
        DoormanState::Admitted,
        DoormanState::Decoy,
        DoormanState::Cooldown,
        DoormanState::Locked,
    ];

    /// States that carry a live challenge
    pub fn holds_challenge(&self) -> bool {
        matches!(self, DoormanState::Challenged | DoormanState::Verifying)
    }

    /// States that carry an admission deadline
    pub fn holds_admission(&self) -> bool {
        matches!(self, DoormanState::Admitted | DoormanState::Decoy)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DoormanState::Idle => "IDLE",
            DoormanState::Challenged => "CHALLENGED",
            DoormanState::Verifying => "VERIFYING",
            DoormanState::Admitted => "ADMITTED",
            DoormanState::Decoy => "DECOY",
            DoormanState::Cooldown => "COOLDOWN",
            DoormanState::Locked => "LOCKED",
        }
    }

    /// Colored name for terminal display.
    ///
    /// DECOY renders exactly like ADMITTED so an onlooker cannot tell them apart.
    pub fn paint(&self) -> ColoredString {
        let shown = match self {
            DoormanState::Decoy => DoormanState::Admitted.name(),
            other => other.name(),
        };
        match self {
            DoormanState::Idle => shown.bright_black(),
            DoormanState::Challenged | DoormanState::Verifying => shown.yellow(),
            DoormanState::Admitted | DoormanState::Decoy => shown.green().bold(),
            DoormanState::Cooldown => shown.magenta(),
            DoormanState::Locked => shown.red().bold(),
        }
    }

    /// Glyph for state
    pub fn emoji(&self) -> &'static str {
        match self {
            DoormanState::Idle => "🚪",
            DoormanState::Challenged | DoormanState::Verifying => "👀",
            DoormanState::Admitted | DoormanState::Decoy => "🥃",
            DoormanState::Cooldown => "⏳",
            DoormanState::Locked => "🔒",
        }
    }
}

impl std::fmt::Display for DoormanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
