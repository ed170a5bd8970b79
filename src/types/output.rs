//! Output structures for terminal display

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DoormanState, ReasonCode};

/// Output structure for each dispatched event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionOutput {
    /// Wall-clock stamp for display
    pub timestamp: DateTime<Utc>,
    /// Event name
    pub event: String,
    pub from: DoormanState,
    pub to: DoormanState,
    pub reason: ReasonCode,
    /// Until the current state's deadline (milliseconds)
    pub time_remaining_ms: Option<u64>,
    pub consecutive_failures: u32,
    pub admitted: bool,
}

impl TransitionOutput {
    pub fn new(
        event: &str,
        from: DoormanState,
        to: DoormanState,
        reason: ReasonCode,
        time_remaining_ms: Option<u64>,
        consecutive_failures: u32,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            event: event.to_string(),
            from,
            to,
            reason,
            time_remaining_ms,
            consecutive_failures,
            admitted: to == DoormanState::Admitted,
        }
    }

    /// False for ignored and rejected events; the CLI dims those lines
    pub fn changed_state(&self) -> bool {
        self.from != self.to
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        format!(
            "{} {} | {} | {}",
            self.to.emoji(),
            self.to.paint(),
            format_remaining(self.time_remaining_ms),
            self.reason.description(),
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "event={} | from={} | to={} | remaining={} | failures={} | reason={}",
            self.event,
            self.from,
            self.to,
            format_remaining(self.time_remaining_ms),
            self.consecutive_failures,
            self.reason.code()
        )
    }
}

fn format_remaining(ms: Option<u64>) -> String {
    match ms {
        Some(ms) => format!("{:.1}s", ms as f64 / 1000.0),
        None => "-".to_string(),
    }
}
