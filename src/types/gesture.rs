//! Gesture model
//!
//! - GestureStep = one discrete motion (tap, hold, radial drag, flick)
//! - GestureSequence = ordered, finalized steps + timing digest
//! - PointerEvent = raw x,y,t input from the host surface

use serde::{Deserialize, Serialize};

/// Where on the capture surface a tap or hold landed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Center,
    Edge,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Center => "center",
            Region::Edge => "edge",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "center" | "c" => Ok(Region::Center),
            "edge" | "e" => Ok(Region::Edge),
            other => Err(format!("unknown region '{}'", other)),
        }
    }
}

/// Dominant axis of a flick (screen coordinates, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlickDirection {
    Up,
    Down,
    Left,
    Right,
}

impl FlickDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlickDirection::Up => "up",
            FlickDirection::Down => "down",
            FlickDirection::Left => "left",
            FlickDirection::Right => "right",
        }
    }

    /// Dominant axis of a velocity vector
    pub fn from_velocity(vx: f64, vy: f64) -> Self {
        if vx.abs() >= vy.abs() {
            if vx >= 0.0 {
                FlickDirection::Right
            } else {
                FlickDirection::Left
            }
        } else if vy >= 0.0 {
            FlickDirection::Down
        } else {
            FlickDirection::Up
        }
    }
}

impl std::str::FromStr for FlickDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" | "u" => Ok(FlickDirection::Up),
            "down" | "d" => Ok(FlickDirection::Down),
            "left" | "l" => Ok(FlickDirection::Left),
            "right" | "r" => Ok(FlickDirection::Right),
            other => Err(format!("unknown direction '{}'", other)),
        }
    }
}

/// One discrete gesture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GestureStep {
    Tap {
        count: u32,
        region: Region,
    },
    Hold {
        duration_ms: u32,
        region: Region,
    },
    RadialDrag {
        from_angle_deg: f64,
        to_angle_deg: f64,
        notches: u32,
    },
    Flick {
        direction: FlickDirection,
        velocity_px_per_ms: f64,
    },
}

impl GestureStep {
    /// Short kind label (for logs and terminal output)
    pub fn kind(&self) -> &'static str {
        match self {
            GestureStep::Tap { .. } => "tap",
            GestureStep::Hold { .. } => "hold",
            GestureStep::RadialDrag { .. } => "radial",
            GestureStep::Flick { .. } => "flick",
        }
    }
}

impl std::fmt::Display for GestureStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GestureStep::Tap { count, region } => write!(f, "tap x{} @{}", count, region),
            GestureStep::Hold { duration_ms, region } => {
                write!(f, "hold {}ms @{}", duration_ms, region)
            }
            GestureStep::RadialDrag { from_angle_deg, to_angle_deg, notches } => write!(
                f,
                "radial {:.0}°→{:.0}° ({} notches)",
                from_angle_deg, to_angle_deg, notches
            ),
            GestureStep::Flick { direction, velocity_px_per_ms } => {
                write!(f, "flick {} {:.2}px/ms", direction.as_str(), velocity_px_per_ms)
            }
        }
    }
}

/// A finalized gesture capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureSequence {
    /// Ordered steps (non-empty when produced by the recognizer)
    pub steps: Vec<GestureStep>,
    /// First step start to finalize (milliseconds)
    pub total_duration_ms: u64,
    /// SHA-256 of inter-step deltas, hex (anti-replay telemetry only)
    pub rhythm_hash: String,
    /// When the capture was finalized (milliseconds)
    pub timestamp: u64,
}

impl GestureSequence {
    pub fn new(
        steps: Vec<GestureStep>,
        total_duration_ms: u64,
        rhythm_hash: impl Into<String>,
        timestamp: u64,
    ) -> Self {
        Self {
            steps,
            total_duration_ms,
            rhythm_hash: rhythm_hash.into(),
            timestamp,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Pointer phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// Raw pointer sample relative to the capture surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub x: f64,
    pub y: f64,
    /// Milliseconds
    pub t: u64,
}

impl PointerEvent {
    pub fn down(x: f64, y: f64, t: u64) -> Self {
        Self { phase: PointerPhase::Down, x, y, t }
    }

    pub fn moved(x: f64, y: f64, t: u64) -> Self {
        Self { phase: PointerPhase::Move, x, y, t }
    }

    pub fn up(x: f64, y: f64, t: u64) -> Self {
        Self { phase: PointerPhase::Up, x, y, t }
    }

    pub fn cancel(t: u64) -> Self {
        Self { phase: PointerPhase::Cancel, x: 0.0, y: 0.0, t }
    }
}
