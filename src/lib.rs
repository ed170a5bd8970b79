//! Speakeasy Doorman: ritual gesture authentication
//!
//! Pointer input → GestureRecognizer → GestureSequence → Doorman → Verifier
//! → capability token, backoff, lockout or decoy.

pub mod core;
pub mod error;
pub mod types;

pub use error::{DoormanError, Result};

// =============================================================================
// DOORMAN TIMINGS [C]
// =============================================================================

/// How long a gesture submission stays valid after a knock (milliseconds)
pub const DEFAULT_CHALLENGE_WINDOW_MS: u64 = 30_000;

/// Failures in a row before the doorman locks
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// First cooldown after a failure; doubles with every further failure (milliseconds)
pub const DEFAULT_COOLDOWN_BASE_MS: u64 = 5_000;

/// Lockout duration after too many failures (milliseconds)
/// 5 minutes
pub const DEFAULT_LOCK_DURATION_MS: u64 = 300_000;

/// How long speakeasy mode lasts once admitted (milliseconds)
pub const DEFAULT_ADMISSION_TTL_MS: u64 = 900_000;

/// How long the decoy mode lasts (milliseconds)
pub const DEFAULT_DECOY_TTL_MS: u64 = 300_000;

/// Panic-triggered lockouts last this many times the normal lock
pub const DEFAULT_PANIC_LOCK_MULTIPLIER: u32 = 2;

// =============================================================================
// PANIC PATTERN [C] - 5 center taps + 2.5 s edge hold
// =============================================================================

pub const DEFAULT_PANIC_TAP_COUNT: u32 = 5;
pub const DEFAULT_PANIC_HOLD_MS: u32 = 2_500;

// =============================================================================
// RECOGNIZER THRESHOLDS [C]
// =============================================================================

pub const DEFAULT_TAP_MAX_DURATION_MS: u64 = 200;
pub const DEFAULT_TAP_MAX_MOVEMENT_PX: f64 = 10.0;
pub const DEFAULT_TAP_INTERVAL_MS: u64 = 300;
pub const DEFAULT_HOLD_MIN_DURATION_MS: u64 = 500;
pub const DEFAULT_DRAG_MIN_DISTANCE_PX: f64 = 30.0;

/// Pixels per millisecond
pub const DEFAULT_FLICK_MIN_VELOCITY: f64 = 0.5;

pub const DEFAULT_RADIAL_NOTCH_DEGREES: f64 = 30.0;

/// Fraction of the surface half-extent that counts as the center region
pub const DEFAULT_CENTER_REGION_RATIO: f64 = 0.5;

// =============================================================================
// FINGERPRINT DISCRETIZATION [C]
// =============================================================================

/// Hold durations are bucketed to this granularity before hashing
pub const HOLD_BUCKET_MS: u32 = 500;

/// Radial angles are rounded to this granularity before hashing
pub const ANGLE_BUCKET_DEG: f64 = 45.0;

/// Flick velocities are rounded to this granularity before hashing (px/ms)
pub const VELOCITY_BUCKET: f64 = 0.5;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";

/// Verifier record format version
pub const VERIFIER_VERSION: u32 = 1;
