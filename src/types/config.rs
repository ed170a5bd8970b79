//! Doorman and recognizer configuration
//!
//! Loaded from TOML; every field falls back to the defaults in `lib.rs`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{DoormanError, Result};
use crate::types::PanicPattern;
use crate::{
    DEFAULT_ADMISSION_TTL_MS, DEFAULT_CENTER_REGION_RATIO, DEFAULT_CHALLENGE_WINDOW_MS,
    DEFAULT_COOLDOWN_BASE_MS, DEFAULT_DECOY_TTL_MS, DEFAULT_DRAG_MIN_DISTANCE_PX,
    DEFAULT_FLICK_MIN_VELOCITY, DEFAULT_HOLD_MIN_DURATION_MS, DEFAULT_LOCK_DURATION_MS,
    DEFAULT_MAX_CONSECUTIVE_FAILURES, DEFAULT_PANIC_LOCK_MULTIPLIER, DEFAULT_RADIAL_NOTCH_DEGREES,
    DEFAULT_TAP_INTERVAL_MS, DEFAULT_TAP_MAX_DURATION_MS, DEFAULT_TAP_MAX_MOVEMENT_PX,
};

/// What a non-decoy panic gesture does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanicAction {
    /// Lock for lock_duration_ms * panic_lock_multiplier
    Lock,
    /// Enter the decoy mode
    Decoy,
}

/// Gesture classification thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    pub tap_max_duration_ms: u64,
    pub tap_max_movement_px: f64,
    /// Taps closer than this merge into one step
    pub tap_interval_ms: u64,
    pub hold_min_duration_ms: u64,
    pub drag_min_distance_px: f64,
    /// Pixels per millisecond
    pub flick_min_velocity: f64,
    pub radial_notch_degrees: f64,
    /// Center region radius as a fraction of the surface half-extent
    pub center_region_ratio: f64,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            tap_max_duration_ms: DEFAULT_TAP_MAX_DURATION_MS,
            tap_max_movement_px: DEFAULT_TAP_MAX_MOVEMENT_PX,
            tap_interval_ms: DEFAULT_TAP_INTERVAL_MS,
            hold_min_duration_ms: DEFAULT_HOLD_MIN_DURATION_MS,
            drag_min_distance_px: DEFAULT_DRAG_MIN_DISTANCE_PX,
            flick_min_velocity: DEFAULT_FLICK_MIN_VELOCITY,
            radial_notch_degrees: DEFAULT_RADIAL_NOTCH_DEGREES,
            center_region_ratio: DEFAULT_CENTER_REGION_RATIO,
        }
    }
}

impl RecognizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tap_max_duration_ms == 0 {
            return Err(invalid("tap_max_duration_ms must be positive"));
        }
        if self.hold_min_duration_ms <= self.tap_max_duration_ms {
            return Err(invalid("hold_min_duration_ms must exceed tap_max_duration_ms"));
        }
        if !(self.tap_max_movement_px >= 0.0) {
            return Err(invalid("tap_max_movement_px must be non-negative"));
        }
        if !(self.drag_min_distance_px > self.tap_max_movement_px) {
            return Err(invalid("drag_min_distance_px must exceed tap_max_movement_px"));
        }
        if !(self.flick_min_velocity > 0.0) {
            return Err(invalid("flick_min_velocity must be positive"));
        }
        if !(self.radial_notch_degrees > 0.0 && self.radial_notch_degrees <= 360.0) {
            return Err(invalid("radial_notch_degrees must be in (0, 360]"));
        }
        if !(self.center_region_ratio > 0.0 && self.center_region_ratio <= 1.0) {
            return Err(invalid("center_region_ratio must be in (0, 1]"));
        }
        Ok(())
    }
}

/// Doorman configuration. Replaced wholesale via `Doorman::set_config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoormanConfig {
    pub challenge_window_ms: u64,
    pub max_consecutive_failures: u32,
    pub cooldown_base_ms: u64,
    pub lock_duration_ms: u64,
    pub admission_ttl_ms: u64,
    pub decoy_ttl_ms: u64,
    pub panic_gesture_enabled: bool,
    pub panic_action: PanicAction,
    pub panic_lock_multiplier: u32,
    pub panic_pattern: PanicPattern,
    /// Origin/context the verifier is bound to
    pub domain: String,
    pub token_issuer: String,
    pub token_scopes: Vec<String>,
    pub token_max_uses: Option<u32>,
    pub token_allowed_origins: Option<Vec<String>>,
    pub recognizer: RecognizerConfig,
}

impl Default for DoormanConfig {
    fn default() -> Self {
        Self {
            challenge_window_ms: DEFAULT_CHALLENGE_WINDOW_MS,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            cooldown_base_ms: DEFAULT_COOLDOWN_BASE_MS,
            lock_duration_ms: DEFAULT_LOCK_DURATION_MS,
            admission_ttl_ms: DEFAULT_ADMISSION_TTL_MS,
            decoy_ttl_ms: DEFAULT_DECOY_TTL_MS,
            panic_gesture_enabled: true,
            panic_action: PanicAction::Lock,
            panic_lock_multiplier: DEFAULT_PANIC_LOCK_MULTIPLIER,
            panic_pattern: PanicPattern::default(),
            domain: "speakeasy.local".to_string(),
            token_issuer: "doorman".to_string(),
            token_scopes: vec!["speakeasy".to_string()],
            token_max_uses: None,
            token_allowed_origins: None,
            recognizer: RecognizerConfig::default(),
        }
    }
}

impl DoormanConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: DoormanConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject configurations that would break the state machine
    pub fn validate(&self) -> Result<()> {
        if self.challenge_window_ms == 0 {
            return Err(invalid("challenge_window_ms must be positive"));
        }
        if self.max_consecutive_failures == 0 {
            return Err(invalid("max_consecutive_failures must be at least 1"));
        }
        if self.admission_ttl_ms == 0 || self.decoy_ttl_ms == 0 {
            return Err(invalid("admission and decoy ttl must be positive"));
        }
        if self.panic_lock_multiplier == 0 {
            return Err(invalid("panic_lock_multiplier must be at least 1"));
        }
        if self.panic_pattern.tap_count == 0 {
            return Err(invalid("panic_pattern.tap_count must be at least 1"));
        }
        if self.panic_pattern.hold_min_duration_ms == 0 {
            return Err(invalid("panic_pattern.hold_min_duration_ms must be positive"));
        }
        if self.domain.trim().is_empty() {
            return Err(invalid("domain must not be empty"));
        }
        if self.token_scopes.is_empty() {
            return Err(invalid("token_scopes must name at least one scope"));
        }
        self.recognizer.validate()
    }
}

fn invalid(msg: &str) -> DoormanError {
    DoormanError::InvalidConfig(msg.to_string())
}
