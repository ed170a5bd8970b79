//! Verifier record, fingerprints and the panic pattern

use serde::{Deserialize, Serialize};

use crate::types::Region;
use crate::{DEFAULT_PANIC_HOLD_MS, DEFAULT_PANIC_TAP_COUNT};

/// Persisted stand-in for the registered secret gesture.
///
/// Holds only a salted hash; raw gesture data is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verifier {
    /// HMAC-SHA256(salt, domain || 0 || fingerprint), 64 hex chars
    pub hash: String,
    /// 16 random bytes, 32 hex chars
    pub salt: String,
    /// Origin/context the secret is bound to
    pub domain: String,
    /// Milliseconds
    pub created_at: u64,
    pub version: u32,
}

/// Canonical, timing-free digest of a sequence's structure
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

// Fingerprints stand in for the secret; keep them out of debug output.
impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Fingerprint(..)")
    }
}

/// Region constraint inside a panic pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternRegion {
    Any,
    Center,
    Edge,
}

impl PatternRegion {
    pub fn matches(&self, region: Region) -> bool {
        match self {
            PatternRegion::Any => true,
            PatternRegion::Center => region == Region::Center,
            PatternRegion::Edge => region == Region::Edge,
        }
    }
}

/// Duress pattern: enough taps in one step plus a long enough hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanicPattern {
    pub tap_count: u32,
    pub tap_region: PatternRegion,
    pub hold_min_duration_ms: u32,
    pub hold_region: PatternRegion,
}

impl Default for PanicPattern {
    fn default() -> Self {
        Self {
            tap_count: DEFAULT_PANIC_TAP_COUNT,
            tap_region: PatternRegion::Center,
            hold_min_duration_ms: DEFAULT_PANIC_HOLD_MS,
            hold_region: PatternRegion::Edge,
        }
    }
}
