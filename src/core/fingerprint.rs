//! Fingerprints, verifier hashing and panic detection
//!
//! - fingerprint = SHA-256 of a canonical, timestamp-free step encoding
//! - verifier hash = HMAC-SHA256(salt, domain || 0x00 || fingerprint)
//! - comparison is constant time over equal-length buffers

use subtle::ConstantTimeEq;

use crate::core::crypto::{hmac_sha256, sha256};
use crate::types::{
    Fingerprint, GestureSequence, GestureStep, PanicPattern, Region, Verifier,
};
use crate::{ANGLE_BUCKET_DEG, HOLD_BUCKET_MS, VELOCITY_BUCKET, VERIFIER_VERSION};

/// Canonical encoding version, bumped if discretization ever changes
const CANONICAL_PREFIX: &str = "gesture-v1";

/// Canonical encoding of the structural parts of a sequence
pub fn canonical_encoding(steps: &[GestureStep]) -> String {
    let mut out = String::from(CANONICAL_PREFIX);
    for step in steps {
        out.push('|');
        out.push_str(&canonical_step(step));
    }
    out
}

fn canonical_step(step: &GestureStep) -> String {
    match step {
        GestureStep::Tap { count, region } => format!("T{}{}", count, region_code(*region)),
        GestureStep::Hold { duration_ms, region } => {
            format!("H{}{}", hold_bucket(*duration_ms), region_code(*region))
        }
        GestureStep::RadialDrag { from_angle_deg, to_angle_deg, notches } => format!(
            "R{}:{}:{}",
            angle_bucket(*from_angle_deg),
            angle_bucket(*to_angle_deg),
            notches
        ),
        GestureStep::Flick { direction, velocity_px_per_ms } => format!(
            "F{}{}",
            direction.as_str(),
            velocity_bucket(*velocity_px_per_ms)
        ),
    }
}

fn region_code(region: Region) -> char {
    match region {
        Region::Center => 'c',
        Region::Edge => 'e',
    }
}

/// Nearest HOLD_BUCKET_MS multiple, as a bucket index
fn hold_bucket(duration_ms: u32) -> u32 {
    duration_ms.saturating_add(HOLD_BUCKET_MS / 2) / HOLD_BUCKET_MS
}

/// Angle rounded to ANGLE_BUCKET_DEG and folded into [0, 360)
fn angle_bucket(deg: f64) -> u32 {
    if !deg.is_finite() {
        return 0;
    }
    let rounded = (deg / ANGLE_BUCKET_DEG).round() * ANGLE_BUCKET_DEG;
    rounded.rem_euclid(360.0) as u32
}

fn velocity_bucket(v: f64) -> u32 {
    if !v.is_finite() || v <= 0.0 {
        return 0;
    }
    (v / VELOCITY_BUCKET).round() as u32
}

/// Structural fingerprint of a sequence (ignores all timing)
pub fn fingerprint(sequence: &GestureSequence) -> Fingerprint {
    Fingerprint(sha256(canonical_encoding(&sequence.steps).as_bytes()))
}

/// Digest of inter-step timing deltas, hex
pub fn rhythm_hash(step_starts: &[u64]) -> String {
    let mut bytes = Vec::with_capacity(step_starts.len() * 8);
    for pair in step_starts.windows(2) {
        bytes.extend_from_slice(&pair[1].saturating_sub(pair[0]).to_be_bytes());
    }
    hex::encode(sha256(&bytes))
}

/// KDF binding a fingerprint to a salt and a domain
pub fn derive_verifier_hash(salt: &[u8], domain: &str, fingerprint: &Fingerprint) -> [u8; 32] {
    let mut msg = Vec::with_capacity(domain.len() + 1 + 32);
    msg.extend_from_slice(domain.as_bytes());
    msg.push(0);
    msg.extend_from_slice(fingerprint.as_bytes());
    hmac_sha256(salt, &msg)
}

/// Build a verifier record from a confirmed fingerprint and a fresh salt
pub fn create_verifier(
    fingerprint: &Fingerprint,
    salt: &[u8; 16],
    domain: &str,
    created_at: u64,
) -> Verifier {
    let hash = derive_verifier_hash(salt, domain, fingerprint);
    Verifier {
        hash: hex::encode(hash),
        salt: hex::encode(salt),
        domain: domain.to_string(),
        created_at,
        version: VERIFIER_VERSION,
    }
}

/// Does `sequence` reproduce the secret behind `verifier`?
pub fn verify(sequence: &GestureSequence, verifier: &Verifier) -> bool {
    let Ok(salt) = hex::decode(&verifier.salt) else {
        return false;
    };
    let Ok(expected) = hex::decode(&verifier.hash) else {
        return false;
    };
    let actual = derive_verifier_hash(&salt, &verifier.domain, &fingerprint(sequence));
    constant_time_eq(&actual, &expected)
}

/// Equal-length buffers compare in constant time; length itself is not secret
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    bool::from(a.ct_eq(b))
}

/// Any qualifying tap AND any qualifying hold, anywhere in the sequence
pub fn is_panic_gesture(sequence: &GestureSequence, pattern: &PanicPattern) -> bool {
    let tap_hit = sequence.steps.iter().any(|step| match step {
        GestureStep::Tap { count, region } => {
            *count >= pattern.tap_count && pattern.tap_region.matches(*region)
        }
        _ => false,
    });
    let hold_hit = sequence.steps.iter().any(|step| match step {
        GestureStep::Hold { duration_ms, region } => {
            *duration_ms >= pattern.hold_min_duration_ms && pattern.hold_region.matches(*region)
        }
        _ => false,
    });
    tap_hit && hold_hit
}

// =============================================================================
// TESTS
// =============================================================================
