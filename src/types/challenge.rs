//! Challenge and capability token types

use serde::{Deserialize, Serialize};

/// Short-lived window opened by a knock.
///
/// One challenge is live at a time; it is dropped on any exit from
/// CHALLENGED/VERIFYING.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// 32 random bytes, 64 hex chars
    pub nonce: String,
    /// 16 random bytes, 32 hex chars
    pub salt: String,
    pub issued_at: u64,
    pub expires_at: u64,
}

impl Challenge {
    /// Is a gesture finished at `now` still inside the window?
    pub fn accepts_at(&self, now: u64) -> bool {
        now <= self.expires_at
    }
}

/// Optional usage limits carried by a capability
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_uses: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
}

/// Scoped, time-bound credential issued on successful verification.
///
/// The signature is produced externally and treated as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityToken {
    pub token_id: String,
    pub issuer: String,
    pub scopes: Vec<String>,
    pub not_before: u64,
    pub expires_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<TokenConstraints>,
    pub signature: String,
}

/// Field view that gets signed (everything except the signature)
#[derive(Serialize)]
struct SigningView<'a> {
    token_id: &'a str,
    issuer: &'a str,
    scopes: &'a [String],
    not_before: u64,
    expires_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    constraints: Option<&'a TokenConstraints>,
}

impl CapabilityToken {
    /// Valid at `now`: not_before <= now < expires_at
    pub fn is_valid_at(&self, now: u64) -> bool {
        self.not_before <= now && now < self.expires_at
    }

    /// Canonical bytes a signer signs
    pub fn signing_bytes(&self) -> Vec<u8> {
        let view = SigningView {
            token_id: &self.token_id,
            issuer: &self.issuer,
            scopes: &self.scopes,
            not_before: self.not_before,
            expires_at: self.expires_at,
            constraints: self.constraints.as_ref(),
        };
        // Only strings, integers and vectors: serialization cannot fail.
        serde_json::to_vec(&view).unwrap_or_default()
    }
}
