//! Session token handling.
//!
//! The session token is the app's own persisted bearer credential, a JWT
//! issued by the backend. The client never verifies the signature; it only
//! reads the embedded `exp` claim to decide whether the token is still worth
//! presenting. Every decode step is defensive: anything malformed counts as
//! expired.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// Decode the `exp` claim of a JWT, in milliseconds since the epoch.
///
/// Returns `None` for anything that is not a well-formed three-part JWT with
/// a JSON payload carrying a numeric `exp` (seconds).
pub fn decode_expiry_ms(raw: &str) -> Option<i64> {
    let payload = raw.split('.').nth(1)?;
    // Some issuers pad the segment; the URL-safe alphabet is the same either way.
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp_secs = claims.get("exp")?.as_i64()?;
    exp_secs.checked_mul(1000)
}

/// The app's persisted bearer credential.
///
/// Opaque to everything except the expiry check below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw bearer string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw bearer string, for `Authorization` headers.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The embedded expiry in epoch milliseconds, if decodable.
    pub fn expiry_ms(&self) -> Option<i64> {
        decode_expiry_ms(&self.0)
    }

    /// Whether the token is still valid at `now_ms`.
    ///
    /// False at or past the expiry instant, and false for any token whose
    /// expiry cannot be decoded.
    pub fn is_valid(&self, now_ms: i64) -> bool {
        match self.expiry_ms() {
            Some(exp) => now_ms < exp,
            None => false,
        }
    }
}

impl From<String> for SessionToken {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
