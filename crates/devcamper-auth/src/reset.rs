//! Single-use password reset tokens.
//!
//! The raw token is 20 random bytes, hex-encoded, and exists only in the
//! reset link. The user record stores its SHA-256 digest and an expiry in
//! epoch milliseconds. Consumption is a conditional update on the store that
//! matches both and clears them in the same write.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

pub const RESET_TOKEN_TTL_MINUTES: i64 = 10;

const RESET_TOKEN_BYTES: usize = 20;

/// A freshly minted reset token.
///
/// `raw` goes to the user; `hash` and `expires_at_ms` go to the store.
#[derive(Clone, PartialEq, Eq)]
pub struct ResetToken {
    pub raw: String,
    pub hash: String,
    pub expires_at_ms: i64,
}

impl std::fmt::Debug for ResetToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetToken")
            .field("raw", &"<redacted>")
            .field("hash", &self.hash)
            .field("expires_at_ms", &self.expires_at_ms)
            .finish()
    }
}

pub fn create_reset_token(now: DateTime<Utc>) -> ResetToken {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let raw = hex::encode(bytes);

    ResetToken {
        hash: hash_reset_token(&raw),
        expires_at_ms: (now + Duration::minutes(RESET_TOKEN_TTL_MINUTES)).timestamp_millis(),
        raw,
    }
}

/// Hex SHA-256 digest of a raw reset token.
pub fn hash_reset_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}
