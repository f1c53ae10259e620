use crate::domain_model::UserId;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// SHA-256 hex digest of a raw token. Stores persist and look up sessions
/// by this value only; raw tokens never reach the database.
pub fn token_hash_hex(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Freshly minted token material handed from the factory to the store.
/// Tokens are still raw here; the store hashes them before persisting.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
}

/// The persisted unit. Immutable once created; the only mutation is
/// deletion (revocation), so there is no partial-update primitive.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub user_id: UserId,
    pub access_token_hash: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_hash: String,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Where a stored session sits relative to its two expiry windows.
/// Revocation is not a state here: a revoked session is simply absent
/// from the store. There is no way back to `Active` except a new session.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SessionState {
    /// Both tokens inside their windows.
    Active,
    /// Access token past expiry, refresh token still valid. The caller
    /// should go through the refresh flow.
    AccessExpired,
    /// Both tokens past expiry. The caller must re-authenticate.
    Expired,
}

impl SessionRecord {
    pub fn state_at(&self, now: DateTime<Utc>) -> SessionState {
        if now < self.access_token_expires_at {
            SessionState::Active
        } else if now < self.refresh_token_expires_at {
            SessionState::AccessExpired
        } else {
            SessionState::Expired
        }
    }
}
