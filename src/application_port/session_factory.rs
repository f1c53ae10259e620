use crate::application_port::{AuthError, SessionTokens};
use crate::domain_model::UserRecord;

/// Mints and validates session token pairs.
///
/// Validation here is a pure signature/claims check with no store
/// round-trip, so the common "is this token structurally valid" question
/// avoids storage I/O. Revocation still works because callers consult the
/// session store separately wherever "is this specific token still
/// active" matters.
#[async_trait::async_trait]
pub trait SessionFactory: Send + Sync {
    /// Mint a new access/refresh pair for `user` and persist the session
    /// through the store. Under a single-session policy the store revokes
    /// all prior sessions of this user first.
    async fn generate(&self, user: &UserRecord) -> Result<SessionTokens, AuthError>;

    /// Verify signature, issuer, audience and expiry. Fails closed:
    /// malformed, expired or mis-signed input yields `false`, never an
    /// error.
    async fn validate_access_token(&self, token: &str) -> bool;

    /// Same contract, applied to refresh-token claims.
    async fn validate_refresh_token(&self, token: &str) -> bool;
}
