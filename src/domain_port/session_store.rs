use crate::application_port::AuthError;
use crate::domain_model::{NewSession, UserId, UserRecord};

/// Durable mapping from issued tokens to sessions and owners; the sole
/// authority on whether a token is still active (not revoked, not
/// superseded). Lookups key on token hashes; raw values are hashed on the
/// way in and never persisted.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session for `user_id`. When the policy disallows
    /// multiple sessions, revoking the user's prior sessions and
    /// inserting the new one must happen as one atomic unit so that two
    /// concurrent sign-ins cannot both leave a live session behind.
    async fn add_session(&self, user_id: UserId, session: NewSession) -> Result<(), AuthError>;

    /// Delete the session whose access or refresh hash matches `token`.
    /// No-op when nothing matches; sign-out of an already-invalidated
    /// session is not an error.
    async fn remove_session(&self, user_id: UserId, token: &str) -> Result<(), AuthError>;

    /// Resolve the owner of a non-expired session by access token.
    async fn find_user_by_access_token(&self, token: &str)
    -> Result<Option<UserRecord>, AuthError>;

    /// Resolve the owner of a non-expired session by refresh token; used
    /// by the token-refresh flow.
    async fn find_user_by_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<UserRecord>, AuthError>;
}
