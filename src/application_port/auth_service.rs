use crate::domain_model::{UserId, UserRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user already exists")]
    UserExists,
    #[error("user not found")]
    UserNotFound,
    #[error("token invalid")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Clone)]
pub struct SignupInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user_id: UserId,
    pub tokens: SessionTokens,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct RefreshToken(pub String);

/// Raw token material returned to the caller. This is the only point at
/// which unhashed token values exist outside the caller's memory; the
/// store keeps hashes only.
#[derive(Debug, Clone, Serialize)]
pub struct SessionTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn signup(&self, request: SignupInput) -> Result<UserId, AuthError>;
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;
    /// Rotation: the presented refresh token's session is removed and a
    /// brand-new session is generated in its place.
    async fn refresh(&self, refresh_token: &str) -> Result<SessionTokens, AuthError>;
    /// Idempotent: signing out of an already-removed session succeeds.
    async fn logout(&self, token: &str) -> Result<(), AuthError>;
    /// Middleware contract: cryptographic validation first, then the
    /// store decides whether this specific token is still active.
    async fn resolve_access_token(&self, token: &str) -> Result<UserRecord, AuthError>;
}
