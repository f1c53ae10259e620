use crate::application_port::{
    AccessToken, AuthError, AuthService, LoginInput, LoginResult, RefreshToken, SessionTokens,
    SignupInput,
};
use crate::domain_model::{UserId, UserRecord};
use chrono::{Duration, Utc};

#[derive(Debug)]
pub struct FakeAuthService;

impl FakeAuthService {
    pub fn new() -> Self {
        Self
    }
}

// Minimal fake implementation for basic use only.
// Extend to simulate more error cases and configurable responses when needed.
#[async_trait::async_trait]
impl AuthService for FakeAuthService {
    async fn signup(&self, request: SignupInput) -> Result<UserId, AuthError> {
        Ok(fake_id(&request.username))
    }

    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        Ok(LoginResult {
            user_id: fake_id(&request.username),
            tokens: fake_tokens(&request.username),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<SessionTokens, AuthError> {
        if let Some(username) = refresh_token.strip_prefix("fake-refresh-token:") {
            Ok(fake_tokens(username))
        } else {
            Err(AuthError::TokenInvalid)
        }
    }

    async fn logout(&self, _token: &str) -> Result<(), AuthError> {
        Ok(())
    }

    async fn resolve_access_token(&self, token: &str) -> Result<UserRecord, AuthError> {
        if let Some(username) = token.strip_prefix("fake-access-token:") {
            Ok(fake_user(username))
        } else {
            Err(AuthError::TokenInvalid)
        }
    }
}

fn fake_id(username: &str) -> UserId {
    UserId(uuid::Uuid::new_v5(
        &uuid::Uuid::NAMESPACE_OID,
        username.as_bytes(),
    ))
}

fn fake_user(username: &str) -> UserRecord {
    UserRecord {
        user_id: fake_id(username),
        username: username.to_owned(),
        roles: Vec::new(),
        is_active: true,
        created_at: Utc::now(),
    }
}

fn fake_tokens(username: &str) -> SessionTokens {
    let now = Utc::now();
    SessionTokens {
        access_token: AccessToken(format!("fake-access-token:{}", username)),
        access_token_expires_at: now + Duration::days(1),
        refresh_token: RefreshToken(format!("fake-refresh-token:{}", username)),
        refresh_token_expires_at: now + Duration::days(7),
    }
}
