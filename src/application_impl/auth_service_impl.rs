use crate::application_port::{
    AuthError, AuthService, CredentialHasher, LoginInput, LoginResult, SessionFactory,
    SessionTokens, SignupInput,
};
use crate::domain_model::{UserId, UserRecord};
use crate::domain_port::{SessionStore, TxManager, UserRepo};
use std::sync::Arc;
use uuid::Uuid;

pub struct RealAuthService {
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    session_factory: Arc<dyn SessionFactory>,
    session_store: Arc<dyn SessionStore>,
    tx_manager: Arc<dyn TxManager>,
    min_username_len: usize,
    min_password_len: usize,
}

impl RealAuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        session_factory: Arc<dyn SessionFactory>,
        session_store: Arc<dyn SessionStore>,
        tx_manager: Arc<dyn TxManager>,
    ) -> Self {
        Self {
            user_repo,
            credential_hasher,
            session_factory,
            session_store,
            tx_manager,
            min_username_len: 6,
            min_password_len: 6,
        }
    }

    fn validate_signup(&self, username: &str, password: &str) -> Result<(), AuthError> {
        if username.len() < self.min_username_len {
            return Err(AuthError::InvalidInput("username too short"));
        }
        if password.len() < self.min_password_len {
            return Err(AuthError::InvalidInput("password too short"));
        }
        Ok(())
    }

    #[inline]
    fn new_user_id() -> UserId {
        UserId(Uuid::new_v4())
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn signup(&self, request: SignupInput) -> Result<UserId, AuthError> {
        let SignupInput { username, password } = request;

        self.validate_signup(&username, &password)?;

        if self.user_repo.username_exists(&username).await? {
            return Err(AuthError::UserExists);
        }

        let password_hash = self.credential_hasher.hash_password(&password).await?;

        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let user_id = Self::new_user_id();

        self.user_repo
            .create_in_tx(tx.as_mut(), user_id, &username, &password_hash, &[])
            .await?;

        tx.commit()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(user_id)
    }

    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { username, password } = request;

        let rec = self
            .user_repo
            .find_by_username(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        // Deactivated accounts fail the same way as bad passwords so the
        // caller cannot probe account state.
        if !rec.user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        let ok = self
            .credential_hasher
            .verify_password(&password, &rec.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.session_factory.generate(&rec.user).await?;

        Ok(LoginResult {
            user_id: rec.user.user_id,
            tokens,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<SessionTokens, AuthError> {
        if refresh_token.is_empty() {
            return Err(AuthError::InvalidInput("refresh token must not be empty"));
        }

        if !self
            .session_factory
            .validate_refresh_token(refresh_token)
            .await
        {
            return Err(AuthError::TokenInvalid);
        }

        // The store decides whether this token still backs a live
        // session; a structurally valid but revoked token dies here.
        let user = self
            .session_store
            .find_user_by_refresh_token(refresh_token)
            .await?
            .ok_or(AuthError::TokenInvalid)?;

        self.session_store
            .remove_session(user.user_id, refresh_token)
            .await?;

        self.session_factory.generate(&user).await
    }

    async fn logout(&self, token: &str) -> Result<(), AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidInput("token must not be empty"));
        }

        let owner = match self.session_store.find_user_by_access_token(token).await? {
            Some(user) => Some(user),
            None => {
                self.session_store
                    .find_user_by_refresh_token(token)
                    .await?
            }
        };

        if let Some(user) = owner {
            self.session_store
                .remove_session(user.user_id, token)
                .await?;
        }

        Ok(())
    }

    async fn resolve_access_token(&self, token: &str) -> Result<UserRecord, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidInput("token must not be empty"));
        }

        if !self.session_factory.validate_access_token(token).await {
            return Err(AuthError::TokenInvalid);
        }

        self.session_store
            .find_user_by_access_token(token)
            .await?
            .ok_or(AuthError::TokenInvalid)
    }
}
