use super::memory_db::MemoryDb;
use crate::application_port::AuthError;
use crate::domain_model::{
    NewSession, SessionPolicy, SessionRecord, UserId, UserRecord, token_hash_hex,
};
use crate::domain_port::SessionStore;
use chrono::Utc;
use std::sync::Arc;

#[derive(Clone, Copy)]
enum TokenKind {
    Access,
    Refresh,
}

fn session_matches(s: &SessionRecord, kind: TokenKind, hash: &str) -> bool {
    let now = Utc::now();
    match kind {
        TokenKind::Access => s.access_token_hash == hash && s.access_token_expires_at > now,
        TokenKind::Refresh => s.refresh_token_hash == hash && s.refresh_token_expires_at > now,
    }
}

pub struct MemorySessionStore {
    db: Arc<MemoryDb>,
    policy: Arc<SessionPolicy>,
}

impl MemorySessionStore {
    pub fn new(db: Arc<MemoryDb>, policy: Arc<SessionPolicy>) -> Self {
        MemorySessionStore { db, policy }
    }

    fn find_user_by_hash(
        &self,
        token: &str,
        kind: TokenKind,
    ) -> Result<Option<UserRecord>, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidInput("token must not be empty"));
        }

        let hash = token_hash_hex(token);
        let inner = self.db.lock()?;

        let owner = inner
            .sessions
            .iter()
            .find(|s| session_matches(s, kind, &hash))
            .map(|s| s.user_id);

        Ok(owner
            .and_then(|user_id| inner.users.get(&user_id))
            .filter(|u| u.record.is_active)
            .map(|u| u.record.clone()))
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn add_session(&self, user_id: UserId, session: NewSession) -> Result<(), AuthError> {
        let access_token_hash = token_hash_hex(&session.access_token);
        let refresh_token_hash = token_hash_hex(&session.refresh_token);

        // Single lock scope: the prior-session sweep and the insert are
        // observed together or not at all.
        let mut inner = self.db.lock()?;

        if !self.policy.allow_multiple_sessions {
            inner.sessions.retain(|s| s.user_id != user_id);
        }

        // Mirrors the unique indexes of the relational schema; a
        // collision implies an RNG or implementation fault.
        if inner.sessions.iter().any(|s| {
            s.access_token_hash == access_token_hash || s.refresh_token_hash == refresh_token_hash
        }) {
            return Err(AuthError::Store("duplicate token hash".to_string()));
        }

        inner.sessions.push(SessionRecord {
            user_id,
            access_token_hash,
            access_token_expires_at: session.access_token_expires_at,
            refresh_token_hash,
            refresh_token_expires_at: session.refresh_token_expires_at,
            created_at: Utc::now(),
        });

        Ok(())
    }

    async fn remove_session(&self, user_id: UserId, token: &str) -> Result<(), AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidInput("token must not be empty"));
        }

        let hash = token_hash_hex(token);
        let mut inner = self.db.lock()?;
        inner.sessions.retain(|s| {
            !(s.user_id == user_id
                && (s.access_token_hash == hash || s.refresh_token_hash == hash))
        });

        Ok(())
    }

    async fn find_user_by_access_token(
        &self,
        token: &str,
    ) -> Result<Option<UserRecord>, AuthError> {
        self.find_user_by_hash(token, TokenKind::Access)
    }

    async fn find_user_by_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<UserRecord>, AuthError> {
        self.find_user_by_hash(token, TokenKind::Refresh)
    }
}
