use super::user_repo_mysql::{row_to_user, uid_as_bytes};
use crate::application_port::AuthError;
use crate::domain_model::{NewSession, SessionPolicy, UserId, UserRecord, token_hash_hex};
use crate::domain_port::SessionStore;
use chrono::Utc;
use sqlx::mysql::MySqlRow;
use sqlx::MySqlPool;
use std::sync::Arc;

/// Relational session store. Both token-hash columns carry unique
/// indexes (see schema.sql), so a hash collision surfaces as a store
/// error instead of silently merging two sessions.
pub struct MySqlSessionStore {
    pool: MySqlPool,
    policy: Arc<SessionPolicy>,
}

impl MySqlSessionStore {
    pub fn new(pool: MySqlPool, policy: Arc<SessionPolicy>) -> Self {
        MySqlSessionStore { pool, policy }
    }

    async fn find_user_by_hash(
        &self,
        sql: &'static str,
        token: &str,
    ) -> Result<Option<UserRecord>, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidInput("token must not be empty"));
        }

        let row_opt: Option<MySqlRow> = sqlx::query(sql)
            .bind(token_hash_hex(token))
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        row_opt.map(|row| row_to_user(&row)).transpose()
    }
}

const FIND_BY_ACCESS_SQL: &str = r#"
SELECT u.user_id, u.username, u.roles, u.is_active, u.created_at
FROM user_session s
JOIN user_account u ON u.user_id = s.user_id
WHERE s.access_token_hash = ? AND s.access_token_expires_at > ? AND u.is_active = 1
"#;

const FIND_BY_REFRESH_SQL: &str = r#"
SELECT u.user_id, u.username, u.roles, u.is_active, u.created_at
FROM user_session s
JOIN user_account u ON u.user_id = s.user_id
WHERE s.refresh_token_hash = ? AND s.refresh_token_expires_at > ? AND u.is_active = 1
"#;

#[async_trait::async_trait]
impl SessionStore for MySqlSessionStore {
    async fn add_session(&self, user_id: UserId, session: NewSession) -> Result<(), AuthError> {
        // Revoke-then-insert must be one unit of work: two concurrent
        // sign-ins under a single-session policy serialize on the row
        // locks here, so at most one prior-session sweep survives.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        if !self.policy.allow_multiple_sessions {
            sqlx::query(r#"DELETE FROM user_session WHERE user_id = ?"#)
                .bind(uid_as_bytes(&user_id))
                .execute(tx.as_mut())
                .await
                .map_err(|e| AuthError::Store(e.to_string()))?;
        }

        sqlx::query(
            r#"
INSERT INTO user_session
    (user_id, access_token_hash, access_token_expires_at, refresh_token_hash, refresh_token_expires_at)
VALUES (?, ?, ?, ?, ?)
"#,
        )
        .bind(uid_as_bytes(&user_id))
        .bind(token_hash_hex(&session.access_token))
        .bind(session.access_token_expires_at)
        .bind(token_hash_hex(&session.refresh_token))
        .bind(session.refresh_token_expires_at)
        .execute(tx.as_mut())
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(())
    }

    async fn remove_session(&self, user_id: UserId, token: &str) -> Result<(), AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidInput("token must not be empty"));
        }

        let hash = token_hash_hex(token);
        // Either half of the pair identifies the session; removing by
        // refresh token kills the access token too. Zero rows affected
        // is fine: sign-out is idempotent.
        sqlx::query(
            r#"
DELETE FROM user_session
WHERE user_id = ? AND (access_token_hash = ? OR refresh_token_hash = ?)
"#,
        )
        .bind(uid_as_bytes(&user_id))
        .bind(&hash)
        .bind(&hash)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(())
    }

    async fn find_user_by_access_token(
        &self,
        token: &str,
    ) -> Result<Option<UserRecord>, AuthError> {
        self.find_user_by_hash(FIND_BY_ACCESS_SQL, token).await
    }

    async fn find_user_by_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<UserRecord>, AuthError> {
        self.find_user_by_hash(FIND_BY_REFRESH_SQL, token).await
    }
}
