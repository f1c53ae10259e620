use super::util::{downcast, is_dup_key};
use crate::application_port::AuthError;
use crate::domain_model::{UserId, UserRecord};
use crate::domain_port::{StorageTx, UserRepo, UserWithCredentials};
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }
}

#[inline]
pub(super) fn uid_as_bytes(id: &UserId) -> &[u8] {
    id.0.as_bytes()
}

#[inline]
pub(super) fn uid_from_bytes(id: &[u8]) -> Result<UserId, AuthError> {
    Ok(UserId(
        Uuid::from_slice(id).map_err(|e| AuthError::Store(e.to_string()))?,
    ))
}

pub(super) fn join_roles(roles: &[String]) -> String {
    roles.join(",")
}

pub(super) fn split_roles(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

pub(super) fn row_to_user(row: &MySqlRow) -> Result<UserRecord, AuthError> {
    let user_id_bytes: Vec<u8> = row
        .try_get("user_id")
        .map_err(|e| AuthError::Store(e.to_string()))?;
    let user_id = uid_from_bytes(&user_id_bytes)?;

    let username: String = row
        .try_get("username")
        .map_err(|e| AuthError::Store(e.to_string()))?;
    let roles: String = row
        .try_get("roles")
        .map_err(|e| AuthError::Store(e.to_string()))?;
    let is_active: bool = row
        .try_get("is_active")
        .map_err(|e| AuthError::Store(e.to_string()))?;
    let created_at: DateTime<Utc> = row
        .try_get("created_at")
        .map_err(|e| AuthError::Store(e.to_string()))?;

    Ok(UserRecord {
        user_id,
        username,
        roles: split_roles(&roles),
        is_active,
        created_at,
    })
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn create_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        username: &str,
        password_hash: &str,
        roles: &[String],
    ) -> Result<(), AuthError> {
        let tx = downcast(tx);

        sqlx::query(
            r#"
INSERT INTO user_account (user_id, username, password_hash, roles, is_active)
VALUES (?, ?, ?, ?, ?)
"#,
        )
        .bind(uid_as_bytes(&user_id))
        .bind(username)
        .bind(password_hash)
        .bind(join_roles(roles))
        .bind(true)
        .execute(tx.conn())
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                AuthError::UserExists
            } else {
                AuthError::Store(e.to_string())
            }
        })?;

        Ok(())
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserWithCredentials>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT user_id, username, password_hash, roles, is_active, created_at
FROM user_account
WHERE username = ?
"#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        row_opt
            .map(|row| {
                let password_hash: String = row
                    .try_get("password_hash")
                    .map_err(|e| AuthError::Store(e.to_string()))?;
                Ok(UserWithCredentials {
                    user: row_to_user(&row)?,
                    password_hash,
                })
            })
            .transpose()
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        let count: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM user_account WHERE username = ?"#)
                .bind(username)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(count > 0)
    }
}
