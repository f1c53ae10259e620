use super::memory_db::MemoryDb;
use crate::application_port::AuthError;
use crate::domain_model::{UserId, UserRecord};
use crate::domain_port::{StorageTx, UserRepo, UserWithCredentials};
use chrono::Utc;
use std::sync::Arc;

pub struct MemoryUserRepo {
    db: Arc<MemoryDb>,
}

impl MemoryUserRepo {
    pub fn new(db: Arc<MemoryDb>) -> Self {
        MemoryUserRepo { db }
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn create_in_tx<'t>(
        &self,
        _tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        username: &str,
        password_hash: &str,
        roles: &[String],
    ) -> Result<(), AuthError> {
        // The memory backend has no real transactions; the write lands
        // immediately and the surrounding commit is a no-op.
        self.db.insert_user(
            UserRecord {
                user_id,
                username: username.to_owned(),
                roles: roles.to_vec(),
                is_active: true,
                created_at: Utc::now(),
            },
            password_hash.to_owned(),
        )
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserWithCredentials>, AuthError> {
        let inner = self.db.lock()?;
        Ok(inner
            .users
            .values()
            .find(|u| u.record.username == username)
            .map(|u| UserWithCredentials {
                user: u.record.clone(),
                password_hash: u.password_hash.clone(),
            }))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        let inner = self.db.lock()?;
        Ok(inner.users.values().any(|u| u.record.username == username))
    }
}
