use crate::application_port::AuthError;
use crate::domain_model::{SessionRecord, UserId, UserRecord};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Shared in-process tables backing the memory adapters. One coarse lock
/// over everything keeps revoke-then-insert trivially atomic; this
/// backend exists for development and tests, not for multi-instance
/// deployments.
#[derive(Default)]
pub struct MemoryDb {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
pub(super) struct MemoryInner {
    pub users: HashMap<UserId, StoredUser>,
    pub sessions: Vec<SessionRecord>,
}

pub(super) struct StoredUser {
    pub record: UserRecord,
    pub password_hash: String,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn lock(&self) -> Result<MutexGuard<'_, MemoryInner>, AuthError> {
        self.inner
            .lock()
            .map_err(|_| AuthError::Store("memory store lock poisoned".to_string()))
    }

    /// Direct insertion path for tests and seeding.
    pub fn insert_user(&self, record: UserRecord, password_hash: String) -> Result<(), AuthError> {
        let mut inner = self.lock()?;
        if inner
            .users
            .values()
            .any(|u| u.record.username == record.username)
        {
            return Err(AuthError::UserExists);
        }
        inner.users.insert(
            record.user_id,
            StoredUser {
                record,
                password_hash,
            },
        );
        Ok(())
    }

    /// Number of stored sessions owned by `user_id`, live or not.
    pub fn session_count(&self, user_id: UserId) -> Result<usize, AuthError> {
        let inner = self.lock()?;
        Ok(inner
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .count())
    }
}
