use crate::application_port::AuthError;
use crate::domain_model::{UserId, UserRecord};
use crate::domain_port::repo_tx::StorageTx;

#[derive(Debug, Clone)]
pub struct UserWithCredentials {
    pub user: UserRecord,
    pub password_hash: String,
}

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Insert account and credentials as one row. Duplicate usernames
    /// surface as `AuthError::UserExists`.
    async fn create_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        username: &str,
        password_hash: &str,
        roles: &[String],
    ) -> Result<(), AuthError>;

    /// Fetch account plus password hash by username (for login).
    async fn find_by_username(&self, username: &str)
    -> Result<Option<UserWithCredentials>, AuthError>;

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError>;
}
