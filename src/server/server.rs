use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::{SessionPolicy, load_or_generate_signing_key};
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::settings::Settings;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let signing_key = load_or_generate_signing_key(
            settings.session.secret.as_deref(),
            &settings.session.key_file,
        )?;
        let policy = Arc::new(SessionPolicy::try_new(
            signing_key,
            &settings.session.issuer,
            &settings.session.audience,
            Duration::from_secs(settings.session.access_token_expires_in_secs),
            Duration::from_secs(settings.session.refresh_token_expires_in_secs),
            settings.session.allow_multiple_sessions,
        )?);

        // Backends are resolved once at startup; an unknown name is a
        // fatal configuration error, not a runtime fallback.
        let (session_store, user_repo, tx_manager, pool): (
            Arc<dyn SessionStore>,
            Arc<dyn UserRepo>,
            Arc<dyn TxManager>,
            Option<Pool<MySql>>,
        ) = match settings.store.backend.as_str() {
            "memory" => {
                let db = Arc::new(MemoryDb::new());
                (
                    Arc::new(MemorySessionStore::new(db.clone(), policy.clone())),
                    Arc::new(MemoryUserRepo::new(db)),
                    Arc::new(MemoryTxManager::new()),
                    None,
                )
            }
            "mysql" => {
                let dsn = settings.store.mysql_dsn.as_deref().ok_or_else(|| {
                    anyhow::anyhow!("store.mysql_dsn is required for the mysql backend")
                })?;
                let pool = Pool::<MySql>::connect(dsn).await?;
                (
                    Arc::new(MySqlSessionStore::new(pool.clone(), policy.clone())),
                    Arc::new(MySqlUserRepo::new(pool.clone())),
                    Arc::new(MySqlTxManager::new(pool.clone())),
                    Some(pool),
                )
            }
            other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        };

        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);
        let session_factory: Arc<dyn SessionFactory> =
            Arc::new(JwtSessionFactory::new(policy, session_store.clone()));

        let auth_service: Arc<dyn AuthService> = match settings.auth.backend.as_str() {
            "fake" => Arc::new(FakeAuthService::new()),
            "real" => Arc::new(RealAuthService::new(
                user_repo,
                credential_hasher,
                session_factory,
                session_store,
                tx_manager,
            )),
            other => return Err(anyhow::anyhow!("Unknown auth backend: {}", other)),
        };

        Ok(Server { auth_service, pool })
    }

    pub async fn shutdown(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
        tracing::info!("server resources released");
    }
}
