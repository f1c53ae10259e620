use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use std::sync::Arc;
use std::time::Duration;
use turnstile::application_impl::JwtSessionFactory;
use turnstile::application_port::{SessionFactory, SessionTokens};
use turnstile::domain_model::{SessionPolicy, UserId, UserRecord};
use turnstile::domain_port::SessionStore;
use turnstile::infra_memory::{MemoryDb, MemorySessionStore};

const SIGNING_KEY: &[u8] = b"session-lifecycle-test-key";

fn policy_with_key(signing_key: &[u8], allow_multiple_sessions: bool) -> Arc<SessionPolicy> {
    Arc::new(
        SessionPolicy::try_new(
            signing_key.to_vec(),
            "https://auth.test",
            "test-clients",
            Duration::from_secs(900),
            Duration::from_secs(3600),
            allow_multiple_sessions,
        )
        .unwrap(),
    )
}

struct Fixture {
    db: Arc<MemoryDb>,
    store: Arc<MemorySessionStore>,
    factory: JwtSessionFactory,
    user: UserRecord,
}

fn fixture(allow_multiple_sessions: bool) -> Fixture {
    let policy = policy_with_key(SIGNING_KEY, allow_multiple_sessions);
    let db = Arc::new(MemoryDb::new());
    let store = Arc::new(MemorySessionStore::new(db.clone(), policy.clone()));
    let factory = JwtSessionFactory::new(policy, store.clone());

    let user = UserRecord {
        user_id: UserId(uuid::Uuid::new_v4()),
        username: "alice-wonder".to_string(),
        roles: vec!["member".to_string()],
        is_active: true,
        created_at: Utc::now(),
    };
    db.insert_user(user.clone(), "phc-hash-not-used-here".to_string())
        .unwrap();

    Fixture {
        db,
        store,
        factory,
        user,
    }
}

async fn generate(fx: &Fixture) -> SessionTokens {
    fx.factory.generate(&fx.user).await.unwrap()
}

#[tokio::test]
async fn access_expiry_precedes_refresh_expiry() {
    let fx = fixture(true);
    let tokens = generate(&fx).await;
    assert!(tokens.access_token_expires_at < tokens.refresh_token_expires_at);
}

#[tokio::test]
async fn fresh_tokens_validate() {
    let fx = fixture(true);
    let tokens = generate(&fx).await;
    assert!(fx.factory.validate_access_token(&tokens.access_token.0).await);
    assert!(
        fx.factory
            .validate_refresh_token(&tokens.refresh_token.0)
            .await
    );
}

#[tokio::test]
async fn expired_access_token_fails_closed() {
    #[derive(serde::Serialize)]
    struct StaleClaims {
        sub: String,
        exp: i64,
        iat: i64,
        iss: String,
        aud: String,
        jti: String,
        roles: Vec<String>,
    }

    let fx = fixture(true);
    let iat = Utc::now() - chrono::Duration::hours(3);
    let exp = Utc::now() - chrono::Duration::hours(2);
    let claims = StaleClaims {
        sub: fx.user.user_id.to_string(),
        exp: exp.timestamp(),
        iat: iat.timestamp(),
        iss: "https://auth.test".to_string(),
        aud: "test-clients".to_string(),
        jti: uuid::Uuid::new_v4().to_string(),
        roles: vec![],
    };
    let stale = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SIGNING_KEY),
    )
    .unwrap();

    assert!(!fx.factory.validate_access_token(&stale).await);
}

#[tokio::test]
async fn missigned_and_malformed_tokens_fail_closed() {
    let fx = fixture(true);
    let other = fixture(true);
    // `other` shares issuer/audience but signs with a different key.
    let other_policy = policy_with_key(b"some-other-signing-key", true);
    let other_factory = JwtSessionFactory::new(other_policy, other.store.clone());
    let foreign = other_factory.generate(&other.user).await.unwrap();

    assert!(
        !fx.factory
            .validate_access_token(&foreign.access_token.0)
            .await
    );
    assert!(!fx.factory.validate_access_token("").await);
    assert!(!fx.factory.validate_access_token("not.a.jwt").await);
}

#[tokio::test]
async fn generated_tokens_round_trip_to_owner() {
    let fx = fixture(true);
    let tokens = generate(&fx).await;

    let by_access = fx
        .store
        .find_user_by_access_token(&tokens.access_token.0)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_access.user_id, fx.user.user_id);

    let by_refresh = fx
        .store
        .find_user_by_refresh_token(&tokens.refresh_token.0)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_refresh.user_id, fx.user.user_id);
    assert_eq!(by_refresh.roles, fx.user.roles);
}

#[tokio::test]
async fn single_session_policy_revokes_prior_session() {
    let fx = fixture(false);
    let first = generate(&fx).await;
    let second = generate(&fx).await;

    assert!(
        fx.store
            .find_user_by_access_token(&first.access_token.0)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        fx.store
            .find_user_by_access_token(&second.access_token.0)
            .await
            .unwrap()
            .is_some()
    );
    assert_eq!(fx.db.session_count(fx.user.user_id).unwrap(), 1);
}

#[tokio::test]
async fn multi_session_policy_keeps_sessions_independent() {
    let fx = fixture(true);
    let first = generate(&fx).await;
    let second = generate(&fx).await;
    assert_eq!(fx.db.session_count(fx.user.user_id).unwrap(), 2);

    fx.store
        .remove_session(fx.user.user_id, &first.access_token.0)
        .await
        .unwrap();

    assert!(
        fx.store
            .find_user_by_access_token(&first.access_token.0)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        fx.store
            .find_user_by_access_token(&second.access_token.0)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn remove_session_is_idempotent() {
    let fx = fixture(true);
    let tokens = generate(&fx).await;

    fx.store
        .remove_session(fx.user.user_id, &tokens.access_token.0)
        .await
        .unwrap();
    // Second removal of the same session: silently fine.
    fx.store
        .remove_session(fx.user.user_id, &tokens.access_token.0)
        .await
        .unwrap();
}

#[tokio::test]
async fn removal_by_refresh_token_revokes_whole_session() {
    let fx = fixture(true);
    let tokens = generate(&fx).await;

    assert!(
        fx.store
            .find_user_by_access_token(&tokens.access_token.0)
            .await
            .unwrap()
            .is_some()
    );

    fx.store
        .remove_session(fx.user.user_id, &tokens.refresh_token.0)
        .await
        .unwrap();

    assert!(
        fx.store
            .find_user_by_access_token(&tokens.access_token.0)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        fx.store
            .find_user_by_refresh_token(&tokens.refresh_token.0)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn inactive_owner_is_not_resolved() {
    let fx = fixture(true);
    let tokens = generate(&fx).await;

    let mut disabled = fx.user.clone();
    disabled.user_id = UserId(uuid::Uuid::new_v4());
    disabled.username = "mallory-locked".to_string();
    disabled.is_active = false;
    fx.db
        .insert_user(disabled.clone(), "phc-hash".to_string())
        .unwrap();
    let disabled_tokens = fx.factory.generate(&disabled).await.unwrap();

    assert!(
        fx.store
            .find_user_by_access_token(&disabled_tokens.access_token.0)
            .await
            .unwrap()
            .is_none()
    );
    // The active user is untouched.
    assert!(
        fx.store
            .find_user_by_access_token(&tokens.access_token.0)
            .await
            .unwrap()
            .is_some()
    );
}
