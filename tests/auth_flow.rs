use std::sync::Arc;
use std::time::Duration;
use turnstile::application_impl::{Argon2PasswordHasher, JwtSessionFactory, RealAuthService};
use turnstile::application_port::{AuthError, AuthService, LoginInput, SignupInput};
use turnstile::domain_model::SessionPolicy;
use turnstile::infra_memory::{MemoryDb, MemorySessionStore, MemoryTxManager, MemoryUserRepo};

fn service(allow_multiple_sessions: bool) -> Arc<RealAuthService> {
    let policy = Arc::new(
        SessionPolicy::try_new(
            b"auth-flow-test-key".to_vec(),
            "https://auth.test",
            "test-clients",
            Duration::from_secs(900),
            Duration::from_secs(3600),
            allow_multiple_sessions,
        )
        .unwrap(),
    );
    let db = Arc::new(MemoryDb::new());
    let store = Arc::new(MemorySessionStore::new(db.clone(), policy.clone()));
    let factory = Arc::new(JwtSessionFactory::new(policy, store.clone()));

    Arc::new(RealAuthService::new(
        Arc::new(MemoryUserRepo::new(db)),
        Arc::new(Argon2PasswordHasher),
        factory,
        store,
        Arc::new(MemoryTxManager::new()),
    ))
}

fn signup_input() -> SignupInput {
    SignupInput {
        username: "alice-wonder".to_string(),
        password: "correct-horse".to_string(),
    }
}

fn login_input() -> LoginInput {
    LoginInput {
        username: "alice-wonder".to_string(),
        password: "correct-horse".to_string(),
    }
}

#[tokio::test]
async fn signup_login_resolve() {
    let service = service(false);
    let user_id = service.signup(signup_input()).await.unwrap();

    let login = service.login(login_input()).await.unwrap();
    assert_eq!(login.user_id, user_id);

    let user = service
        .resolve_access_token(&login.tokens.access_token.0)
        .await
        .unwrap();
    assert_eq!(user.user_id, user_id);
    assert_eq!(user.username, "alice-wonder");
}

#[tokio::test]
async fn signup_rejects_short_credentials() {
    let service = service(false);
    let err = service
        .signup(SignupInput {
            username: "al".to_string(),
            password: "correct-horse".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidInput(_)));
}

#[tokio::test]
async fn signup_rejects_taken_username() {
    let service = service(false);
    service.signup(signup_input()).await.unwrap();
    let err = service.signup(signup_input()).await.unwrap_err();
    assert!(matches!(err, AuthError::UserExists));
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let service = service(false);
    service.signup(signup_input()).await.unwrap();

    let err = service
        .login(LoginInput {
            username: "alice-wonder".to_string(),
            password: "wrong-horse-battery".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn refresh_rotates_the_session() {
    let service = service(true);
    service.signup(signup_input()).await.unwrap();
    let login = service.login(login_input()).await.unwrap();

    let rotated = service.refresh(&login.tokens.refresh_token.0).await.unwrap();

    // The old pair is fully superseded regardless of session policy.
    let err = service
        .refresh(&login.tokens.refresh_token.0)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenInvalid));
    let err = service
        .resolve_access_token(&login.tokens.access_token.0)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenInvalid));

    // The new pair works.
    service
        .resolve_access_token(&rotated.access_token.0)
        .await
        .unwrap();
}

#[tokio::test]
async fn refresh_rejects_garbage() {
    let service = service(false);
    let err = service.refresh("not-a-real-token").await.unwrap_err();
    assert!(matches!(err, AuthError::TokenInvalid));

    let err = service.refresh("").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidInput(_)));
}

#[tokio::test]
async fn logout_is_idempotent() {
    let service = service(false);
    service.signup(signup_input()).await.unwrap();
    let login = service.login(login_input()).await.unwrap();

    service.logout(&login.tokens.access_token.0).await.unwrap();
    let err = service
        .resolve_access_token(&login.tokens.access_token.0)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenInvalid));

    // Signing out of an already-removed session is not an error.
    service.logout(&login.tokens.access_token.0).await.unwrap();
}

#[tokio::test]
async fn logout_accepts_the_refresh_token() {
    let service = service(false);
    service.signup(signup_input()).await.unwrap();
    let login = service.login(login_input()).await.unwrap();

    service.logout(&login.tokens.refresh_token.0).await.unwrap();

    // Session fully revoked regardless of which token keyed the removal.
    let err = service
        .resolve_access_token(&login.tokens.access_token.0)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenInvalid));
}
