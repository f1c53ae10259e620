use crate::application_port::{
    AccessToken, AuthError, RefreshToken, SessionFactory, SessionTokens,
};
use crate::domain_model::{NewSession, SessionPolicy, UserId, UserRecord};
use crate::domain_port::SessionStore;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String, // user id as string
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
    jti: String,
    roles: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RefreshClaims {
    sub: String, // user id as string
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
    jti: String, // pairs the refresh token with its access token
}

fn mint_identity(policy: &SessionPolicy) -> Result<(String, String), AuthError> {
    // Validation accepts any configured issuer/audience; minting always
    // stamps the first entry of each list.
    let issuer = policy
        .primary_issuer()
        .ok_or_else(|| AuthError::InternalError("no issuer configured".to_string()))?;
    let audience = policy
        .primary_audience()
        .ok_or_else(|| AuthError::InternalError("no audience configured".to_string()))?;
    Ok((issuer.to_owned(), audience.to_owned()))
}

fn encode_access(
    user: &UserRecord,
    jti: &str,
    policy: &SessionPolicy,
) -> Result<(String, DateTime<Utc>), AuthError> {
    let (iss, aud) = mint_identity(policy)?;
    let iat_dt = Utc::now();
    let exp_dt = iat_dt + policy.access_token_ttl;
    let claims = AccessClaims {
        sub: user.user_id.to_string(),
        exp: exp_dt.timestamp(),
        iat: iat_dt.timestamp(),
        iss,
        aud,
        jti: jti.to_owned(),
        roles: user.roles.clone(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&policy.signing_key),
    )
    .map_err(|e| AuthError::InternalError(e.to_string()))?;
    Ok((token, exp_dt))
}

fn encode_refresh(
    uid: UserId,
    jti: &str,
    policy: &SessionPolicy,
) -> Result<(String, DateTime<Utc>), AuthError> {
    let (iss, aud) = mint_identity(policy)?;
    let iat_dt = Utc::now();
    let exp_dt = iat_dt + policy.refresh_token_ttl;
    let claims = RefreshClaims {
        sub: uid.to_string(),
        exp: exp_dt.timestamp(),
        iat: iat_dt.timestamp(),
        iss,
        aud,
        jti: jti.to_owned(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&policy.signing_key),
    )
    .map_err(|e| AuthError::InternalError(e.to_string()))?;
    Ok((token, exp_dt))
}

fn validation(policy: &SessionPolicy) -> Validation {
    let mut v = Validation::new(Algorithm::HS256);
    v.validate_exp = true;
    // Empty issuer/audience lists leave the acceptable set empty, so
    // every presented token fails: accept none, not accept any.
    v.set_audience(&policy.audiences);
    v.set_issuer(&policy.issuers);
    v
}

fn decode_access(token: &str, policy: &SessionPolicy) -> Result<AccessClaims, AuthError> {
    let data = decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(&policy.signing_key),
        &validation(policy),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::TokenInvalid,
    })?;
    Ok(data.claims)
}

fn decode_refresh(token: &str, policy: &SessionPolicy) -> Result<RefreshClaims, AuthError> {
    let data = decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(&policy.signing_key),
        &validation(policy),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::TokenInvalid,
    })?;
    Ok(data.claims)
}

/// HS256 session factory. Shares one `jti` between the two tokens of a
/// pair so logs can correlate them; revocation keys on token hashes, not
/// on the jti.
pub struct JwtSessionFactory {
    policy: Arc<SessionPolicy>,
    store: Arc<dyn SessionStore>,
}

impl JwtSessionFactory {
    pub fn new(policy: Arc<SessionPolicy>, store: Arc<dyn SessionStore>) -> Self {
        JwtSessionFactory { policy, store }
    }

    #[inline]
    fn gen_jti() -> String {
        Uuid::new_v4().to_string()
    }
}

#[async_trait::async_trait]
impl SessionFactory for JwtSessionFactory {
    async fn generate(&self, user: &UserRecord) -> Result<SessionTokens, AuthError> {
        let jti = Self::gen_jti();

        let (access_token, access_exp) = encode_access(user, &jti, &self.policy)?;
        let (refresh_token, refresh_exp) = encode_refresh(user.user_id, &jti, &self.policy)?;

        self.store
            .add_session(
                user.user_id,
                NewSession {
                    access_token: access_token.clone(),
                    access_token_expires_at: access_exp,
                    refresh_token: refresh_token.clone(),
                    refresh_token_expires_at: refresh_exp,
                },
            )
            .await?;

        Ok(SessionTokens {
            access_token: AccessToken(access_token),
            refresh_token: RefreshToken(refresh_token),
            access_token_expires_at: access_exp,
            refresh_token_expires_at: refresh_exp,
        })
    }

    async fn validate_access_token(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        match decode_access(token, &self.policy) {
            Ok(_) => true,
            Err(e) => {
                debug!("access token rejected: {e}");
                false
            }
        }
    }

    async fn validate_refresh_token(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        match decode_refresh(token, &self.policy) {
            Ok(_) => true,
            Err(e) => {
                debug!("refresh token rejected: {e}");
                false
            }
        }
    }
}
