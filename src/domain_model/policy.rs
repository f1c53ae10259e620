use anyhow::{Context, Result, anyhow};
use argon2::password_hash::rand_core::{OsRng, RngCore};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Process-wide session parameters, built once at startup and read-only
/// afterwards. Changing any of these requires a restart.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    pub signing_key: Vec<u8>,
    pub issuers: Vec<String>,
    pub audiences: Vec<String>,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub allow_multiple_sessions: bool,
}

impl SessionPolicy {
    /// `issuer` and `audience` are `;`-delimited lists of acceptable
    /// values. An empty list means "accept none", so a blank config
    /// rejects every token rather than accepting every token.
    pub fn try_new(
        signing_key: Vec<u8>,
        issuer: &str,
        audience: &str,
        access_token_ttl: Duration,
        refresh_token_ttl: Duration,
        allow_multiple_sessions: bool,
    ) -> Result<Self> {
        if signing_key.is_empty() {
            return Err(anyhow!("session signing key must not be empty"));
        }
        if access_token_ttl.is_zero() || refresh_token_ttl.is_zero() {
            return Err(anyhow!("session token lifetimes must be non-zero"));
        }
        if access_token_ttl >= refresh_token_ttl {
            return Err(anyhow!(
                "access token lifetime ({:?}) must be shorter than refresh token lifetime ({:?})",
                access_token_ttl,
                refresh_token_ttl
            ));
        }

        let issuers = split_list(issuer);
        let audiences = split_list(audience);
        if issuers.is_empty() {
            warn!("no issuer configured; all presented tokens will be rejected");
        }
        if audiences.is_empty() {
            warn!("no audience configured; all presented tokens will be rejected");
        }

        Ok(SessionPolicy {
            signing_key,
            issuers,
            audiences,
            access_token_ttl,
            refresh_token_ttl,
            allow_multiple_sessions,
        })
    }

    /// Issuer stamped into newly minted tokens. Validation accepts any
    /// entry of the list; minting always uses the first.
    pub fn primary_issuer(&self) -> Option<&str> {
        self.issuers.first().map(String::as_str)
    }

    pub fn primary_audience(&self) -> Option<&str> {
        self.audiences.first().map(String::as_str)
    }
}

pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Resolve the signing key: an explicitly configured secret wins. With no
/// secret, a random key is generated once and persisted next to the
/// process so a restart does not invalidate every outstanding session.
/// The fallback is for local development only and is logged loudly.
pub fn load_or_generate_signing_key(
    configured: Option<&str>,
    key_file: impl AsRef<Path>,
) -> Result<Vec<u8>> {
    if let Some(secret) = configured {
        if !secret.is_empty() {
            return Ok(secret.as_bytes().to_vec());
        }
    }

    let key_file = key_file.as_ref();
    if key_file.is_file() {
        let hex_key = std::fs::read_to_string(key_file)
            .with_context(|| format!("read signing key file {:?}", key_file))?;
        let key = hex::decode(hex_key.trim())
            .with_context(|| format!("decode signing key file {:?}", key_file))?;
        warn!(
            ?key_file,
            "no session secret configured; reusing generated signing key (not for production)"
        );
        return Ok(key);
    }

    let mut key = vec![0u8; 32];
    OsRng.fill_bytes(&mut key);
    std::fs::write(key_file, hex::encode(&key))
        .with_context(|| format!("persist signing key file {:?}", key_file))?;
    warn!(
        ?key_file,
        "no session secret configured; generated a fresh signing key (not for production)"
    );
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(issuer: &str, audience: &str) -> Result<SessionPolicy> {
        SessionPolicy::try_new(
            b"test-signing-key".to_vec(),
            issuer,
            audience,
            Duration::from_secs(900),
            Duration::from_secs(604_800),
            true,
        )
    }

    #[test]
    fn issuer_list_splits_on_semicolon_in_order() {
        let p = policy("https://a.com;https://b.com", "clients").unwrap();
        assert_eq!(p.issuers, vec!["https://a.com", "https://b.com"]);
        assert_eq!(p.primary_issuer(), Some("https://a.com"));
    }

    #[test]
    fn blank_entries_are_dropped() {
        assert!(split_list("").is_empty());
        assert!(split_list(" ; ;").is_empty());
        assert_eq!(split_list("a; ;b;"), vec!["a", "b"]);
    }

    #[test]
    fn access_lifetime_must_be_shorter() {
        let err = SessionPolicy::try_new(
            b"k".to_vec(),
            "iss",
            "aud",
            Duration::from_secs(3600),
            Duration::from_secs(3600),
            false,
        );
        assert!(err.is_err());
    }

    #[test]
    fn zero_lifetimes_are_rejected() {
        let err = SessionPolicy::try_new(
            b"k".to_vec(),
            "iss",
            "aud",
            Duration::ZERO,
            Duration::from_secs(60),
            false,
        );
        assert!(err.is_err());
    }

    #[test]
    fn configured_secret_wins_over_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turnstile.key");
        let key = load_or_generate_signing_key(Some("explicit"), &path).unwrap();
        assert_eq!(key, b"explicit");
        assert!(!path.exists());
    }

    #[test]
    fn generated_key_is_reused_across_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turnstile.key");
        let first = load_or_generate_signing_key(None, &path).unwrap();
        assert_eq!(first.len(), 32);
        let second = load_or_generate_signing_key(Some(""), &path).unwrap();
        assert_eq!(first, second);
    }
}
