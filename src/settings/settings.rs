use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub http: Http,
    pub log: Log,
    pub session: Session,
    pub store: Store,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub backend: String, // "fake" or "real"
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub cert_path: String,
    pub key_path: String,
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Deserialize)]
pub struct Session {
    /// Symmetric signing secret. When absent, a generated key is
    /// persisted to `key_file` (development only).
    pub secret: Option<String>,
    pub key_file: String,
    /// `;`-delimited list of acceptable issuers; first entry is minted.
    pub issuer: String,
    /// `;`-delimited list of acceptable audiences; first entry is minted.
    pub audience: String,
    pub access_token_expires_in_secs: u64,
    pub refresh_token_expires_in_secs: u64,
    pub allow_multiple_sessions: bool,
}

// Settings are logged at startup; keep the secret out of Debug output.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("key_file", &self.key_file)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field(
                "access_token_expires_in_secs",
                &self.access_token_expires_in_secs,
            )
            .field(
                "refresh_token_expires_in_secs",
                &self.refresh_token_expires_in_secs,
            )
            .field("allow_multiple_sessions", &self.allow_multiple_sessions)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: String, // "memory" or "mysql"
    pub mysql_dsn: Option<String>,
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
