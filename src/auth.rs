//! Session token storage and login.
//!
//! The token is kept in `token.json` next to the settings, as
//! `{ "token": ..., "expires_at": ... }`. Expiry comes from the JWT `exp`
//! claim when the token carries one, otherwise 24 hours from login.

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use restkit::Transport;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_LIFETIME_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenData {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenData {
    /// Wrap a freshly issued token, reading its expiry from the JWT.
    pub fn issued(token: String, now: DateTime<Utc>) -> Self {
        let expires_at = jwt_expiry(&token).unwrap_or_else(|| {
            log::warn!("Could not read token expiry, assuming {DEFAULT_LIFETIME_HOURS} hours");
            now + Duration::hours(DEFAULT_LIFETIME_HOURS)
        });
        Self { token, expires_at }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Read the `exp` claim from a JWT without verifying it.
pub fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?;
    let seconds = exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))?;
    DateTime::from_timestamp(seconds, 0)
}

/// The on-disk token file.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location in the config directory
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(crate::paths::token_file()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, data: &TokenData) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Could not create {}", dir.display()))?;
        }
        let content = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Could not write {}", self.path.display()))?;
        restrict_permissions(&self.path)?;
        log::debug!("Token stored at {}", self.path.display());
        Ok(())
    }

    /// Read the stored token data, if any.
    pub fn load(&self) -> Result<Option<TokenData>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Could not read {}", self.path.display()))?;
        let data = serde_json::from_str(&content)
            .with_context(|| format!("Invalid token file {}", self.path.display()))?;
        Ok(Some(data))
    }

    /// The stored token, if present and not expired at `now`.
    pub fn token_at(&self, now: DateTime<Utc>) -> Result<String> {
        match self.load()? {
            None => bail!("not authenticated: run 'certfix login'"),
            Some(data) if data.is_expired(now) => bail!("token expired: run 'certfix login'"),
            Some(data) => Ok(data.token),
        }
    }

    /// Remove the token file. Returns whether one existed.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Could not remove {}", self.path.display())),
        }
    }
}

impl provision::Credentials for TokenStore {
    fn token(&self) -> Result<String> {
        self.token_at(Utc::now())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("Could not set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// Exchange an email and personal access token for a session token.
pub fn login(transport: &dyn Transport, email: &str, personal_token: &str) -> Result<String> {
    let payload = json!({
        "email": email,
        "personal_access_token": personal_token,
    });
    let response = transport
        .post("/auth/cli", &payload, None)
        .context("Authentication request failed")?;

    response
        .get("token")
        .and_then(|t| t.as_str())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .context("Invalid response: token not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use provision::Credentials;
    use restkit::{Method, MockResponse, MockTransport};
    use tempfile::TempDir;

    fn jwt_with(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{body}.signature")
    }

    fn store() -> (TempDir, TokenStore) {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        (dir, store)
    }

    #[test]
    fn test_jwt_expiry_from_claim() {
        let token = jwt_with(&json!({"sub": "u1", "exp": 1_900_000_000}));
        let expiry = jwt_expiry(&token).unwrap();
        assert_eq!(expiry.timestamp(), 1_900_000_000);
    }

    #[test]
    fn test_jwt_expiry_absent() {
        assert!(jwt_expiry("not-a-jwt").is_none());
        assert!(jwt_expiry(&jwt_with(&json!({"sub": "u1"}))).is_none());
        assert!(jwt_expiry("a.!!!.c").is_none());
    }

    #[test]
    fn test_issued_defaults_to_a_day() {
        let now = Utc::now();
        let data = TokenData::issued("opaque".to_string(), now);
        assert_eq!(data.expires_at, now + Duration::hours(24));
        assert!(!data.is_expired(now));
        assert!(data.is_expired(now + Duration::hours(25)));
    }

    #[test]
    fn test_missing_token_is_unauthenticated() {
        let (_dir, store) = store();
        let err = store.token().unwrap_err();
        assert_eq!(err.to_string(), "not authenticated: run 'certfix login'");
    }

    #[test]
    fn test_save_then_read_token() {
        let (_dir, store) = store();
        let now = Utc::now();
        store
            .save(&TokenData {
                token: "abc".to_string(),
                expires_at: now + Duration::hours(1),
            })
            .unwrap();

        assert_eq!(store.token_at(now).unwrap(), "abc");
    }

    #[cfg(unix)]
    #[test]
    fn test_token_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = store();
        store
            .save(&TokenData::issued("abc".to_string(), Utc::now()))
            .unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let (_dir, store) = store();
        let now = Utc::now();
        store
            .save(&TokenData {
                token: "abc".to_string(),
                expires_at: now - Duration::minutes(1),
            })
            .unwrap();

        let err = store.token_at(now).unwrap_err();
        assert_eq!(err.to_string(), "token expired: run 'certfix login'");
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (_dir, store) = store();
        store
            .save(&TokenData::issued("abc".to_string(), Utc::now()))
            .unwrap();

        assert!(store.clear().unwrap());
        assert!(!store.clear().unwrap());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_login_posts_credentials() {
        let mock = MockTransport::new();
        mock.respond(
            Method::Post,
            "/auth/cli",
            MockResponse::Json(json!({"token": "session-token"})),
        );

        let token = login(&mock, "dev@example.com", "pat-123").unwrap();

        assert_eq!(token, "session-token");
        let call = &mock.calls()[0];
        assert_eq!(
            call.payload,
            Some(json!({"email": "dev@example.com", "personal_access_token": "pat-123"}))
        );
        assert!(call.token.is_none());
    }

    #[test]
    fn test_login_without_token_in_response() {
        let mock = MockTransport::new();
        let err = login(&mock, "dev@example.com", "pat").unwrap_err();
        assert!(err.to_string().contains("token not found"));
    }

    #[test]
    fn test_login_rejected() {
        let mock = MockTransport::new();
        mock.respond(
            Method::Post,
            "/auth/cli",
            MockResponse::Status(401, "bad credentials".into()),
        );
        let err = login(&mock, "dev@example.com", "pat").unwrap_err();
        assert!(format!("{err:#}").contains("401"));
    }
}
