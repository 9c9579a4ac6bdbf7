//! Local settings: API endpoint, timeout and retry policy.
//!
//! Stored as TOML. Values from the environment (`CERTFIX_ENDPOINT`,
//! `CERTFIX_TIMEOUT`, `CERTFIX_RETRY_ATTEMPTS`) take precedence over the
//! file, and missing keys fall back to defaults.

use anyhow::{Context, Result, bail};
use restkit::{HttpTransport, RetryConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.certfix.io";
const DEFAULT_TIMEOUT: u64 = 30;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const USER_AGENT: &str = concat!("certfix-cli/", env!("CARGO_PKG_VERSION"));

/// Keys accepted by `config get/set`
pub const KEYS: [&str; 3] = ["endpoint", "timeout", "retry_attempts"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub endpoint: String,
    /// Per-request timeout in seconds
    pub timeout: u64,
    /// Extra attempts for failed idempotent requests
    pub retry_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        }
    }
}

impl Settings {
    /// Load settings from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// Load settings and apply environment overrides.
    pub fn resolve(path: &Path) -> Result<Self> {
        let mut settings = Self::load(path)?;
        settings.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Could not create {}", dir.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Could not write {}", path.display()))?;
        log::debug!("Saved settings to {}", path.display());
        Ok(())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        for (key, var) in [
            ("endpoint", "CERTFIX_ENDPOINT"),
            ("timeout", "CERTFIX_TIMEOUT"),
            ("retry_attempts", "CERTFIX_RETRY_ATTEMPTS"),
        ] {
            if let Some(value) = lookup(var) {
                log::debug!("Using {} from {}", key, var);
                self.set(key, &value).with_context(|| format!("Invalid {var}"))?;
            }
        }
        Ok(())
    }

    /// Read one setting as text.
    pub fn get(&self, key: &str) -> Result<String> {
        match key {
            "endpoint" => Ok(self.endpoint.clone()),
            "timeout" => Ok(self.timeout.to_string()),
            "retry_attempts" => Ok(self.retry_attempts.to_string()),
            _ => bail!(unknown_key(key)),
        }
    }

    /// Set one setting from text, validating it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "endpoint" => {
                validate_url(value)?;
                self.endpoint = value.trim_end_matches('/').to_string();
            }
            "timeout" => {
                let timeout: u64 = value
                    .trim()
                    .parse()
                    .with_context(|| format!("timeout must be a number of seconds, got '{value}'"))?;
                if timeout == 0 {
                    bail!("timeout must be greater than 0");
                }
                self.timeout = timeout;
            }
            "retry_attempts" => {
                self.retry_attempts = value
                    .trim()
                    .parse()
                    .with_context(|| format!("retry_attempts must be 0 or greater, got '{value}'"))?;
            }
            _ => bail!(unknown_key(key)),
        }
        Ok(())
    }

    /// All settings as `(key, value)` pairs
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        KEYS.iter()
            .map(|key| (*key, self.get(key).unwrap_or_default()))
            .collect()
    }

    /// Whether the endpoint was never configured
    pub fn is_default_endpoint(&self) -> bool {
        self.endpoint.is_empty() || self.endpoint == DEFAULT_ENDPOINT
    }

    /// HTTP transport for the configured endpoint
    pub fn transport(&self) -> HttpTransport {
        HttpTransport::with_options(
            self.endpoint.clone(),
            Duration::from_secs(self.timeout),
            RetryConfig::with_retries(self.retry_attempts),
        )
        .user_agent(USER_AGENT)
    }
}

fn unknown_key(key: &str) -> String {
    format!(
        "unknown configuration key '{}' (expected one of: {})",
        key,
        KEYS.join(", ")
    )
}

/// Check that `url` is an http(s) URL with a host.
pub fn validate_url(url: &str) -> Result<()> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .with_context(|| format!("URL must start with http:// or https:// (got '{url}')"))?;

    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = host.rsplit('@').next().unwrap_or_default();
    let name = host.split(':').next().unwrap_or_default();
    if name.is_empty() || host.contains(char::is_whitespace) {
        bail!("URL must include a host (got '{url}')");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.is_default_endpoint());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.set("endpoint", "http://localhost:8080/").unwrap();
        settings.set("timeout", "5").unwrap();
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.endpoint, "http://localhost:8080");
        assert_eq!(loaded.timeout, 5);
        assert_eq!(loaded.retry_attempts, 3);
        assert!(!loaded.is_default_endpoint());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "timeout = 10\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.timeout, 10);
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "timeout = \"soon\"\n").unwrap();

        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("CERTFIX_ENDPOINT", "https://staging.example.com"),
            ("CERTFIX_RETRY_ATTEMPTS", "0"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings
            .apply_overrides(|name| env.get(name).map(|v| (*v).to_string()))
            .unwrap();

        assert_eq!(settings.endpoint, "https://staging.example.com");
        assert_eq!(settings.retry_attempts, 0);
        assert_eq!(settings.timeout, 30);
    }

    #[test]
    fn test_bad_env_value_is_error() {
        let mut settings = Settings::default();
        let err = settings
            .apply_overrides(|name| (name == "CERTFIX_TIMEOUT").then(|| "0".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("CERTFIX_TIMEOUT"));
    }

    #[test]
    fn test_set_validates() {
        let mut settings = Settings::default();
        assert!(settings.set("timeout", "0").is_err());
        assert!(settings.set("timeout", "abc").is_err());
        assert!(settings.set("retry_attempts", "-1").is_err());
        assert!(settings.set("endpoint", "ftp://example.com").is_err());
        assert!(settings.set("colour", "blue").is_err());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_get_and_entries() {
        let settings = Settings::default();
        assert_eq!(settings.get("timeout").unwrap(), "30");
        assert!(settings.get("nope").unwrap_err().to_string().contains("unknown"));

        let keys: Vec<_> = settings.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, KEYS.to_vec());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://api.example.com").is_ok());
        assert!(validate_url("http://localhost:8080/api").is_ok());
        assert!(validate_url("api.example.com").is_err());
        assert!(validate_url("https://").is_err());
        assert!(validate_url("http://:8080").is_err());
    }
}
