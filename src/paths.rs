//! Path resolution for certfix's local files
//!
//! Everything lives in one directory: `config.toml` for settings and
//! `token.json` for the stored session.
//!
//! # Environment Variables
//!
//! - `CERTFIX_CONFIG_DIR` - Override the directory (e.g. `~/dotfiles/certfix`)
//!
//! Without an override the directory is `~/.certfix`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "CERTFIX_CONFIG_DIR";

const CONFIG_FILE: &str = "config.toml";
const TOKEN_FILE: &str = "token.json";

/// Get the certfix config directory
///
/// Priority:
/// 1. `CERTFIX_CONFIG_DIR` env var
/// 2. `~/.certfix`
pub fn config_dir() -> Result<PathBuf> {
    resolve_config_dir(std::env::var(ENV_CONFIG_DIR).ok(), dirs::home_dir())
}

fn resolve_config_dir(override_dir: Option<String>, home: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = override_dir.filter(|d| !d.trim().is_empty()) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    let home = home.context("Could not determine home directory")?;
    let path = home.join(".certfix");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Settings file, honouring an explicit `--config` path
pub fn config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(expand(&path.to_string_lossy())),
        None => Ok(config_dir()?.join(CONFIG_FILE)),
    }
}

/// Stored session token
pub fn token_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(TOKEN_FILE))
}

/// Expand `~` and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let dir = resolve_config_dir(
            Some("/custom/certfix".to_string()),
            Some(PathBuf::from("/home/user")),
        )
        .unwrap();
        assert_eq!(dir, PathBuf::from("/custom/certfix"));
    }

    #[test]
    fn test_blank_override_ignored() {
        let dir = resolve_config_dir(Some("  ".to_string()), Some(PathBuf::from("/home/user")))
            .unwrap();
        assert_eq!(dir, PathBuf::from("/home/user/.certfix"));
    }

    #[test]
    fn test_default_is_dot_certfix() {
        let dir = resolve_config_dir(None, Some(PathBuf::from("/home/user"))).unwrap();
        assert_eq!(dir, PathBuf::from("/home/user/.certfix"));
    }

    #[test]
    fn test_no_home_is_error() {
        assert!(resolve_config_dir(None, None).is_err());
    }

    #[test]
    fn test_override_with_tilde() {
        let home = dirs::home_dir().unwrap();
        let dir = resolve_config_dir(Some("~/dotfiles/certfix".to_string()), None).unwrap();
        assert_eq!(dir, home.join("dotfiles").join("certfix"));
    }

    #[test]
    fn test_explicit_config_file() {
        let path = config_file(Some(Path::new("/etc/certfix.toml"))).unwrap();
        assert_eq!(path, PathBuf::from("/etc/certfix.toml"));
    }

    #[test]
    fn test_expand_absolute() {
        assert_eq!(expand("/absolute/path"), PathBuf::from("/absolute/path"));
    }
}
