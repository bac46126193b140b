//! Configuration management for divvy.
//!
//! Loads configuration from ${DIVVY_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Backend connection settings.
///
/// Both values come from the Supabase project dashboard. The anon key is a
/// public client key, not a secret, but it is never logged regardless.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SupabaseSettings {
    /// Project base URL, e.g. `https://abc123.supabase.co`.
    pub url: String,
    /// Anonymous (publishable) API key.
    pub anon_key: String,
}

/// Top-level configuration.
///
/// `default_group` precedes the table so TOML serialization stays valid
/// (values before tables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Group whose transactions the expense list shows by default.
    /// `None` queries across all groups the user can see.
    pub default_group: Option<String>,
    pub supabase: SupabaseSettings,
}

impl Config {
    /// Loads configuration from the default path, then applies env overrides.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&paths::config_path())?;
        if let Ok(url) = std::env::var("DIVVY_SUPABASE_URL") {
            config.supabase.url = url;
        }
        if let Ok(key) = std::env::var("DIVVY_SUPABASE_ANON_KEY") {
            config.supabase.anon_key = key;
        }
        Ok(config)
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Renders the current configuration as TOML (for `divvy config show`).
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

pub mod paths {
    //! Path resolution for divvy configuration and data directories.
    //!
    //! DIVVY_HOME resolution order:
    //! 1. DIVVY_HOME environment variable (if set)
    //! 2. ~/.config/divvy (default)

    use std::path::PathBuf;

    /// Returns the divvy home directory.
    ///
    /// Checks DIVVY_HOME env var first, falls back to ~/.config/divvy
    pub fn divvy_home() -> PathBuf {
        if let Ok(home) = std::env::var("DIVVY_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("divvy"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        divvy_home().join("config.toml")
    }

    /// Returns the path to the persisted session file.
    pub fn session_path() -> PathBuf {
        divvy_home().join("session.json")
    }

    /// Returns the directory for log files.
    pub fn logs_dir() -> PathBuf {
        divvy_home().join("logs")
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert!(config.supabase.url.is_empty());
        assert_eq!(config.default_group, None);
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(
            &config_path,
            "[supabase]\nurl = \"https://example.supabase.co\"\n",
        )
        .unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.supabase.url, "https://example.supabase.co");
        assert!(config.supabase.anon_key.is_empty());
        assert_eq!(config.default_group, None);
    }

    #[test]
    fn test_full_config_roundtrip() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.supabase.url = "https://example.supabase.co".to_string();
        config.supabase.anon_key = "anon-key".to_string();
        config.default_group = Some("trip-2026".to_string());

        fs::write(&config_path, config.to_toml().unwrap()).unwrap();
        let loaded = Config::load_from(&config_path).unwrap();

        assert_eq!(loaded.supabase.url, config.supabase.url);
        assert_eq!(loaded.supabase.anon_key, config.supabase.anon_key);
        assert_eq!(loaded.default_group, config.default_group);
    }
}
