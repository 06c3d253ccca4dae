use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{pipeline::Endpoints, transport::HttpSettings};

pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Credentials for the legacy current-conditions provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [http]
/// user_agent = "my-weather (me@example.com)"
/// timeout_secs = 10
///
/// [openweather]
/// api_key = "..."
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub http: HttpSettings,

    #[serde(default)]
    pub endpoints: Endpoints,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openweather: Option<ProviderConfig>,
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_openweather_api_key(&mut self, api_key: String) {
        self.openweather = Some(ProviderConfig { api_key });
    }

    /// `OPENWEATHER_API_KEY` if set, else the stored key.
    pub fn openweather_api_key(&self) -> Option<String> {
        let from_env = std::env::var(API_KEY_ENV).ok();
        resolve_api_key(from_env, self.openweather.as_ref())
    }
}

fn resolve_api_key(from_env: Option<String>, stored: Option<&ProviderConfig>) -> Option<String> {
    from_env
        .filter(|k| !k.trim().is_empty())
        .or_else(|| stored.map(|p| p.api_key.clone()))
        .filter(|k| !k.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.http.timeout_secs = 12;
        cfg.endpoints.geocoding = false;
        cfg.set_openweather_api_key("OPEN_KEY".into());
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[http]\nmax_retries = 1\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.http.max_retries, 1);
        assert_eq!(cfg.http.backoff_factor, 0.5);
        assert_eq!(cfg.endpoints, Endpoints::default());
        assert!(cfg.openweather.is_none());
    }

    #[test]
    fn invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[http\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn env_key_wins_over_stored_key() {
        let stored = ProviderConfig {
            api_key: "STORED".into(),
        };

        assert_eq!(
            resolve_api_key(Some("ENV".into()), Some(&stored)).as_deref(),
            Some("ENV")
        );
        assert_eq!(
            resolve_api_key(Some("  ".into()), Some(&stored)).as_deref(),
            Some("STORED")
        );
        assert_eq!(resolve_api_key(None, None), None);
    }
}
