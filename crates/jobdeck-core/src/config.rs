//! Configuration management for Jobdeck.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Largest page size the server accepts (`max_page_size`).
pub const MAX_PAGE_SIZE: usize = 100;

/// Main application configuration.
///
/// This is loaded from `~/.config/jobdeck/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Jobs API connection settings
    pub api: ApiConfig,
    /// List pagination and cache settings
    pub pagination: PaginationConfig,
    /// Log output settings
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, falling back to defaults if
    /// the file does not exist.
    pub fn load_from(config_path: &Path) -> ConfigResult<Self> {
        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `JOBDECK_API_URL`: Override the API base URL
    /// - `JOBDECK_TIMEOUT_SECS`: Override the request timeout
    /// - `JOBDECK_PAGE_SIZE`: Override the list page size
    /// - `JOBDECK_LOG`: Override the log filter directive
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    ///
    /// Values that fail to parse are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("JOBDECK_API_URL") {
            tracing::debug!("Override api.base_url from env: {}", url);
            self.api.base_url = url;
        }

        if let Some(val) = lookup("JOBDECK_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.api.timeout_secs = secs;
                tracing::debug!("Override api.timeout_secs from env: {}", secs);
            } else {
                tracing::debug!("Ignoring unparseable JOBDECK_TIMEOUT_SECS: {}", val);
            }
        }

        if let Some(val) = lookup("JOBDECK_PAGE_SIZE") {
            if let Ok(size) = val.parse() {
                self.pagination.page_size = size;
                tracing::debug!("Override pagination.page_size from env: {}", size);
            } else {
                tracing::debug!("Ignoring unparseable JOBDECK_PAGE_SIZE: {}", val);
            }
        }

        if let Some(filter) = lookup("JOBDECK_LOG") {
            tracing::debug!("Override logging.filter from env: {}", filter);
            self.logging.filter = filter;
        }
    }

    /// Check that values are usable before building clients from them.
    pub fn validate(&self) -> ConfigResult<()> {
        if let Err(e) = url::Url::parse(&self.api.base_url) {
            return Err(ConfigError::InvalidValue {
                field: "api.base_url".to_string(),
                reason: e.to_string(),
            });
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.timeout_secs".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.pagination.page_size == 0 || self.pagination.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "pagination.page_size".to_string(),
                reason: format!("must be between 1 and {MAX_PAGE_SIZE}"),
            });
        }

        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, config_path: &Path) -> ConfigResult<()> {
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/jobdeck/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "jobdeck", "jobdeck").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/jobdeck`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "jobdeck", "jobdeck").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

/// Jobs API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the API, including its path prefix (e.g. `/api`)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
}

impl ApiConfig {
    /// Request timeout as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_secs: 10,
            user_agent: concat!("jobdeck/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// List pagination and page cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Jobs per page, enforced on every list request
    pub page_size: usize,
    /// Seconds a cached page stays fresh
    pub cache_ttl_secs: u64,
    /// Forward/backward round trips attempted to refill a short page
    pub max_backfill_rounds: u32,
}

impl PaginationConfig {
    /// Cache freshness window as a `Duration`.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: 15,
            cache_ttl_secs: 30,
            max_backfill_rounds: 2,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,jobdeck=debug".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8000/api");
        assert_eq!(config.api.timeout(), Duration::from_secs(10));
        assert_eq!(config.pagination.page_size, 15);
        assert_eq!(config.pagination.cache_ttl(), Duration::from_secs(30));
        assert_eq!(config.pagination.max_backfill_rounds, 2);
        assert!(!config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[pagination]"));
        assert!(toml_str.contains("[logging]"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed.api.base_url, config.api.base_url);
        assert_eq!(parsed.pagination.page_size, config.pagination.page_size);
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.api.base_url = "https://jobs.example.com/api".to_string();
        config.pagination.page_size = 25;

        config.save_to(&config_path).expect("save config");
        let loaded = AppConfig::load_from(&config_path).expect("load config");

        assert_eq!(loaded.api.base_url, "https://jobs.example.com/api");
        assert_eq!(loaded.pagination.page_size, 25);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let tmp = TempDir::new().expect("create temp dir");
        let loaded = AppConfig::load_from(&tmp.path().join("absent.toml")).expect("load config");
        assert_eq!(loaded.pagination.page_size, 15);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("JOBDECK_API_URL", "http://staging:9000/api"),
            ("JOBDECK_TIMEOUT_SECS", "3"),
            ("JOBDECK_PAGE_SIZE", "not-a-number"),
            ("JOBDECK_LOG", "warn"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| vars.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.api.base_url, "http://staging:9000/api");
        assert_eq!(config.api.timeout_secs, 3);
        // Unparseable value leaves the default in place
        assert_eq!(config.pagination.page_size, 15);
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.api.base_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "api.base_url"
        ));

        let mut config = AppConfig::default();
        config.pagination.page_size = MAX_PAGE_SIZE + 1;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[api]
base_url = "http://jobs.internal/api"

[pagination]
cache_ttl_secs = 5
"#;

        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(config.api.base_url, "http://jobs.internal/api");
        assert_eq!(config.pagination.cache_ttl_secs, 5);
        // These should be defaults
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.pagination.page_size, 15);
    }
}
