//! Client configuration for the cloud API
//!
//! Supports loading config from:
//! - Environment variables (`REPOTOIRE_API_URL`, `REPOTOIRE_API_KEY`)
//! - ~/.config/repotoire/cloud.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{ConfigError, ConfigResult};

pub const DEFAULT_API_URL: &str = "https://api.repotoire.io";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
const DEFAULT_MAX_POLLS: u32 = 300;

#[derive(Debug, Default, Clone, Deserialize, Serialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub polling: PollingSection,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize, PartialEq)]
pub struct ApiSection {
    /// Backend base URL (default: https://api.repotoire.io)
    pub base_url: Option<String>,

    /// API key sent as bearer token
    pub api_key: Option<String>,

    /// Request timeout in seconds (default: 30)
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize, PartialEq)]
pub struct PollingSection {
    /// Delay between status polls in milliseconds (default: 2000)
    pub interval_ms: Option<u64>,

    /// Upper bound on polls per run (default: 300)
    pub max_polls: Option<u32>,
}

impl ClientConfig {
    /// Load config from all sources, with priority:
    /// 1. Environment variables (highest)
    /// 2. User config (~/.config/repotoire/cloud.toml)
    pub fn load() -> ConfigResult<Self> {
        let mut config = match Self::user_config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => ClientConfig::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a config file
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Overlay environment values read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("REPOTOIRE_API_URL").filter(|v| !v.is_empty()) {
            self.api.base_url = Some(url);
        }
        if let Some(key) = lookup("REPOTOIRE_API_KEY").filter(|v| !v.is_empty()) {
            self.api.api_key = Some(key);
        }
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("repotoire").join("cloud.toml"))
    }

    pub fn base_url(&self) -> &str {
        self.api.base_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api.api_key.as_deref()
    }

    pub fn has_api_key(&self) -> bool {
        self.api.api_key.is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.polling.interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }

    pub fn max_polls(&self) -> u32 {
        self.polling.max_polls.unwrap_or(DEFAULT_MAX_POLLS)
    }

    /// Set a dotted key (`api.base_url`, `polling.interval_ms`, ...)
    pub fn set(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            "api.base_url" => self.api.base_url = Some(value.to_string()),
            "api.api_key" => self.api.api_key = Some(value.to_string()),
            "api.timeout_secs" => {
                self.api.timeout_secs = Some(value.parse().map_err(|_| invalid())?)
            }
            "polling.interval_ms" => {
                self.polling.interval_ms = Some(value.parse().map_err(|_| invalid())?)
            }
            "polling.max_polls" => {
                self.polling.max_polls = Some(value.parse().map_err(|_| invalid())?)
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Write this config as TOML
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let io = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(io)
    }

    /// Initialize user config directory and create example config
    pub fn init_user_config() -> ConfigResult<PathBuf> {
        let config_path = Self::user_config_path().ok_or(ConfigError::NoConfigDir)?;
        Self::init_at(&config_path)?;
        Ok(config_path)
    }

    fn init_at(config_path: &Path) -> ConfigResult<()> {
        let io = |source| ConfigError::Io {
            path: config_path.to_path_buf(),
            source,
        };
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(io)?;
        }

        if !config_path.exists() {
            let example = r#"# Repotoire Cloud Configuration

[api]
# base_url = "https://api.repotoire.io"

# Get your key at https://app.repotoire.io/settings/api-keys
# api_key = "rpt_..."

# timeout_secs = 30

[polling]
# interval_ms = 2000
# max_polls = 300
"#;
            std::fs::write(config_path, example).map_err(io)?;
        }
        Ok(())
    }
}
