//! Configuration module for the cloud client
//!
//! This module handles:
//! - API connection settings (cloud.toml + environment)
//! - Polling cadence
//! - Persisted display preferences

mod client_config;
mod preferences;

pub use client_config::{ApiSection, ClientConfig, PollingSection, DEFAULT_API_URL};
pub use preferences::{DisplayPreferences, PreferenceStore};

use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading or saving local configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },

    #[error("Could not determine config directory")]
    NoConfigDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;
