//! API client configuration
//!
//! Layers, each overriding the previous:
//!
//! 1. Built-in defaults
//! 2. Optional JSON settings file
//! 3. Environment variables (`CIRCUIT_API_URL`, `CIRCUIT_API_TIMEOUT_SECS`)
//!
//! Command-line flags are applied on top by the binary.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const API_URL_ENV: &str = "CIRCUIT_API_URL";
pub const API_TIMEOUT_ENV: &str = "CIRCUIT_API_TIMEOUT_SECS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {name}: {reason}")]
    InvalidEnvVar { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// Root of the REST API, e.g. `http://localhost:8000/api`
    pub base_url: String,

    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    /// Defaults, then `settings` if given, then the process environment.
    pub fn load(settings: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match settings {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env_from(|name| std::env::var(name).ok())
    }

    /// Read a JSON settings file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply overrides looked up through `lookup` (normally `std::env::var`).
    pub fn with_env_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(API_TIMEOUT_ENV) {
            self.timeout_secs = raw.trim().parse().map_err(|_| ConfigError::InvalidEnvVar {
                name: API_TIMEOUT_ENV,
                reason: format!("expected whole seconds, got {:?}", raw),
            })?;
        }
        Ok(self)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_env_overrides() {
        let config = ApiConfig::default()
            .with_env_from(lookup_from(&[
                (API_URL_ENV, "https://circuits.example.com/api"),
                (API_TIMEOUT_ENV, "5"),
            ]))
            .unwrap();
        assert_eq!(config.base_url, "https://circuits.example.com/api");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_invalid_timeout_env() {
        let err = ApiConfig::default()
            .with_env_from(lookup_from(&[(API_TIMEOUT_ENV, "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { .. }));
    }

    #[test]
    fn test_settings_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"timeout_secs": 12}}"#).unwrap();

        let config = ApiConfig::from_file(file.path()).unwrap();
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.timeout_secs, 12);
    }

    #[test]
    fn test_settings_file_rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"theme": "dark"}}"#).unwrap();
        assert!(matches!(
            ApiConfig::from_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
