//! Configuration management for SurveyLink.
//!
//! Settings come from an optional TOML file, then environment overrides.
//! Network timeouts are deliberately optional: when unset, requests and
//! channel connects wait indefinitely.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding `api.base_url`.
pub const API_URL_ENV: &str = "SURVEYLINK_API_URL";
/// Environment variable overriding `channel.url`.
pub const CHANNEL_URL_ENV: &str = "SURVEYLINK_CHANNEL_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub api: ApiConfig,
    pub channel: ChannelConfig,
    pub view: ViewConfig,
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub url: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:4000/telemetry".to_string(),
        }
    }
}

/// Camera parameters handed to the external map surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Zoom used for the initial view and the one-time hydration recentre
    pub recenter_zoom: f64,
    /// Animation speed for live tracking
    pub fly_speed: f64,
    /// Animation curve for live tracking
    pub fly_curve: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            recenter_zoom: 14.0,
            fly_speed: 0.6,
            fly_curve: 1.2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub request_ms: Option<u64>,
    pub channel_connect_ms: Option<u64>,
}

impl TimeoutConfig {
    pub fn request(&self) -> Option<Duration> {
        self.request_ms.map(Duration::from_millis)
    }

    pub fn channel_connect(&self) -> Option<Duration> {
        self.channel_connect_ms.map(Duration::from_millis)
    }
}

impl SyncConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: SyncConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise defaults, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (usually the process environment).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV) {
            tracing::debug!(url = %url, "api url overridden from environment");
            self.api.base_url = url;
        }
        if let Some(url) = lookup(CHANNEL_URL_ENV) {
            tracing::debug!(url = %url, "channel url overridden from environment");
            self.channel.url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let api = url::Url::parse(&self.api.base_url)
            .map_err(|e| CoreError::ConfigInvalid(format!("api.base_url: {}", e)))?;
        if !matches!(api.scheme(), "http" | "https") {
            return Err(CoreError::ConfigInvalid(
                "api.base_url must use http or https".to_string(),
            ));
        }

        let channel = url::Url::parse(&self.channel.url)
            .map_err(|e| CoreError::ConfigInvalid(format!("channel.url: {}", e)))?;
        if !matches!(channel.scheme(), "ws" | "wss") {
            return Err(CoreError::ConfigInvalid(
                "channel.url must start with ws:// or wss://".to_string(),
            ));
        }

        if !(self.view.recenter_zoom > 0.0) {
            return Err(CoreError::ConfigInvalid(
                "view.recenter_zoom must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = SyncConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.view.recenter_zoom, 14.0);
        assert!(config.timeouts.request().is_none());
        assert!(config.timeouts.channel_connect().is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SyncConfig::from_toml(
            r#"
            [api]
            base_url = "https://api.example.com"

            [timeouts]
            request_ms = 2500
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.channel, ChannelConfig::default());
        assert_eq!(config.timeouts.request(), Some(Duration::from_millis(2500)));
        assert_eq!(config.timeouts.channel_connect(), None);
    }

    #[test]
    fn test_rejects_bad_channel_scheme() {
        let result = SyncConfig::from_toml(
            r#"
            [channel]
            url = "http://localhost:4000"
            "#,
        );
        assert!(matches!(result, Err(CoreError::ConfigInvalid(_))));
    }

    #[test]
    fn test_rejects_non_positive_zoom() {
        let result = SyncConfig::from_toml("[view]\nrecenter_zoom = 0.0\n");
        assert!(matches!(result, Err(CoreError::ConfigInvalid(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = SyncConfig::default();
        config.apply_env(|key| match key {
            API_URL_ENV => Some("http://10.0.0.2:4000".to_string()),
            _ => None,
        });
        assert_eq!(config.api.base_url, "http://10.0.0.2:4000");
        assert_eq!(config.channel.url, ChannelConfig::default().url);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[channel]\nurl = \"wss://stream.example.com/telemetry\"").unwrap();

        let config = SyncConfig::from_file(file.path()).unwrap();
        assert_eq!(config.channel.url, "wss://stream.example.com/telemetry");
    }

    #[test]
    fn test_malformed_toml() {
        let result = SyncConfig::from_toml("[api\nbase_url = ");
        assert!(matches!(result, Err(CoreError::ConfigParse(_))));
    }
}
