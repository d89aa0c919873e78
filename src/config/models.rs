use crate::endpoint::SearchType;
use crate::humanize::HumanDuration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sent as the `api_key` query parameter on every call
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: HumanDuration,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: HumanDuration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Headers added to every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Basic auth user (loaded from environment, not from config file)
    #[serde(skip)]
    pub username: Option<String>,
    /// Basic auth password (loaded from environment, not from config file)
    #[serde(skip)]
    pub password: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
            headers: BTreeMap::new(),
            username: None,
            password: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost/api".to_string()
}

fn default_connect_timeout() -> HumanDuration {
    HumanDuration::from_secs(10)
}

fn default_request_timeout() -> HumanDuration {
    HumanDuration::from_secs(30)
}

fn default_user_agent() -> String {
    "SearchEngine/0.1.0".to_string()
}

/// Debounced search configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before a search is issued
    #[serde(default = "default_debounce")]
    pub debounce: HumanDuration,
    #[serde(default)]
    pub search_type: SearchType,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: default_debounce(),
            search_type: SearchType::default(),
        }
    }
}

fn default_debounce() -> HumanDuration {
    HumanDuration::from_secs(1)
}

/// Local preference storage
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("data/preferences")
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Pretty-print response bodies at debug level
    #[serde(default)]
    pub log_bodies: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            log_bodies: false,
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.api.base_url, "http://localhost/api");
        assert!(config.api.api_key.is_empty());
        assert_eq!(config.api.request_timeout.as_duration(), Duration::from_secs(30));
        assert_eq!(config.search.debounce.as_duration(), Duration::from_secs(1));
        assert_eq!(config.search.search_type, SearchType::AlbumTitle);
        assert_eq!(config.storage.path, PathBuf::from("data/preferences"));
        assert!(!config.telemetry.log_bodies);
    }

    #[test]
    fn test_secrets_are_never_serialized() {
        let mut config = Config::default();
        config.api.username = Some("user".to_string());
        config.api.password = Some("secret".to_string());

        let rendered = serde_json::to_string(&config).unwrap();
        assert!(!rendered.contains("secret"));
        assert!(!rendered.contains("username"));
    }
}
