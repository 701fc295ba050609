use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ingest::DEFAULT_SOURCE_QUOTA;

/// Environment variable that overrides `[newsapi] api_key`
pub const API_KEY_ENV: &str = "NEWSAPI_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub newsapi: NewsApiConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsApiConfig {
    /// API root, endpoints are appended to it (e.g. "/top-headlines")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API credential, sent as the `apiKey` query parameter
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// HTTP proxy URL (e.g., "http://127.0.0.1:7890" or "socks5://127.0.0.1:1080")
    #[serde(default)]
    pub proxy_url: Option<String>,
}

impl Default for NewsApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            request_timeout_secs: default_timeout(),
            proxy_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Maximum number of novel sources persisted per source refresh
    #[serde(default = "default_source_quota")]
    pub source_quota: usize,
    /// Maximum number of memoized headline fetches (0 = no caching)
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Lifetime of a memoized headline fetch in seconds
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source_quota: default_source_quota(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

/// How the per-source headline fetch is executed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadlineMode {
    #[default]
    Concurrent,
    Sequential,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Source list refresh interval in seconds (0 = source loop disabled)
    #[serde(default = "default_source_refresh_interval")]
    pub source_refresh_interval_secs: u64,
    /// Per-source headline fetch interval in seconds (0 = headline loop disabled)
    #[serde(default = "default_headline_refresh_interval")]
    pub headline_refresh_interval_secs: u64,
    /// Concurrent or sequential per-source fetch
    #[serde(default)]
    pub headline_mode: HeadlineMode,
    /// Upper bound on in-flight per-source fetches in concurrent mode
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source_refresh_interval_secs: default_source_refresh_interval(),
            headline_refresh_interval_secs: default_headline_refresh_interval(),
            headline_mode: HeadlineMode::default(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP API listens on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("headliner")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "https://newsapi.org/v2".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_source_quota() -> usize {
    DEFAULT_SOURCE_QUOTA
}

fn default_cache_capacity() -> usize {
    128
}

fn default_cache_ttl() -> u64 {
    300 // 5 minutes
}

fn default_source_refresh_interval() -> u64 {
    86400 // daily
}

fn default_headline_refresh_interval() -> u64 {
    3600 // 1 hour
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &std::path::Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from file or return defaults
    ///
    /// `NEWSAPI_KEY` in the environment takes precedence over the file.
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path();

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        Ok(config.with_api_key_override(std::env::var(API_KEY_ENV).ok()))
    }

    /// Replace the API key with `key` unless it is absent or blank
    pub fn with_api_key_override(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.newsapi.api_key = Some(key);
        }
        self
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to file
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/headliner/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("headliner")
            .join("config.toml")
    }

    /// Get the database file path
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("headliner.db")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.newsapi.base_url, "https://newsapi.org/v2");
        assert_eq!(config.ingest.source_quota, 3);
        assert_eq!(config.sync.headline_mode, HeadlineMode::Concurrent);
        assert!(config.newsapi.api_key.is_none());
        assert!(config.database_path().ends_with("headliner.db"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [newsapi]
            api_key = "secret"

            [ingest]
            source_quota = 7

            [sync]
            headline_mode = "sequential"
            max_concurrent_fetches = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.newsapi.api_key.as_deref(), Some("secret"));
        assert_eq!(config.newsapi.request_timeout_secs, 30);
        assert_eq!(config.ingest.source_quota, 7);
        assert_eq!(config.ingest.cache_capacity, 128);
        assert_eq!(config.sync.headline_mode, HeadlineMode::Sequential);
        assert_eq!(config.sync.max_concurrent_fetches, 2);
        assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = AppConfig::from_toml("[sync]\nheadline_mode = \"sideways\"").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = AppConfig::default();
        config.sync.headline_mode = HeadlineMode::Sequential;
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = AppConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.sync.headline_mode, HeadlineMode::Sequential);
    }

    #[test]
    fn test_api_key_override() {
        let config = AppConfig::from_toml("[newsapi]\napi_key = \"from-file\"\n").unwrap();

        let kept = config.clone().with_api_key_override(Some("  ".to_string()));
        assert_eq!(kept.newsapi.api_key.as_deref(), Some("from-file"));

        let kept = config.clone().with_api_key_override(None);
        assert_eq!(kept.newsapi.api_key.as_deref(), Some("from-file"));

        let replaced = config.with_api_key_override(Some("from-env".to_string()));
        assert_eq!(replaced.newsapi.api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_expand_tilde_passthrough() {
        let path = std::path::Path::new("/var/lib/headliner");
        assert_eq!(expand_tilde(path), PathBuf::from("/var/lib/headliner"));
    }
}
