//! Indexer configuration
//!
//! All settings have sensible defaults and can be overridden in code, from
//! the command line, or from a TOML file. [`IndexerConfig::validate`] runs
//! before the client touches the network.

use crate::normalize::EpisodeOrder;
use crate::retry::RetryPolicy;
use crate::show_cache::{DEFAULT_RETENTION_SIZE, DEFAULT_SWEEP_INTERVAL};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Languages the indexer accepts, with their numeric indexer ids
const LANGUAGES: &[(&str, u32)] = &[
    ("da", 10),
    ("fi", 11),
    ("nl", 13),
    ("de", 14),
    ("it", 15),
    ("es", 16),
    ("fr", 17),
    ("pl", 18),
    ("hu", 19),
    ("el", 20),
    ("tr", 21),
    ("ru", 22),
    ("he", 24),
    ("ja", 25),
    ("pt", 26),
    ("zh", 27),
    ("cs", 28),
    ("sl", 30),
    ("hr", 31),
    ("ko", 32),
    ("en", 7),
    ("sv", 8),
    ("no", 9),
];

/// Upstream service the client talks to by default
pub const DEFAULT_BASE_URL: &str = "https://api.tvmaze.com";

/// Errors detected while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid language {language}, options are: {options}")]
    InvalidLanguage { language: String, options: String },

    #[error("Invalid cache location {path}: {reason}")]
    InvalidCacheLocation { path: PathBuf, reason: String },

    /// No default cache directory could be determined for this platform
    #[error("Failed to determine cache directory location")]
    CacheDirectoryNotFound,

    #[error("Invalid proxy {proxy}: {reason}")]
    InvalidProxy { proxy: String, reason: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Returns all accepted language codes
pub fn valid_languages() -> impl Iterator<Item = &'static str> {
    LANGUAGES.iter().map(|(code, _)| *code)
}

/// Returns the numeric indexer id of a language code
pub fn language_id(code: &str) -> Option<u32> {
    LANGUAGES
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|(_, id)| *id)
}

/// On-disk response cache settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Overrides the platform cache directory
    pub location: Option<PathBuf>,
    /// Maximum age of a cached response, in seconds
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            location: None,
            ttl_secs: 24 * 60 * 60,
        }
    }
}

/// Backoff settings for network requests
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_secs: u64,
    pub backoff: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            initial_delay_secs: policy.initial_delay.as_secs(),
            backoff: policy.backoff,
        }
    }
}

/// Complete configuration of an [`IndexerClient`](crate::IndexerClient)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Preferred language, one of [`valid_languages`]
    pub language: String,
    /// File episodes by disc order where available
    pub dvd_order: bool,
    pub cache: CacheConfig,
    /// Number of recent insertions kept by the show cache on a sweep
    pub retention_size: usize,
    /// Minimum number of seconds between two show cache sweeps
    pub sweep_interval_secs: u64,
    /// Fetch the cast when loading a show by name
    pub actors: bool,
    /// Fetch artwork when loading a show by name
    pub banners: bool,
    pub proxy: Option<String>,
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub retry: RetryConfig,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            dvd_order: false,
            cache: CacheConfig::default(),
            retention_size: DEFAULT_RETENTION_SIZE,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL.as_secs(),
            actors: false,
            banners: false,
            proxy: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            retry: RetryConfig::default(),
        }
    }
}

impl IndexerConfig {
    /// Parses a configuration from TOML text
    ///
    /// Missing keys keep their defaults. The result is not validated yet.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Reads a configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Checks every setting that could make the client misbehave later
    pub fn validate(&self) -> Result<(), ConfigError> {
        if language_id(&self.language).is_none() {
            return Err(ConfigError::InvalidLanguage {
                language: self.language.clone(),
                options: valid_languages().collect::<Vec<_>>().join(", "),
            });
        }

        if let Some(ref location) = self.cache.location {
            if location.as_os_str().is_empty() {
                return Err(ConfigError::InvalidCacheLocation {
                    path: location.clone(),
                    reason: "path is empty".to_string(),
                });
            }
            if location.exists() && !location.is_dir() {
                return Err(ConfigError::InvalidCacheLocation {
                    path: location.clone(),
                    reason: "path exists but is not a directory".to_string(),
                });
            }
        }

        if self.retention_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retention_size",
                reason: "must keep at least one show".to_string(),
            });
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.max_attempts",
                reason: "must allow at least one attempt".to_string(),
            });
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_secs",
                reason: "must allow requests some time".to_string(),
            });
        }

        if let Some(ref proxy) = self.proxy {
            reqwest::Proxy::all(proxy.as_str()).map_err(|e| ConfigError::InvalidProxy {
                proxy: proxy.clone(),
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }

    /// Directory of the response cache, or `None` when caching is disabled
    pub fn cache_dir(&self) -> Result<Option<PathBuf>, ConfigError> {
        if !self.cache.enabled {
            return Ok(None);
        }
        if let Some(ref location) = self.cache.location {
            return Ok(Some(location.clone()));
        }
        let proj_dirs = directories::ProjectDirs::from("com", "tvmaze", "maze-indexer")
            .ok_or(ConfigError::CacheDirectoryNotFound)?;
        Ok(Some(proj_dirs.cache_dir().join("responses")))
    }

    pub fn episode_order(&self) -> EpisodeOrder {
        if self.dvd_order {
            EpisodeOrder::Dvd
        } else {
            EpisodeOrder::Broadcast
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            initial_delay: Duration::from_secs(self.retry.initial_delay_secs),
            backoff: self.retry.backoff,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = IndexerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.episode_order(), EpisodeOrder::Broadcast);
        assert_eq!(config.retention_size, 100);
        assert_eq!(config.sweep_interval(), Duration::from_secs(20));
    }

    #[test]
    fn test_rejects_unknown_language() {
        let config = IndexerConfig {
            language: "xx".to_string(),
            ..IndexerConfig::default()
        };
        let error = config.validate().unwrap_err();
        assert!(matches!(error, ConfigError::InvalidLanguage { ref language, .. } if language == "xx"));
        assert!(error.to_string().contains("en"));
    }

    #[test]
    fn test_language_ids() {
        assert_eq!(language_id("en"), Some(7));
        assert_eq!(language_id("ko"), Some(32));
        assert_eq!(language_id("xx"), None);
        assert_eq!(valid_languages().count(), 23);
    }

    #[test]
    fn test_rejects_file_as_cache_location() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = IndexerConfig {
            cache: CacheConfig {
                location: Some(file.path().to_path_buf()),
                ..CacheConfig::default()
            },
            ..IndexerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCacheLocation { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_cache_location() {
        let config = IndexerConfig {
            cache: CacheConfig {
                location: Some(PathBuf::new()),
                ..CacheConfig::default()
            },
            ..IndexerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCacheLocation { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let mut config = IndexerConfig::default();
        config.retry.max_attempts = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "retry.max_attempts", .. })
        ));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = IndexerConfig {
            request_timeout_secs: 0,
            ..IndexerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "request_timeout_secs", .. })
        ));
    }

    #[test]
    fn test_cache_dir() {
        let disabled = IndexerConfig {
            cache: CacheConfig {
                enabled: false,
                ..CacheConfig::default()
            },
            ..IndexerConfig::default()
        };
        assert_eq!(disabled.cache_dir().unwrap(), None);

        let custom = IndexerConfig {
            cache: CacheConfig {
                location: Some(PathBuf::from("/tmp/maze")),
                ..CacheConfig::default()
            },
            ..IndexerConfig::default()
        };
        assert_eq!(custom.cache_dir().unwrap(), Some(PathBuf::from("/tmp/maze")));
    }

    #[test]
    fn test_from_toml() {
        let config = IndexerConfig::from_toml_str(
            r#"
            language = "de"
            dvd_order = true
            actors = true

            [cache]
            enabled = false

            [retry]
            max_attempts = 2
            "#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.language, "de");
        assert_eq!(config.episode_order(), EpisodeOrder::Dvd);
        assert!(config.actors);
        assert!(!config.cache.enabled);
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.initial_delay_secs, 3);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }
}
