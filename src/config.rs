//! Configuration management for Cryptomoon
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{CryptomoonError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest accepted moon-phase cache lifetime (one year)
pub const MAX_MOON_TTL_HOURS: u64 = 24 * 365;

/// Longest accepted refresh interval (one year)
pub const MAX_REFRESH_INTERVAL_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Main configuration structure for Cryptomoon
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend endpoints
    #[serde(default)]
    pub backends: BackendsConfig,
    /// HTTP transport settings shared by both backends
    #[serde(default)]
    pub http: HttpConfig,
    /// Request context sent with chat messages
    #[serde(default)]
    pub chat: ChatConfig,
    /// Local cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Periodic summary refresh
    #[serde(default)]
    pub refresh: RefreshConfig,
}

/// Both backend endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendsConfig {
    /// Primary backend: prices, sentiment, news, coins
    #[serde(default = "default_crypto_backend")]
    pub crypto: BackendConfig,
    /// Secondary backend: moon phase and prediction
    #[serde(default = "default_moon_backend")]
    pub moon: BackendConfig,
}

/// A single backend endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL, without a trailing path
    pub base_url: String,
}

fn default_crypto_backend() -> BackendConfig {
    BackendConfig {
        base_url: "http://localhost:8080".to_string(),
    }
}

fn default_moon_backend() -> BackendConfig {
    BackendConfig {
        base_url: "http://localhost:8081".to_string(),
    }
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            crypto: default_crypto_backend(),
            moon: default_moon_backend(),
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Connection establishment timeout
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Whole-request timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// User-Agent header sent to both backends
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("cryptomoon/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_seconds: default_connect_timeout(),
            request_timeout_seconds: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    /// Connect timeout as a duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Request timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Context attached to every chat request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Locale tag, e.g. `ru-RU`
    #[serde(default = "default_locale")]
    pub locale: String,

    /// IANA timezone name
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_locale() -> String {
    "ru-RU".to_string()
}

fn default_timezone() -> String {
    "Europe/Moscow".to_string()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            timezone: default_timezone(),
        }
    }
}

/// Local cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding the cache files; the platform data directory
    /// is used when unset
    #[serde(default)]
    pub dir: Option<String>,

    /// Number of most recent transcript entries kept on save
    #[serde(default = "default_transcript_limit")]
    pub transcript_limit: usize,

    /// Lifetime of the cached moon phase
    #[serde(default = "default_moon_ttl_hours")]
    pub moon_ttl_hours: u64,
}

fn default_transcript_limit() -> usize {
    500
}

fn default_moon_ttl_hours() -> u64 {
    24
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            transcript_limit: default_transcript_limit(),
            moon_ttl_hours: default_moon_ttl_hours(),
        }
    }
}

impl CacheConfig {
    /// Moon-phase TTL as a chrono duration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the hour count does not fit a duration
    pub fn moon_ttl(&self) -> Result<chrono::Duration> {
        i64::try_from(self.moon_ttl_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .ok_or_else(|| {
                CryptomoonError::Config(format!(
                    "cache.moon_ttl_hours is out of range: {}",
                    self.moon_ttl_hours
                ))
                .into()
            })
    }

    /// Resolve the cache directory
    ///
    /// # Errors
    ///
    /// Returns an error if no directory is configured and the platform
    /// data directory cannot be determined
    pub fn resolve_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.dir {
            return Ok(PathBuf::from(dir));
        }

        let project_dirs = directories::ProjectDirs::from("dev", "cryptomoon", "cryptomoon")
            .ok_or_else(|| {
                CryptomoonError::Config("Could not determine a data directory".to_string())
            })?;
        Ok(project_dirs.data_dir().join("cache"))
    }
}

/// Periodic refresh configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between two summary refreshes
    #[serde(default = "default_refresh_interval")]
    pub interval_seconds: u64,
}

fn default_refresh_interval() -> u64 {
    60
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_refresh_interval(),
        }
    }
}

impl RefreshConfig {
    /// Interval as a duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    /// Check the interval is between one second and a year
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an out-of-range interval
    pub fn validate(&self) -> Result<()> {
        if self.interval_seconds == 0 {
            return Err(CryptomoonError::Config(
                "refresh.interval_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.interval_seconds > MAX_REFRESH_INTERVAL_SECONDS {
            return Err(CryptomoonError::Config(format!(
                "refresh.interval_seconds must be at most {}",
                MAX_REFRESH_INTERVAL_SECONDS
            ))
            .into());
        }

        Ok(())
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CryptomoonError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| CryptomoonError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(url) = std::env::var("CRYPTOMOON_CRYPTO_URL") {
            self.backends.crypto.base_url = url;
        }

        if let Ok(url) = std::env::var("CRYPTOMOON_MOON_URL") {
            self.backends.moon.base_url = url;
        }

        if let Ok(dir) = std::env::var("CRYPTOMOON_CACHE_DIR") {
            self.cache.dir = Some(dir);
        }

        if let Ok(locale) = std::env::var("CRYPTOMOON_LOCALE") {
            self.chat.locale = locale;
        }

        if let Ok(timezone) = std::env::var("CRYPTOMOON_TIMEZONE") {
            self.chat.timezone = timezone;
        }

        if let Ok(interval) = std::env::var("CRYPTOMOON_REFRESH_INTERVAL") {
            if let Ok(value) = interval.parse() {
                self.refresh.interval_seconds = value;
            } else {
                tracing::warn!("Invalid CRYPTOMOON_REFRESH_INTERVAL: {}", interval);
            }
        }

        if let Ok(timeout) = std::env::var("CRYPTOMOON_CONNECT_TIMEOUT") {
            if let Ok(value) = timeout.parse() {
                self.http.connect_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid CRYPTOMOON_CONNECT_TIMEOUT: {}", timeout);
            }
        }

        if let Ok(timeout) = std::env::var("CRYPTOMOON_REQUEST_TIMEOUT") {
            if let Ok(value) = timeout.parse() {
                self.http.request_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid CRYPTOMOON_REQUEST_TIMEOUT: {}", timeout);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(url) = &cli.crypto_url {
            self.backends.crypto.base_url = url.clone();
        }

        if let Some(url) = &cli.moon_url {
            self.backends.moon.base_url = url.clone();
        }

        if let Some(dir) = &cli.cache_dir {
            self.cache.dir = Some(dir.clone());
        }

        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// Ensures both backend URLs are absolute http(s) URLs, that every
    /// timeout, limit and interval is non-zero, and that the moon TTL and
    /// refresh interval stay within a year.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        validate_base_url("backends.crypto.base_url", &self.backends.crypto.base_url)?;
        validate_base_url("backends.moon.base_url", &self.backends.moon.base_url)?;

        if self.http.connect_timeout_seconds == 0 {
            return Err(CryptomoonError::Config(
                "http.connect_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.http.request_timeout_seconds == 0 {
            return Err(CryptomoonError::Config(
                "http.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.cache.transcript_limit == 0 {
            return Err(CryptomoonError::Config(
                "cache.transcript_limit must be greater than 0".to_string(),
            )
            .into());
        }

        if self.cache.moon_ttl_hours == 0 {
            return Err(CryptomoonError::Config(
                "cache.moon_ttl_hours must be greater than 0".to_string(),
            )
            .into());
        }

        if self.cache.moon_ttl_hours > MAX_MOON_TTL_HOURS {
            return Err(CryptomoonError::Config(format!(
                "cache.moon_ttl_hours must be at most {}",
                MAX_MOON_TTL_HOURS
            ))
            .into());
        }

        self.refresh.validate()
    }
}

fn validate_base_url(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CryptomoonError::Config(format!("{} cannot be empty", field)).into());
    }

    let parsed = url::Url::parse(value)
        .map_err(|e| CryptomoonError::Config(format!("{} is not a valid URL: {}", field, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(CryptomoonError::Config(format!(
            "{} must use http or https, got {}",
            field, other
        ))
        .into()),
    }
}
