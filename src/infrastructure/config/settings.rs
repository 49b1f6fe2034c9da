//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file; the Telegram bot token comes from
//! the `TELEGRAM_BOT_TOKEN` environment variable.
//!
//! # Example
//!
//! ```no_run
//! use storewatch::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::logging::LoggingConfig;
use super::telegram::{token_from_env, TelegramAppConfig};
use crate::adapter::outbound::expand_catalog_url;
use crate::application::broadcast::BroadcastConfig;
use crate::application::scheduler::SchedulerConfig;
use crate::error::{ConfigError, Result};

/// Polling cadence.
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    /// Seconds between the starts of two cycles (default: 300).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Upper bound on a single catalog fetch (default: 30).
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

const fn default_interval_secs() -> u64 {
    300
}

const fn default_fetch_timeout_secs() -> u64 {
    30
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

/// Catalog endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// URL template; `{seller_id}` is replaced with the configured seller.
    #[serde(default)]
    pub url: String,
    /// Sort fetched listings by id before detection.
    #[serde(default = "default_true")]
    pub sort_by_id: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            sort_by_id: true,
        }
    }
}

/// Cache Store file.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
    /// Refuse to start on a missing, corrupt or unreadable cache file.
    #[serde(default)]
    pub strict: bool,
    /// Record the first catalog without announcing when the cache is empty.
    #[serde(default = "default_true")]
    pub prime_on_empty: bool,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("cache.json")
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            strict: false,
            prime_on_empty: true,
        }
    }
}

/// Chat Registry file.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatsConfig {
    #[serde(default = "default_chats_path")]
    pub path: PathBuf,
}

fn default_chats_path() -> PathBuf {
    PathBuf::from("chats.txt")
}

impl Default for ChatsConfig {
    fn default() -> Self {
        Self {
            path: default_chats_path(),
        }
    }
}

/// Fan-out limits.
#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastSettings {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

const fn default_concurrency() -> usize {
    8
}

const fn default_send_timeout_secs() -> u64 {
    10
}

const fn default_shutdown_grace_secs() -> u64 {
    5
}

impl Default for BroadcastSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            send_timeout_secs: default_send_timeout_secs(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

const fn default_true() -> bool {
    true
}

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Seller whose catalog is watched. Required.
    #[serde(default)]
    pub seller_id: String,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub chats: ChatsConfig,

    #[serde(default)]
    pub broadcast: BroadcastSettings,

    /// Telegram bot configuration.
    #[serde(default)]
    pub telegram: TelegramAppConfig,

    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values supplied on the command line. Each `Some` replaces the file value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub seller_id: Option<String>,
    pub chats_path: Option<PathBuf>,
    pub cache_path: Option<PathBuf>,
    pub bot_token: Option<String>,
    pub debug: bool,
    pub json_logs: bool,
    pub no_prime: bool,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// Loads the bot token from the `TELEGRAM_BOT_TOKEN` environment variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        Self::parse_with_overrides(content, &ConfigOverrides::default())
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_overrides(path, &ConfigOverrides::default())
    }

    /// Load a TOML file, apply command-line overrides, then validate.
    #[allow(clippy::result_large_err)]
    pub fn load_with_overrides<P: AsRef<Path>>(
        path: P,
        overrides: &ConfigOverrides,
    ) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_with_overrides(&content, overrides)
    }

    #[allow(clippy::result_large_err)]
    fn parse_with_overrides(content: &str, overrides: &ConfigOverrides) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        // Secrets come from the environment, never from the config file.
        config.telegram.bot_token = token_from_env();
        config.apply(overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(seller_id) = &overrides.seller_id {
            self.seller_id.clone_from(seller_id);
        }
        if let Some(path) = &overrides.chats_path {
            self.chats.path.clone_from(path);
        }
        if let Some(path) = &overrides.cache_path {
            self.cache.path.clone_from(path);
        }
        if let Some(token) = &overrides.bot_token {
            self.telegram.bot_token = Some(token.clone());
        }
        if overrides.debug {
            self.logging.level = "debug".into();
        }
        if overrides.json_logs {
            self.logging.format = "json".into();
        }
        if overrides.no_prime {
            self.cache.prime_on_empty = false;
        }
    }

    /// Validate configuration values.
    ///
    /// Checks that all required fields are present and values are within
    /// acceptable ranges.
    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.seller_id.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "seller_id" }.into());
        }
        if self.poll.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll.interval_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.poll.fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll.fetch_timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.catalog.url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "catalog.url",
            }
            .into());
        }
        self.catalog_url()?;

        if self.broadcast.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "broadcast.concurrency",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.broadcast.send_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "broadcast.send_timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if !self.logging.is_known_format() {
            return Err(ConfigError::InvalidValue {
                field: "logging.format",
                reason: format!("unknown format `{}` (use: pretty, json)", self.logging.format),
            }
            .into());
        }

        Ok(())
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// The catalog URL with the seller substituted.
    #[allow(clippy::result_large_err)]
    pub fn catalog_url(&self) -> Result<url::Url> {
        expand_catalog_url(&self.catalog.url, &self.seller_id).map_err(|e| {
            ConfigError::InvalidValue {
                field: "catalog.url",
                reason: e.to_string(),
            }
            .into()
        })
    }

    #[must_use]
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            seller_id: self.seller_id.clone(),
            poll_interval: Duration::from_secs(self.poll.interval_secs),
            fetch_timeout: Duration::from_secs(self.poll.fetch_timeout_secs),
            sort_by_id: self.catalog.sort_by_id,
            prime_on_empty: self.cache.prime_on_empty,
        }
    }

    #[must_use]
    pub fn broadcast_config(&self) -> BroadcastConfig {
        BroadcastConfig {
            concurrency: self.broadcast.concurrency,
            send_timeout: Duration::from_secs(self.broadcast.send_timeout_secs),
            shutdown_grace: Duration::from_secs(self.broadcast.shutdown_grace_secs),
        }
    }
}
