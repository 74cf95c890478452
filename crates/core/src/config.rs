//! Configuration management
//!
//! All defaults live in this module. The configuration file is TOML, stored
//! at `$SCDN_CONFIG_DIR/config.toml` or `<config dir>/scdn/config.toml`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;

/// Canonical auth endpoint of the storage provider
pub const DEFAULT_AUTH_URL: &str = "https://auth.selcdn.ru/";

/// Seconds before real expiry at which the token is refreshed
pub const DEFAULT_THRESHOLD_SECS: u64 = 30 * 60;

/// Transport connect timeout
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "SCDN_CONFIG_DIR";

const CONFIG_FILE_NAME: &str = "config.toml";

/// User/password pair exchanged for a bearer token
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Fail fast when either half is missing
    pub fn validate(&self) -> Result<()> {
        if self.user.is_empty() || self.password.is_empty() {
            return Err(Error::Config("missing user or password".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Token refresh and retry behaviour, fixed for the client's lifetime
#[derive(Debug, Clone, PartialEq)]
pub struct OperationConfig {
    /// Safety margin before real token expiry
    pub threshold: Duration,
    /// Retry policy wrapped around every object operation
    pub retry: RetryPolicy,
}

impl Default for OperationConfig {
    fn default() -> Self {
        Self {
            threshold: Duration::from_secs(DEFAULT_THRESHOLD_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

/// Settings consumed by the Swift client
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub user: String,
    pub password: String,
    pub auth_url: String,
    /// Seconds of slack before token expiry
    pub threshold_secs: u64,
    /// Maximum attempts per operation; unset means a single attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retry: Option<u32>,
    /// Fixed delay between attempts, in seconds
    pub retry_delay_secs: f64,
    pub connect_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user: String::new(),
            password: String::new(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            threshold_secs: DEFAULT_THRESHOLD_SECS,
            max_retry: None,
            retry_delay_secs: 0.0,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("user", &self.user)
            .field("password", &"***")
            .field("auth_url", &self.auth_url)
            .field("threshold_secs", &self.threshold_secs)
            .field("max_retry", &self.max_retry)
            .field("retry_delay_secs", &self.retry_delay_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl ClientConfig {
    /// Create a config with the given credentials and default everything else
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    /// Validate settings that do not involve the network
    ///
    /// Credentials are checked at authentication time instead.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.auth_url)
            .map_err(|e| Error::Config(format!("invalid auth URL '{}': {e}", self.auth_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "auth URL must use http or https: {}",
                self.auth_url
            )));
        }
        self.retry_delay()?;
        Ok(())
    }

    /// Retry delay as a `Duration`; negative, non-finite or overflowing values are rejected
    fn retry_delay(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.retry_delay_secs).map_err(|e| {
            Error::Config(format!(
                "retry delay must be a non-negative number of seconds, got {}: {e}",
                self.retry_delay_secs
            ))
        })
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.user, &self.password)
    }

    /// Threshold and retry settings derived from this config
    pub fn operation(&self) -> Result<OperationConfig> {
        self.validate()?;
        Ok(OperationConfig {
            threshold: Duration::from_secs(self.threshold_secs),
            retry: RetryPolicy::new(self.max_retry, self.retry_delay()?),
        })
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Settings consumed by the storage adapter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Container name to custom domain used for public URLs
    pub domains: BTreeMap<String, String>,
    /// Replace existing objects instead of picking a free name
    pub overwrite_files: bool,
    /// Gzip payloads before upload and gunzip after download
    pub use_gz: bool,
}

/// Contents of the configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub client: ClientConfig,
    pub storage: StorageSettings,
}

/// Loads and saves the configuration file
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Use the default location, honouring `SCDN_CONFIG_DIR`
    pub fn new() -> Result<Self> {
        let dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("cannot determine config directory".to_string()))?
                .join("scdn"),
        };
        Ok(Self::with_path(dir.join(CONFIG_FILE_NAME)))
    }

    /// Use an explicit file path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config, falling back to defaults when the file does not exist
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "Config file not found, using defaults");
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.path, content)?;
        tracing::debug!(path = %self.path.display(), "Config saved");
        Ok(())
    }
}
