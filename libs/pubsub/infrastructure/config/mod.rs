use crate::infrastructure::upload::RetryPolicy;
use hypersockets::ExponentialBackoff;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarMissing(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

pub const DEFAULT_PUBSUB_URL: &str = "wss://pubsub-edge.twitch.tv";

const ROOT_URL_VAR: &str = "ROOTURL";
const API_KEY_VAR: &str = "APIKEY";

/// Bridge configuration
///
/// Tunables come from YAML; the channel and token from the command line;
/// the sink URL and key from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// PubSub WebSocket endpoint
    #[serde(default = "default_pubsub_url")]
    pub pubsub_url: String,
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,

    /// Channel id from the CLI (not in YAML)
    #[serde(skip)]
    pub channel_id: String,

    /// OAuth token from the CLI (not in YAML)
    #[serde(skip)]
    pub auth_token: String,

    /// Sink root URL from .env (not in YAML)
    #[serde(skip)]
    pub root_url: String,

    /// Sink API key from .env (not in YAML)
    #[serde(skip)]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    #[serde(default = "default_heartbeat_interval")]
    pub interval_secs: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_heartbeat_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per event, initial one included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_min_delay")]
    pub min_delay_secs: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            min_delay_secs: default_min_delay(),
            max_delay_secs: default_max_delay(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Backoff floor
    #[serde(default = "default_reconnect_initial")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_reconnect_max")]
    pub max_delay_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_reconnect_initial(),
            max_delay_secs: default_reconnect_max(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            pubsub_url: default_pubsub_url(),
            log_level: default_log_level(),
            heartbeat: HeartbeatConfig::default(),
            retry: RetryConfig::default(),
            reconnect: ReconnectConfig::default(),
            channel_id: String::new(),
            auth_token: String::new(),
            root_url: String::new(),
            api_key: String::new(),
        }
    }
}

impl BridgeConfig {
    /// Load the full configuration
    ///
    /// A missing YAML file means defaults. `ROOTURL` and `APIKEY` are read
    /// after loading `.env`.
    pub fn load(
        config_path: impl AsRef<Path>,
        channel_id: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Result<Self> {
        let mut config = Self::from_file(config_path)?;
        config.channel_id = channel_id.into();
        config.auth_token = auth_token.into();

        let (root_url, api_key) = Self::secrets_from_env()?;
        config.root_url = root_url;
        config.api_key = api_key;

        config.validate()?;
        Ok(config)
    }

    /// Tunables only; defaults when the file does not exist
    pub fn from_file(config_path: impl AsRef<Path>) -> Result<Self> {
        let path = config_path.as_ref();
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let yaml_content = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml_content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// `(ROOTURL, APIKEY)` from the environment or `.env`
    pub fn secrets_from_env() -> Result<(String, String)> {
        dotenv::dotenv().ok();

        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::EnvVarMissing(name.to_string()))
        };

        Ok((read(ROOT_URL_VAR)?, read(API_KEY_VAR)?))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

        if self.channel_id.trim().is_empty() {
            return invalid("channel_id must not be empty");
        }

        if self.auth_token.trim().is_empty() {
            return invalid("auth_token must not be empty");
        }

        if !(self.pubsub_url.starts_with("ws://") || self.pubsub_url.starts_with("wss://")) {
            return invalid("pubsub_url must start with ws:// or wss://");
        }

        if !(self.root_url.starts_with("http://") || self.root_url.starts_with("https://")) {
            return invalid("ROOTURL must start with http:// or https://");
        }

        if self.heartbeat.interval_secs == 0 {
            return invalid("heartbeat.interval_secs must be greater than 0");
        }

        if self.retry.max_attempts == 0 {
            return invalid("retry.max_attempts must be at least 1");
        }

        if self.retry.min_delay_secs > self.retry.max_delay_secs {
            return invalid("retry.min_delay_secs must not exceed retry.max_delay_secs");
        }

        if self.reconnect.initial_delay_ms == 0 {
            return invalid("reconnect.initial_delay_ms must be greater than 0");
        }

        if self.reconnect.connect_timeout_secs == 0 {
            return invalid("reconnect.connect_timeout_secs must be greater than 0");
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat.interval_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_secs(self.retry.min_delay_secs),
            Duration::from_secs(self.retry.max_delay_secs),
        )
    }

    /// Unbounded exponential backoff between the configured floor and cap
    pub fn reconnect_strategy(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(
            Duration::from_millis(self.reconnect.initial_delay_ms),
            Duration::from_secs(self.reconnect.max_delay_secs),
            None,
        )
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.reconnect.connect_timeout_secs)
    }

    /// Log configuration summary
    pub fn log(&self) {
        info!("Configuration loaded:");
        info!("  PubSub url: {}", self.pubsub_url);
        info!("  Channel id: {}", self.channel_id);
        info!("  Auth token: {}", redact(&self.auth_token));
        info!("  Sink root url: {}", self.root_url);
        info!("  Sink api key: {}", redact(&self.api_key));
        info!("  Heartbeat: every {}s", self.heartbeat.interval_secs);
        info!(
            "  Upload retry: {} attempts, {}-{}s jitter",
            self.retry.max_attempts, self.retry.min_delay_secs, self.retry.max_delay_secs
        );
        info!(
            "  Reconnect backoff: {}ms up to {}s",
            self.reconnect.initial_delay_ms, self.reconnect.max_delay_secs
        );
        info!("  Log level: {}", self.log_level);
    }
}

/// Keep only a short prefix of a secret for logs
fn redact(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

fn default_pubsub_url() -> String {
    DEFAULT_PUBSUB_URL.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_heartbeat_interval() -> u64 {
    300
}

fn default_max_attempts() -> u32 {
    3
}

fn default_min_delay() -> u64 {
    5
}

fn default_max_delay() -> u64 {
    15
}

fn default_reconnect_initial() -> u64 {
    1000
}

fn default_reconnect_max() -> u64 {
    120
}

fn default_connect_timeout() -> u64 {
    30
}
