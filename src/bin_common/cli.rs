//! CLI utilities for binaries
//!
//! Handles positional arguments and the configuration file location.

use std::path::PathBuf;
use thiserror::Error;

pub const USAGE: &str = "Usage: pubsub-bridge <channel_id> <auth_token>";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CliError {
    #[error("Missing argument <{0}>\n{}", USAGE)]
    MissingArgument(&'static str),

    #[error("Unexpected argument {0:?}\n{}", USAGE)]
    UnexpectedArgument(String),
}

/// Type of configuration to load
#[derive(Debug, Clone)]
pub enum ConfigType {
    /// Bridge configuration (config/bridge.yaml)
    Bridge,
    /// Custom path
    Custom(String),
}

impl ConfigType {
    /// Get the default path for this config type
    pub fn default_path(&self) -> &str {
        match self {
            ConfigType::Bridge => "config/bridge.yaml",
            ConfigType::Custom(path) => path,
        }
    }

    /// Get the environment variable name for this config type
    pub fn env_var_name(&self) -> &str {
        "BRIDGE_CONFIG_PATH"
    }
}

/// Load configuration path from environment or use default
///
/// # Examples
/// ```
/// use twitch_pubsub_bridge::bin_common::{load_config_from_env, ConfigType};
///
/// let path = load_config_from_env(ConfigType::Bridge);
/// ```
pub fn load_config_from_env(config_type: ConfigType) -> PathBuf {
    std::env::var(config_type.env_var_name())
        .unwrap_or_else(|_| config_type.default_path().to_string())
        .into()
}

/// Parse command line arguments for a binary
///
/// Returns a vector of arguments (excluding the program name)
pub fn parse_args() -> Vec<String> {
    std::env::args().skip(1).collect()
}

/// Positional arguments of `pubsub-bridge`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeArgs {
    pub channel_id: String,
    pub auth_token: String,
}

impl BridgeArgs {
    pub fn from_args(args: &[String]) -> Result<Self, CliError> {
        let mut args = args.iter();

        let channel_id = args
            .next()
            .ok_or(CliError::MissingArgument("channel_id"))?
            .clone();
        let auth_token = args
            .next()
            .ok_or(CliError::MissingArgument("auth_token"))?
            .clone();

        if let Some(extra) = args.next() {
            return Err(CliError::UnexpectedArgument(extra.clone()));
        }

        Ok(Self {
            channel_id,
            auth_token,
        })
    }
}
