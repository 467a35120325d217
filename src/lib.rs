//! Twitch PubSub Bridge - Main Library
//!
//! This crate provides the main library for the bridge binary,
//! following Clean Architecture principles.
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (CLI, runners)
//! - **twitch_pubsub**: Bridge domain and services (re-exported from workspace)
//! - **hypersockets**: WebSocket library (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust,ignore
//! use twitch_pubsub_bridge::bin_common::{load_config_from_env, parse_args, BridgeArgs, ConfigType};
//! use twitch_pubsub_bridge::twitch_pubsub::PubSubBridge;
//! ```

// Re-export workspace libraries for convenience
pub use hypersockets;
pub use twitch_pubsub;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables
    //!
    //! Provides shared functionality for the presentation layer (binaries)
    //! following Clean Architecture principles.

    pub mod cli;
    pub mod runner;

    pub use cli::{load_config_from_env, parse_args, BridgeArgs, CliError, ConfigType};
    pub use runner::{BinaryRunner, RunConfig, RunSummary};
}
