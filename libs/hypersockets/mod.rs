//! # HyperSockets
//!
//! A small WebSocket connection manager for long-lived subscription feeds.
//!
//! ## Features
//!
//! - **Explicit state machine**: Disconnected, Connecting, Open, Closing, Reconnecting
//! - **Single-loop dispatch**: inbound frames handled strictly in order on the connection task
//! - **Type-state builder**: Compile-time guarantees for required configuration
//! - **Modular design**: Pluggable subscription sequence, heartbeat and reconnection strategy
//! - **Reconnect gate**: handlers can disable or force reconnection per frame

pub mod core;
pub mod traits;

// Re-export all traits
pub use traits::*;

// Re-export core client functionality
pub use self::core::{
    builder, client, config, connection_state, heartbeat,
    builder::{states, WebSocketClientBuilder},
    client::{ClientEvent, ClientHandle, Metrics, WebSocketClient},
    config::ClientConfig,
    connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState, ReconnectFlag},
};

// Convenience function
pub use self::core::builder as client_builder;

/// Type alias for Result with HyperSocketError
pub type Result<T> = std::result::Result<T, traits::HyperSocketError>;
