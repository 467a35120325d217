//! # HyperSockets core
//!
//! The connection manager and its building blocks:
//!
//! - [`builder`]: type-state builder (URL and frame handler required)
//! - [`client`]: the connection loop, [`ClientHandle`] and lifecycle events
//! - [`connection_state`]: atomic state, reconnect-allowed flag and counters
//! - [`heartbeat`]: keep-alive task bound to one open session
//!
//! ## Example
//!
//! ```rust,ignore
//! use hypersockets::core::*;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> hypersockets::Result<()> {
//!     let client = hypersockets::builder()
//!         .url("wss://pubsub-edge.twitch.tv")
//!         .handler(MyDispatcher::new())
//!         .subscriptions(MyListen::new())
//!         .heartbeat(Duration::from_secs(300), WsMessage::text(r#"{"type":"PING"}"#))
//!         .reconnect_strategy(ExponentialBackoff::new(
//!             Duration::from_secs(1),
//!             Duration::from_secs(120),
//!             None, // unlimited retries
//!         ))
//!         .build()?;
//!
//!     let handle = client.handle();
//!     tokio::spawn(async move {
//!         let _ = tokio::signal::ctrl_c().await;
//!         let _ = handle.shutdown();
//!     });
//!
//!     client.run().await
//! }
//! ```

pub mod builder;
pub mod client;
pub mod config;
pub mod connection_state;
pub mod heartbeat;

// Re-export main types
pub use builder::{states, WebSocketClientBuilder};
pub use client::{ClientEvent, ClientHandle, Metrics, WebSocketClient};
pub use config::ClientConfig;
pub use connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState, ReconnectFlag};
pub use heartbeat::{spawn_heartbeat, Heartbeat};

// Re-export traits for convenience
pub use crate::traits::*;

/// Create a new WebSocket client builder
pub fn builder() -> WebSocketClientBuilder<builder::states::NoUrl, builder::states::NoHandler, ()> {
    WebSocketClientBuilder::new()
}
