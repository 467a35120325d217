//! Application Layer
//!
//! Wires the domain and infrastructure into a running bridge.

pub mod bridge;
pub mod dispatcher;

pub use bridge::{ListenSubscription, PubSubBridge};
pub use dispatcher::{decode_event, LoggingTokenRefresher, MessageDispatcher, TokenRefresher};
