//! # HyperSockets Traits
//!
//! Core traits and types for the HyperSockets WebSocket client:
//!
//! - **FrameHandler**: Handle inbound frames sequentially and steer the session
//! - **SubscriptionProvider**: Produce the subscription sequence on every open
//! - **ReconnectionStrategy**: Control reconnection backoff

pub mod error;
pub mod handler;
pub mod message;
pub mod reconnect;
pub mod subscription;

pub use error::{HyperSocketError, Result};
pub use handler::{Directive, FrameHandler};
pub use message::WsMessage;
pub use reconnect::{ExponentialBackoff, ReconnectionStrategy};
pub use subscription::{StaticSubscriptions, SubscriptionProvider};
