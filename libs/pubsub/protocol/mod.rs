//! PubSub wire protocol
//!
//! JSON frames exchanged with `wss://pubsub-edge.twitch.tv`.

pub mod frames;

pub use frames::{ClientFrame, DecodeError, ServerMessage, AUTH_ERROR_CODES};
