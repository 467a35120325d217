//! Twitch PubSub Bridge
//!
//! Listens to one channel's PubSub topics and forwards bits and
//! subscription events to a PostgREST-style ingestion endpoint.
//!
//! ## Layers
//!
//! - **domain**: event models, topic registry
//! - **protocol**: PubSub wire frames
//! - **application**: frame dispatcher and bridge composition
//! - **infrastructure**: HTTP sink, upload retrier, config, logging, shutdown

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod protocol;

// Re-export commonly used items
pub use application::{
    LoggingTokenRefresher, ListenSubscription, MessageDispatcher, PubSubBridge, TokenRefresher,
};
pub use domain::{
    build_topics, BitsEvent, EventKind, PubSubEvent, SubEvent, TopicDescriptor, TopicKind,
    TopicRegistry,
};
pub use infrastructure::{
    init_tracing, BridgeConfig, ConfigError, EventSink, HttpEventSink, RetryPolicy,
    ShutdownManager, SinkError, UploadOutcome, UploadRetrier,
};
pub use protocol::{ClientFrame, DecodeError, ServerMessage};
