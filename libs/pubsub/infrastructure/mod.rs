//! Infrastructure Layer
//!
//! HTTP event sink, upload retries, configuration, logging and signals.

pub mod config;
pub mod logging;
pub mod shutdown;
pub mod sink;
pub mod upload;

pub use config::{BridgeConfig, ConfigError};
pub use logging::init_tracing;
pub use shutdown::ShutdownManager;
pub use sink::{EventSink, HttpEventSink, SinkError};
pub use upload::{RetryPolicy, RetryState, UploadOutcome, UploadRetrier};
