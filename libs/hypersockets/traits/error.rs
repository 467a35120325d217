use thiserror::Error;

/// Main error type for hypersockets
#[derive(Error, Debug)]
pub enum HyperSocketError {
    /// WebSocket transport error (handshake, read or write)
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Connection closed by the remote side
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// Subscription messages could not be produced
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// Command could not be delivered to the connection loop
    #[error("Channel send error: {0}")]
    ChannelSend(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Reconnection strategy gave up
    #[error("Reconnection failed after {attempts} attempts: {reason}")]
    ReconnectionFailed { attempts: usize, reason: String },

    /// Timeout error
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

/// Result type for hypersockets operations
pub type Result<T> = std::result::Result<T, HyperSocketError>;
