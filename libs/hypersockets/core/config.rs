use crate::core::connection_state::ReconnectFlag;
use crate::traits::*;
use std::sync::Arc;
use std::time::Duration;

/// Default time allowed for the TCP + TLS + WebSocket handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`WebSocketClient`](crate::core::client::WebSocketClient)
///
/// Built with the type-state builder; immutable once the client runs.
pub struct ClientConfig {
    /// WebSocket URL (wss:// or ws://)
    pub(crate) url: String,

    /// Optional subscription sequence sent on every open
    pub(crate) subscriptions: Option<Arc<dyn SubscriptionProvider>>,

    /// Optional heartbeat configuration (interval, payload)
    pub(crate) heartbeat: Option<(Duration, WsMessage)>,

    /// Reconnection strategy
    pub(crate) reconnect_strategy: Box<dyn ReconnectionStrategy>,

    /// Handshake timeout for each connection attempt
    pub(crate) connect_timeout: Duration,

    /// Reconnect-allowed flag, shared with client handles
    pub(crate) reconnect_flag: Arc<ReconnectFlag>,
}

impl ClientConfig {
    /// Get a reference to the URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Check if a subscription provider is configured
    pub fn has_subscriptions(&self) -> bool {
        self.subscriptions.is_some()
    }

    /// Heartbeat interval, if configured
    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.heartbeat.as_ref().map(|(interval, _)| *interval)
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}
