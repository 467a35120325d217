pub mod states;

use crate::client::WebSocketClient;
use crate::config::{ClientConfig, DEFAULT_CONNECT_TIMEOUT};
use crate::connection_state::ReconnectFlag;
use crate::traits::*;
use states::*;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// Optional settings shared by every builder state
struct Options {
    subscriptions: Option<Arc<dyn SubscriptionProvider>>,
    heartbeat: Option<(Duration, WsMessage)>,
    reconnect_strategy: Option<Box<dyn ReconnectionStrategy>>,
    connect_timeout: Duration,
    reconnect_flag: Option<Arc<ReconnectFlag>>,
}

/// Type-state builder for [`WebSocketClient`]
///
/// The URL and the frame handler are required; `build()` only exists once
/// both have been set.
///
/// ```ignore
/// let client = hypersockets::builder()
///     .url("wss://pubsub-edge.twitch.tv")
///     .handler(MyDispatcher::new())
///     .subscriptions(MyListen::new())
///     .heartbeat(Duration::from_secs(300), WsMessage::text(r#"{"type":"PING"}"#))
///     .reconnect_strategy(ExponentialBackoff::default())
///     .build()?;
/// ```
pub struct WebSocketClientBuilder<U, Hs, H>
where
    U: UrlState,
    Hs: HandlerState,
{
    _state: TypeState<U, Hs>,
    url: Option<String>,
    handler: Option<H>,
    options: Options,
}

impl WebSocketClientBuilder<NoUrl, NoHandler, ()> {
    /// Create a new builder instance
    pub fn new() -> Self {
        Self {
            _state: TypeState::new(),
            url: None,
            handler: None,
            options: Options {
                subscriptions: None,
                heartbeat: None,
                reconnect_strategy: None,
                connect_timeout: DEFAULT_CONNECT_TIMEOUT,
                reconnect_flag: None,
            },
        }
    }
}

impl Default for WebSocketClientBuilder<NoUrl, NoHandler, ()> {
    fn default() -> Self {
        Self::new()
    }
}

// URL setting
impl<Hs, H> WebSocketClientBuilder<NoUrl, Hs, H>
where
    Hs: HandlerState,
{
    pub fn url(self, url: impl Into<String>) -> WebSocketClientBuilder<HasUrl, Hs, H> {
        WebSocketClientBuilder {
            _state: TypeState::new(),
            url: Some(url.into()),
            handler: self.handler,
            options: self.options,
        }
    }
}

// Handler setting
impl<U> WebSocketClientBuilder<U, NoHandler, ()>
where
    U: UrlState,
{
    pub fn handler<H>(self, handler: H) -> WebSocketClientBuilder<U, HasHandler, H>
    where
        H: FrameHandler,
    {
        WebSocketClientBuilder {
            _state: TypeState::new(),
            url: self.url,
            handler: Some(handler),
            options: self.options,
        }
    }
}

// Optional settings, available in every state
impl<U, Hs, H> WebSocketClientBuilder<U, Hs, H>
where
    U: UrlState,
    Hs: HandlerState,
{
    /// Subscription sequence sent after every successful open
    pub fn subscriptions<S>(mut self, provider: S) -> Self
    where
        S: SubscriptionProvider + 'static,
    {
        self.options.subscriptions = Some(Arc::new(provider));
        self
    }

    /// Keep-alive payload sent on open and then every `interval`
    pub fn heartbeat(mut self, interval: Duration, payload: WsMessage) -> Self {
        self.options.heartbeat = Some((interval, payload));
        self
    }

    pub fn reconnect_strategy<S>(mut self, strategy: S) -> Self
    where
        S: ReconnectionStrategy + 'static,
    {
        self.options.reconnect_strategy = Some(Box::new(strategy));
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = timeout;
        self
    }

    /// Share an externally owned reconnect-allowed flag
    pub fn reconnect_flag(mut self, flag: Arc<ReconnectFlag>) -> Self {
        self.options.reconnect_flag = Some(flag);
        self
    }
}

impl<H> WebSocketClientBuilder<HasUrl, HasHandler, H>
where
    H: FrameHandler,
{
    /// Validate the configuration and create the client
    ///
    /// The client does not connect until [`WebSocketClient::run`] is awaited.
    pub fn build(self) -> Result<WebSocketClient<H>> {
        let url = self
            .url
            .ok_or_else(|| HyperSocketError::Configuration("URL is required".into()))?;
        let handler = self
            .handler
            .ok_or_else(|| HyperSocketError::Configuration("Frame handler is required".into()))?;

        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(HyperSocketError::Configuration(format!(
                "URL must start with ws:// or wss://, got {}",
                url
            )));
        }

        if let Some((interval, _)) = &self.options.heartbeat {
            if interval.is_zero() {
                return Err(HyperSocketError::Configuration(
                    "Heartbeat interval must be greater than zero".into(),
                ));
            }
        }

        let options = self.options;
        let config = ClientConfig {
            url,
            subscriptions: options.subscriptions,
            heartbeat: options.heartbeat,
            reconnect_strategy: options
                .reconnect_strategy
                .unwrap_or_else(|| Box::new(ExponentialBackoff::default())),
            connect_timeout: options.connect_timeout,
            reconnect_flag: options
                .reconnect_flag
                .unwrap_or_else(|| Arc::new(ReconnectFlag::default())),
        };

        Ok(WebSocketClient::new(config, handler))
    }
}
