//! PubSub bridge
//!
//! Composes the connection manager, dispatcher and upload retrier for one
//! channel.

use super::dispatcher::{MessageDispatcher, TokenRefresher};
use crate::domain::TopicRegistry;
use crate::infrastructure::{BridgeConfig, EventSink, UploadRetrier};
use crate::protocol::ClientFrame;
use anyhow::Result;
use async_trait::async_trait;
use hypersockets::{
    ClientEvent, ClientHandle, HyperSocketError, SubscriptionProvider, WebSocketClient, WsMessage,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Sends one LISTEN for every registered topic on each (re)connect
pub struct ListenSubscription {
    registry: Arc<TopicRegistry>,
    auth_token: String,
}

impl ListenSubscription {
    pub fn new(registry: Arc<TopicRegistry>, auth_token: impl Into<String>) -> Self {
        Self {
            registry,
            auth_token: auth_token.into(),
        }
    }
}

#[async_trait]
impl SubscriptionProvider for ListenSubscription {
    async fn subscription_messages(&self) -> hypersockets::Result<Vec<WsMessage>> {
        let names: Vec<&str> = self
            .registry
            .descriptors()
            .iter()
            .map(|d| d.logical_name())
            .collect();
        info!("[PubSub WS] Subscribing to {:?}", names);

        let listen = ClientFrame::Listen {
            topics: self.registry.wire_topics(),
            auth_token: self.auth_token.clone(),
        };
        listen
            .to_message()
            .map(|frame| vec![frame])
            .map_err(|e| HyperSocketError::Subscription(e.to_string()))
    }
}

/// One channel's PubSub feed forwarded to the event sink
pub struct PubSubBridge {
    client: WebSocketClient<MessageDispatcher>,
    retrier: UploadRetrier,
}

impl PubSubBridge {
    pub fn new(
        config: &BridgeConfig,
        sink: Arc<dyn EventSink>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Result<Self> {
        let registry = Arc::new(TopicRegistry::new(&config.channel_id));
        let retrier = UploadRetrier::new(sink, config.retry_policy());

        let dispatcher = MessageDispatcher::new(
            Arc::clone(&registry),
            retrier.clone(),
            refresher,
            config.auth_token.clone(),
        );

        let client = hypersockets::builder()
            .url(config.pubsub_url.clone())
            .handler(dispatcher)
            .subscriptions(ListenSubscription::new(registry, config.auth_token.clone()))
            .heartbeat(config.heartbeat_interval(), ClientFrame::Ping.to_message()?)
            .reconnect_strategy(config.reconnect_strategy())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self { client, retrier })
    }

    /// Control handle for the underlying connection
    pub fn handle(&self) -> ClientHandle {
        self.client.handle()
    }

    pub fn retrier(&self) -> &UploadRetrier {
        &self.retrier
    }

    /// Connection lifecycle events
    pub fn events(&mut self) -> mpsc::UnboundedReceiver<ClientEvent> {
        self.client.events()
    }

    /// Run until reconnection is disabled, then wait for pending uploads
    pub async fn run(self) -> Result<()> {
        let Self { client, retrier } = self;

        let result = client.run().await;

        let pending = retrier.in_flight();
        if pending > 0 {
            info!("[Upload] Waiting for {} pending upload(s)", pending);
        }
        retrier.wait_idle().await;

        result?;
        Ok(())
    }
}
