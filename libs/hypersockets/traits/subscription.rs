use crate::error::Result;
use crate::message::WsMessage;
use async_trait::async_trait;

/// Trait for providing the subscription sequence sent on every open
///
/// Called immediately after a WebSocket connection is established (or
/// re-established after reconnection), before the heartbeat starts.
#[async_trait]
pub trait SubscriptionProvider: Send + Sync {
    /// Messages to send, in order, right after the transport opens
    ///
    /// # Returns
    /// * `Ok(messages)` - Send these messages
    /// * `Err(HyperSocketError)` - Subscription preparation failed; the
    ///   session is treated as a transport failure
    async fn subscription_messages(&self) -> Result<Vec<WsMessage>>;
}

/// A fixed list of subscription messages
pub struct StaticSubscriptions(pub Vec<WsMessage>);

#[async_trait]
impl SubscriptionProvider for StaticSubscriptions {
    async fn subscription_messages(&self) -> Result<Vec<WsMessage>> {
        Ok(self.0.clone())
    }
}
