//! Message dispatcher
//!
//! Runs on the connection loop for every inbound frame, in order. MESSAGE
//! frames for forwarded topics become uploads; control frames become a
//! [`Directive`] for the connection manager. Nothing here returns an error:
//! a frame that fails to decode is logged and the connection stays open.

use crate::domain::{PubSubEvent, TopicRegistry, BITS_EVENTS_MARKER};
use crate::infrastructure::UploadRetrier;
use crate::protocol::{DecodeError, ServerMessage, AUTH_ERROR_CODES};
use hypersockets::{Directive, FrameHandler, WsMessage};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Collaborator asked for a new token after a bad-authorization RESPONSE
pub trait TokenRefresher: Send + Sync {
    fn refresh(&self, auth_token: &str);
}

/// Token refresh is not automated: log it so an operator can act
pub struct LoggingTokenRefresher;

impl TokenRefresher for LoggingTokenRefresher {
    fn refresh(&self, _auth_token: &str) {
        warn!("[PubSub WS] Token refresh requested; issue a new auth token and restart the bridge");
    }
}

/// Decode a MESSAGE body for `topic`
///
/// `Ok(None)` when the topic has no handler. Bits notifications wrap the
/// event in one extra `data` object, which is removed before decoding.
pub fn decode_event(
    registry: &TopicRegistry,
    topic: &str,
    message: &str,
) -> Result<Option<PubSubEvent>, DecodeError> {
    let Some(kind) = registry.lookup(topic) else {
        return Ok(None);
    };

    let mut body: Value = serde_json::from_str(message)?;
    if topic.contains(BITS_EVENTS_MARKER) {
        body = match body {
            Value::Object(mut map) => map
                .remove("data")
                .ok_or(DecodeError::MissingField("message.data"))?,
            _ => return Err(DecodeError::MissingField("message.data")),
        };
    }

    kind.decode(body)
        .map(Some)
        .map_err(|source| DecodeError::Event { kind, source })
}

/// [`FrameHandler`] for the PubSub connection
pub struct MessageDispatcher {
    registry: Arc<TopicRegistry>,
    retrier: UploadRetrier,
    refresher: Arc<dyn TokenRefresher>,
    auth_token: String,
}

impl MessageDispatcher {
    pub fn new(
        registry: Arc<TopicRegistry>,
        retrier: UploadRetrier,
        refresher: Arc<dyn TokenRefresher>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            retrier,
            refresher,
            auth_token: auth_token.into(),
        }
    }

    /// React to one parsed server frame
    pub fn dispatch(&mut self, message: ServerMessage) -> Directive {
        match message {
            ServerMessage::Message { topic, message } => {
                self.forward(&topic, &message);
                Directive::Continue
            }
            ServerMessage::Pong => {
                debug!("[PubSub WS] PONG");
                Directive::Continue
            }
            ServerMessage::Response { error } if error.is_empty() => {
                info!("[PubSub WS] LISTEN acknowledged");
                Directive::Continue
            }
            ServerMessage::Response { error } if AUTH_ERROR_CODES.contains(&error.as_str()) => {
                error!(frame = "RESPONSE", "[PubSub WS] Bad authorization, not reconnecting");
                self.refresher.refresh(&self.auth_token);
                Directive::DisableReconnect
            }
            ServerMessage::Response { error } => {
                warn!(frame = "RESPONSE", "[PubSub WS] LISTEN failed: {}", error);
                Directive::Continue
            }
            ServerMessage::Reconnect => {
                info!("[PubSub WS] Server requested reconnect");
                Directive::RequestReconnect
            }
            ServerMessage::AuthRevoked => {
                error!(frame = "AUTH_REVOKED", "[PubSub WS] Authorization revoked, not reconnecting");
                Directive::DisableReconnect
            }
            ServerMessage::Unknown(frame_type) => {
                error!(frame = %frame_type, "[PubSub WS] Unrecognized frame type, not reconnecting");
                Directive::DisableReconnect
            }
        }
    }

    fn forward(&self, topic: &str, message: &str) {
        let event = match decode_event(&self.registry, topic, message) {
            Ok(Some(event)) => event,
            Ok(None) => {
                debug!(topic = %topic, "[PubSub WS] No handler for topic");
                return;
            }
            Err(e) => {
                warn!(topic = %topic, "[PubSub WS] Failed to decode event: {}", e);
                return;
            }
        };

        match event.to_payload() {
            Ok(payload) => {
                info!(topic = %topic, "[PubSub WS] {} received", event.kind());
                self.retrier.spawn_upload(event.kind().endpoint(), payload);
            }
            Err(e) => {
                warn!(topic = %topic, "[PubSub WS] Failed to encode {}: {}", event.kind(), e);
            }
        }
    }
}

impl FrameHandler for MessageDispatcher {
    fn handle(&mut self, frame: WsMessage) -> Directive {
        let text = match frame {
            WsMessage::Text(text) => text,
            WsMessage::Binary(bytes) => {
                info!("[PubSub WS] Binary message received: {} bytes", bytes.len());
                return Directive::Continue;
            }
        };

        debug!("[PubSub WS] Text message received: {}", text);

        match ServerMessage::parse(&text) {
            Ok(message) => self.dispatch(message),
            Err(e) => {
                warn!("[PubSub WS] Failed to decode frame: {}", e);
                Directive::Continue
            }
        }
    }
}
