//! Inbound and outbound PubSub frames

use crate::domain::EventKind;
use hypersockets::WsMessage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// `RESPONSE.error` values for a rejected auth token
pub const AUTH_ERROR_CODES: [&str; 2] = ["bad authorization", "ERR_BADAUTH"];

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid {kind}: {source}")]
    Event {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, DecodeError>;

/// Frames the bridge sends
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientFrame {
    Listen {
        topics: Vec<String>,
        auth_token: String,
    },
    Ping,
}

impl ClientFrame {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_message(&self) -> Result<WsMessage> {
        self.to_json().map(WsMessage::Text)
    }
}

/// Raw server envelope; only `type` is always present
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    frame_type: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Frames the server sends, classified by `type`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// A notification; `message` is itself JSON-encoded
    Message { topic: String, message: String },
    Pong,
    /// Reply to LISTEN; empty error means success
    Response { error: String },
    Reconnect,
    AuthRevoked,
    Unknown(String),
}

impl ServerMessage {
    pub fn parse(text: &str) -> Result<Self> {
        let envelope: Envelope = serde_json::from_str(text)?;

        let message = match envelope.frame_type.as_str() {
            "MESSAGE" => {
                let data = envelope.data.ok_or(DecodeError::MissingField("data"))?;
                let topic = data
                    .get("topic")
                    .and_then(Value::as_str)
                    .ok_or(DecodeError::MissingField("data.topic"))?;
                let message = data
                    .get("message")
                    .and_then(Value::as_str)
                    .ok_or(DecodeError::MissingField("data.message"))?;
                ServerMessage::Message {
                    topic: topic.to_string(),
                    message: message.to_string(),
                }
            }
            "PONG" => ServerMessage::Pong,
            "RESPONSE" => ServerMessage::Response {
                error: envelope.error.unwrap_or_default(),
            },
            "RECONNECT" => ServerMessage::Reconnect,
            "AUTH_REVOKED" => ServerMessage::AuthRevoked,
            other => ServerMessage::Unknown(other.to_string()),
        };

        Ok(message)
    }

    pub fn frame_type(&self) -> &str {
        match self {
            ServerMessage::Message { .. } => "MESSAGE",
            ServerMessage::Pong => "PONG",
            ServerMessage::Response { .. } => "RESPONSE",
            ServerMessage::Reconnect => "RECONNECT",
            ServerMessage::AuthRevoked => "AUTH_REVOKED",
            ServerMessage::Unknown(t) => t,
        }
    }
}
