//! Event models
//!
//! Typed records for the notifications the bridge forwards. Required fields
//! missing from a notification make decoding fail; it never panics.

use super::coerce;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bits cheered in the channel (`channel-bits-events-v2`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitsEvent {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_int")]
    pub user_id: Option<i64>,
    pub channel_name: String,
    #[serde(deserialize_with = "coerce::int")]
    pub bits_used: i64,
    #[serde(default, deserialize_with = "coerce::opt_int")]
    pub total_bits_used: Option<i64>,
}

/// A channel subscription, resub or gift (`channel-subscribe-events-v1`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubEvent {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_int")]
    pub user_id: Option<i64>,
    pub channel_name: String,
    #[serde(deserialize_with = "coerce::boolean")]
    pub is_gift: bool,
    #[serde(default, deserialize_with = "coerce::opt_int")]
    pub cumulative_months: Option<i64>,
    #[serde(default, deserialize_with = "coerce::opt_int")]
    pub streak_months: Option<i64>,
    #[serde(deserialize_with = "coerce::int")]
    pub multi_month_duration: i64,
    pub sub_plan: String,
}

/// Which event model a topic decodes into, and where it is uploaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Bits,
    Subscription,
}

impl EventKind {
    /// Sink path for this kind, relative to the sink root URL
    pub fn endpoint(&self) -> &'static str {
        match self {
            EventKind::Bits => "/rest/v1/Bits",
            EventKind::Subscription => "/rest/v1/Subs",
        }
    }

    /// Decode a notification body into this kind's model
    pub fn decode(&self, value: serde_json::Value) -> Result<PubSubEvent, serde_json::Error> {
        match self {
            EventKind::Bits => serde_json::from_value(value).map(PubSubEvent::Bits),
            EventKind::Subscription => {
                serde_json::from_value(value).map(PubSubEvent::Subscription)
            }
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Bits => write!(f, "BitsEvent"),
            EventKind::Subscription => write!(f, "SubEvent"),
        }
    }
}

/// A decoded event, ready to upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PubSubEvent {
    Bits(BitsEvent),
    Subscription(SubEvent),
}

impl PubSubEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PubSubEvent::Bits(_) => EventKind::Bits,
            PubSubEvent::Subscription(_) => EventKind::Subscription,
        }
    }

    /// JSON body sent to the sink
    pub fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
