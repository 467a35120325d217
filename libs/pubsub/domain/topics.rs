//! Topic registry
//!
//! The fixed set of PubSub topics the bridge listens to for one channel,
//! and which of them decode into an uploadable event.

use super::events::EventKind;
use std::collections::HashMap;

/// Topics whose notification body carries an extra `data` wrapper
pub const BITS_EVENTS_MARKER: &str = "channel-bits-events-v2";

/// The topic families the bridge subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKind {
    Bits,
    BitsBadge,
    ChannelPoints,
    ChannelSubscriptions,
}

impl TopicKind {
    /// All families, in LISTEN order
    pub const ALL: [TopicKind; 4] = [
        TopicKind::Bits,
        TopicKind::BitsBadge,
        TopicKind::ChannelPoints,
        TopicKind::ChannelSubscriptions,
    ];

    pub fn logical_name(&self) -> &'static str {
        match self {
            TopicKind::Bits => "Bits",
            TopicKind::BitsBadge => "Bits Badge",
            TopicKind::ChannelPoints => "Channel Points",
            TopicKind::ChannelSubscriptions => "Channel Subscriptions",
        }
    }

    /// Wire-topic prefix; the channel id is appended after a dot
    pub fn wire_prefix(&self) -> &'static str {
        match self {
            TopicKind::Bits => BITS_EVENTS_MARKER,
            TopicKind::BitsBadge => "channel-bits-badge-unlocks",
            TopicKind::ChannelPoints => "channel-points-channel-v1",
            TopicKind::ChannelSubscriptions => "channel-subscribe-events-v1",
        }
    }

    /// OAuth scope the auth token needs for this topic
    pub fn scope(&self) -> &'static str {
        match self {
            TopicKind::Bits | TopicKind::BitsBadge => "bits:read",
            TopicKind::ChannelPoints => "channel:read:redemptions",
            TopicKind::ChannelSubscriptions => "channel:read:subscriptions",
        }
    }

    /// Event model and upload target, if this topic is forwarded
    pub fn capability(&self) -> Option<EventKind> {
        match self {
            TopicKind::Bits => Some(EventKind::Bits),
            TopicKind::ChannelSubscriptions => Some(EventKind::Subscription),
            TopicKind::BitsBadge | TopicKind::ChannelPoints => None,
        }
    }
}

/// One subscribed topic, bound to a channel id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicDescriptor {
    pub kind: TopicKind,
    pub wire_topic: String,
    pub capability: Option<EventKind>,
}

impl TopicDescriptor {
    pub fn new(kind: TopicKind, channel_id: &str) -> Self {
        Self {
            kind,
            wire_topic: format!("{}.{}", kind.wire_prefix(), channel_id),
            capability: kind.capability(),
        }
    }

    pub fn logical_name(&self) -> &'static str {
        self.kind.logical_name()
    }

    pub fn scope(&self) -> &'static str {
        self.kind.scope()
    }
}

/// Build the four descriptors for `channel_id`, in LISTEN order
pub fn build_topics(channel_id: &str) -> Vec<TopicDescriptor> {
    TopicKind::ALL
        .iter()
        .map(|kind| TopicDescriptor::new(*kind, channel_id))
        .collect()
}

/// Descriptors for one channel plus a wire-topic lookup of the forwarded ones
#[derive(Debug, Clone)]
pub struct TopicRegistry {
    descriptors: Vec<TopicDescriptor>,
    handlers: HashMap<String, EventKind>,
}

impl TopicRegistry {
    pub fn new(channel_id: &str) -> Self {
        Self::from_descriptors(build_topics(channel_id))
    }

    pub fn from_descriptors(descriptors: Vec<TopicDescriptor>) -> Self {
        let handlers = descriptors
            .iter()
            .filter_map(|d| d.capability.map(|kind| (d.wire_topic.clone(), kind)))
            .collect();

        Self {
            descriptors,
            handlers,
        }
    }

    pub fn descriptors(&self) -> &[TopicDescriptor] {
        &self.descriptors
    }

    /// Wire topics for the LISTEN request
    pub fn wire_topics(&self) -> Vec<String> {
        self.descriptors
            .iter()
            .map(|d| d.wire_topic.clone())
            .collect()
    }

    /// Forwarded topics keyed by wire topic
    pub fn topics_with_handlers(&self) -> &HashMap<String, EventKind> {
        &self.handlers
    }

    pub fn lookup(&self, wire_topic: &str) -> Option<EventKind> {
        self.handlers.get(wire_topic).copied()
    }
}
