//! Domain Layer
//!
//! Event models decoded from PubSub notifications and the per-channel
//! topic registry. No I/O lives here.

mod coerce;
pub mod events;
pub mod topics;

pub use events::{BitsEvent, EventKind, PubSubEvent, SubEvent};
pub use topics::{build_topics, TopicDescriptor, TopicKind, TopicRegistry, BITS_EVENTS_MARKER};
