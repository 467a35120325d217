//! Frame handling
//!
//! Every data frame read from the socket is handed to a single
//! [`FrameHandler`] on the connection loop, in the order it was received.
//! The handler answers with a [`Directive`] telling the connection manager
//! whether the session should continue.
//!
//! ```text
//! WebSocket → read loop → FrameHandler::handle → Directive
//!                                                  ├─ Continue
//!                                                  ├─ DisableReconnect → Closing → Disconnected (terminal)
//!                                                  └─ RequestReconnect → Closing → Reconnecting
//! ```

use crate::WsMessage;

/// What the connection manager should do after a frame was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    /// Keep the session open
    Continue,
    /// Clear the reconnect-allowed flag and end the session for good
    DisableReconnect,
    /// Set the reconnect-allowed flag and cycle the connection
    RequestReconnect,
}

/// Sequential handler for inbound frames
///
/// `handle` runs on the connection loop itself, so it must not block. Long
/// running work (HTTP calls, timers) belongs in spawned tasks.
///
/// # Example
///
/// ```ignore
/// struct EchoHandler;
///
/// impl FrameHandler for EchoHandler {
///     fn handle(&mut self, frame: WsMessage) -> Directive {
///         match frame.as_text() {
///             Some("bye") => Directive::DisableReconnect,
///             _ => Directive::Continue,
///         }
///     }
/// }
/// ```
pub trait FrameHandler: Send + 'static {
    fn handle(&mut self, frame: WsMessage) -> Directive;
}

impl<F> FrameHandler for F
where
    F: FnMut(WsMessage) -> Directive + Send + 'static,
{
    fn handle(&mut self, frame: WsMessage) -> Directive {
        self(frame)
    }
}
