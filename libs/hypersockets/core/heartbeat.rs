//! Heartbeat mechanism for WebSocket connections
//!
//! # Architecture
//!
//! The heartbeat runs as a dedicated Tokio task for the lifetime of one open
//! session:
//!
//! ```text
//! ┌─────────────────────┐
//! │  Heartbeat Task     │
//! │  (Tokio spawn)      │
//! │                     │
//! │  On open, then      │
//! │  every interval:    │
//! │  send payload ──────┼──> mpsc channel ──> Connection loop ──> WebSocket
//! └─────────────────────┘
//! ```
//!
//! The first payload is emitted as soon as the session opens. The task is
//! stopped when the [`Heartbeat`] is cancelled or dropped, so a closed
//! session never leaves a timer behind.

use crate::traits::WsMessage;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

/// Heartbeat task body
///
/// Sends `payload` immediately and then once per `interval` until the
/// shutdown signal fires or the receiving side goes away.
pub async fn heartbeat_task(
    interval: Duration,
    payload: WsMessage,
    heartbeat_tx: mpsc::UnboundedSender<WsMessage>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    // If the loop stalls, skip missed beats rather than bursting
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    debug!("Heartbeat task started with interval: {:?}", interval);

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                debug!("Heartbeat task received shutdown signal");
                break;
            }
            _ = ticker.tick() => {
                debug!("Heartbeat tick - sending payload");
                if heartbeat_tx.send(payload.clone()).is_err() {
                    debug!("Heartbeat channel closed, shutting down heartbeat task");
                    break;
                }
            }
        }
    }

    debug!("Heartbeat task exiting");
}

/// Handle to a running heartbeat
///
/// Owned by the session; cancelling or dropping it stops the timer.
pub struct Heartbeat {
    handle: Option<JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    beats: mpsc::UnboundedReceiver<WsMessage>,
}

impl Heartbeat {
    /// Wait for the next payload to send
    ///
    /// Returns `None` once the heartbeat has stopped.
    pub async fn next_beat(&mut self) -> Option<WsMessage> {
        self.beats.recv().await
    }

    /// Stop the heartbeat task
    pub fn cancel(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.beats.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.is_none()
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Spawn a heartbeat task
pub fn spawn_heartbeat(interval: Duration, payload: WsMessage) -> Heartbeat {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let (heartbeat_tx, beats) = mpsc::unbounded_channel();

    let handle = tokio::spawn(heartbeat_task(interval, payload, heartbeat_tx, shutdown_rx));

    Heartbeat {
        handle: Some(handle),
        shutdown_tx: Some(shutdown_tx),
        beats,
    }
}
