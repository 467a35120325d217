//! Graceful shutdown management

use hypersockets::ClientHandle;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

/// Turns Ctrl+C into a shutdown command for the PubSub connection
pub struct ShutdownManager {
    flag: Arc<AtomicBool>,
    handle: ClientHandle,
}

impl ShutdownManager {
    /// Create a new shutdown manager with running state
    pub fn new(handle: ClientHandle) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(true)),
            handle,
        }
    }

    /// Spawn a Ctrl+C signal handler that triggers shutdown
    pub fn spawn_signal_handler(&self) {
        let flag = Arc::clone(&self.flag);
        let handle = self.handle.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                info!("");
                info!("Received shutdown signal (Ctrl+C)");
                info!("Shutting down gracefully...");
                Self::shut_down(&flag, &handle);
            }
        });
    }

    /// Shut down without waiting for a signal
    pub fn trigger(&self) {
        Self::shut_down(&self.flag, &self.handle);
    }

    fn shut_down(flag: &AtomicBool, handle: &ClientHandle) {
        flag.store(false, Ordering::Release);
        if let Err(e) = handle.shutdown() {
            // Loop already gone; nothing left to stop
            warn!("Shutdown command not delivered: {}", e);
        }
    }

    /// Check if the process should continue running
    pub fn is_running(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
