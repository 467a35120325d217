//! Upload retrier
//!
//! Sends an event to the sink with jitter-only retries: every retry waits an
//! independently drawn delay from `[min_delay, max_delay]`, and after
//! `max_attempts` failures the event is dropped.

use super::sink::EventSink;
use rand::Rng;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Retry bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, initial one included
    pub max_attempts: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            min_delay,
            max_delay: max_delay.max(min_delay),
        }
    }

    /// A fresh uniformly drawn retry delay
    pub fn jitter(&self) -> Duration {
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5), Duration::from_secs(15))
    }
}

/// One upload in progress: the payload is fixed, only the attempt advances
#[derive(Debug, Clone, PartialEq)]
pub struct RetryState {
    pub attempt: u32,
    pub endpoint: String,
    pub payload: Value,
}

impl RetryState {
    pub fn new(endpoint: impl Into<String>, payload: Value) -> Self {
        Self {
            attempt: 0,
            endpoint: endpoint.into(),
            payload,
        }
    }

    /// Record one more attempt
    pub fn advance(self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self
        }
    }

    pub fn exhausted(&self, policy: &RetryPolicy) -> bool {
        self.attempt >= policy.max_attempts
    }
}

/// Terminal result of one upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Delivered { attempts: u32 },
    Dropped { attempts: u32 },
}

impl UploadOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, UploadOutcome::Delivered { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            UploadOutcome::Delivered { attempts } | UploadOutcome::Dropped { attempts } => {
                *attempts
            }
        }
    }
}

#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

/// Decrements the in-flight count when an upload task finishes, however it ends
struct InFlightGuard(Arc<InFlight>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Bounded-retry uploader, cheap to clone
#[derive(Clone)]
pub struct UploadRetrier {
    sink: Arc<dyn EventSink>,
    policy: RetryPolicy,
    in_flight: Arc<InFlight>,
}

impl UploadRetrier {
    pub fn new(sink: Arc<dyn EventSink>, policy: RetryPolicy) -> Self {
        Self {
            sink,
            policy,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Upload `payload` to `endpoint`, retrying on failure
    ///
    /// Never returns an error: after the last failed attempt the event is
    /// dropped and logged.
    pub async fn upload(&self, endpoint: &str, payload: Value) -> UploadOutcome {
        let mut state = RetryState::new(endpoint, payload);

        loop {
            state = state.advance();

            match self.sink.post(&state.endpoint, &state.payload).await {
                Ok(()) => {
                    info!(
                        endpoint = %state.endpoint,
                        attempt = state.attempt,
                        "[Upload] Event delivered"
                    );
                    return UploadOutcome::Delivered {
                        attempts: state.attempt,
                    };
                }
                Err(e) if state.exhausted(&self.policy) => {
                    error!(
                        endpoint = %state.endpoint,
                        attempt = state.attempt,
                        "[Upload] Giving up, event dropped: {}",
                        e
                    );
                    return UploadOutcome::Dropped {
                        attempts: state.attempt,
                    };
                }
                Err(e) => {
                    let delay = self.policy.jitter();
                    warn!(
                        endpoint = %state.endpoint,
                        attempt = state.attempt,
                        "[Upload] Failed: {}, retrying in {:?}",
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Run [`upload`](Self::upload) on its own task, tracked by [`wait_idle`](Self::wait_idle)
    pub fn spawn_upload(&self, endpoint: &str, payload: Value) -> JoinHandle<UploadOutcome> {
        self.in_flight.count.fetch_add(1, Ordering::AcqRel);
        let guard = InFlightGuard(Arc::clone(&self.in_flight));
        let retrier = self.clone();
        let endpoint = endpoint.to_string();

        tokio::spawn(async move {
            let _guard = guard;
            retrier.upload(&endpoint, payload).await
        })
    }

    /// Uploads spawned and not yet finished
    pub fn in_flight(&self) -> usize {
        self.in_flight.count.load(Ordering::Acquire)
    }

    /// Resolve once no spawned upload is pending
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.in_flight.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }
}
