//! Common test utilities for bridge integration tests
//!
//! A fake PubSub edge that answers PING and LISTEN like Twitch does, plus
//! recording doubles for the event sink and the token refresher.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Notify};
use tokio_tungstenite::tungstenite::Message;
use twitch_pubsub::infrastructure::sink::Result as SinkResult;
use twitch_pubsub::{BridgeConfig, EventSink, SinkError, TokenRefresher};

pub const CHANNEL_ID: &str = "44322889";
pub const AUTH_TOKEN: &str = "cfabdegwdoklmawdzdo98xt2fo512y";

struct EdgeState {
    connections: AtomicUsize,
    received: Mutex<Vec<Value>>,
    /// `error` returned for LISTEN on each connection, by connection index
    listen_errors: Mutex<Vec<String>>,
}

/// Fake `pubsub-edge.twitch.tv`
pub struct FakePubSubEdge {
    url: String,
    shutdown: Arc<Notify>,
    state: Arc<EdgeState>,
    push: broadcast::Sender<String>,
}

impl FakePubSubEdge {
    /// Every LISTEN is acknowledged with an empty error
    pub async fn start() -> Self {
        Self::start_with_listen_errors(Vec::new()).await
    }

    /// LISTEN on the n-th connection gets `listen_errors[n]` (empty once exhausted)
    pub async fn start_with_listen_errors(listen_errors: Vec<&str>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let state = Arc::new(EdgeState {
            connections: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
            listen_errors: Mutex::new(listen_errors.into_iter().map(String::from).collect()),
        });
        let (push, _) = broadcast::channel(64);

        let shutdown_clone = shutdown.clone();
        let state_clone = state.clone();
        let push_clone = push.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        let Ok((stream, _)) = result else { break };
                        let index = state_clone.connections.fetch_add(1, Ordering::SeqCst);
                        let shutdown = shutdown_clone.clone();
                        let state = state_clone.clone();
                        let push = push_clone.subscribe();
                        tokio::spawn(async move {
                            Self::handle_connection(stream, index, shutdown, state, push).await;
                        });
                    }
                    _ = shutdown_clone.notified() => break,
                }
            }
        });

        Self {
            url: format!("ws://{}", addr),
            shutdown,
            state,
            push,
        }
    }

    async fn handle_connection(
        stream: tokio::net::TcpStream,
        index: usize,
        shutdown: Arc<Notify>,
        state: Arc<EdgeState>,
        mut push: broadcast::Receiver<String>,
    ) {
        let Ok(ws_stream) = tokio_tungstenite::accept_async(stream).await else {
            return;
        };
        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                msg = read.next() => {
                    let text = match msg {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => continue,
                    };
                    let Ok(frame) = serde_json::from_str::<Value>(&text) else { continue };
                    state.received.lock().push(frame.clone());

                    let reply = match frame["type"].as_str() {
                        Some("PING") => json!({"type": "PONG"}),
                        Some("LISTEN") => {
                            let error = state
                                .listen_errors
                                .lock()
                                .get(index)
                                .cloned()
                                .unwrap_or_default();
                            json!({"type": "RESPONSE", "nonce": "", "error": error})
                        }
                        _ => continue,
                    };
                    if write.send(Message::Text(reply.to_string())).await.is_err() {
                        break;
                    }
                }
                frame = push.recv() => {
                    let Ok(frame) = frame else { continue };
                    if write.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                _ = shutdown.notified() => break,
            }
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn connection_count(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    /// Frames received from the bridge, decoded
    pub fn received(&self) -> Vec<Value> {
        self.state.received.lock().clone()
    }

    /// Received frames of one `type`
    pub fn received_of_type(&self, frame_type: &str) -> Vec<Value> {
        self.received()
            .into_iter()
            .filter(|f| f["type"] == frame_type)
            .collect()
    }

    /// Push a frame to every live connection
    pub fn push(&self, frame: Value) {
        let _ = self.push.send(frame.to_string());
    }

    /// Push a raw (possibly malformed) text frame
    pub fn push_raw(&self, text: &str) {
        let _ = self.push.send(text.to_string());
    }

    /// Push a MESSAGE notification for `topic`
    pub fn notify(&self, topic: &str, message: &Value) {
        self.push(json!({
            "type": "MESSAGE",
            "data": {"topic": topic, "message": message.to_string()}
        }));
    }
}

impl Drop for FakePubSubEdge {
    fn drop(&mut self) {
        self.shutdown.notify_waiters();
    }
}

/// Event sink that records posts and fails the first `failures` of them
#[derive(Default)]
pub struct RecordingSink {
    failures: usize,
    posts: Mutex<Vec<(String, Value)>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_first(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            failures,
            posts: Mutex::new(Vec::new()),
        })
    }

    pub fn posts(&self) -> Vec<(String, Value)> {
        self.posts.lock().clone()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn post(&self, endpoint: &str, payload: &Value) -> SinkResult<()> {
        let mut posts = self.posts.lock();
        posts.push((endpoint.to_string(), payload.clone()));
        if posts.len() <= self.failures {
            return Err(SinkError::Rejected {
                status: 500,
                body: "try again".to_string(),
            });
        }
        Ok(())
    }
}

/// Token refresher that records every request
#[derive(Default)]
pub struct RecordingRefresher {
    tokens: Mutex<Vec<String>>,
}

impl RecordingRefresher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.tokens.lock().clone()
    }
}

impl TokenRefresher for RecordingRefresher {
    fn refresh(&self, auth_token: &str) {
        self.tokens.lock().push(auth_token.to_string());
    }
}

/// Config pointing at `edge` with fast timers
pub fn test_config(edge: &FakePubSubEdge) -> BridgeConfig {
    let mut config = BridgeConfig {
        pubsub_url: edge.url().to_string(),
        channel_id: CHANNEL_ID.to_string(),
        auth_token: AUTH_TOKEN.to_string(),
        root_url: "http://127.0.0.1:1".to_string(),
        api_key: "test-key".to_string(),
        ..BridgeConfig::default()
    };
    config.reconnect.initial_delay_ms = 50;
    config.reconnect.max_delay_secs = 1;
    config.reconnect.connect_timeout_secs = 5;
    config.retry.min_delay_secs = 0;
    config.retry.max_delay_secs = 0;
    config
}

/// Poll `condition` until it holds or `timeout` elapses
pub async fn wait_until<F>(condition: F, timeout: Duration) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
