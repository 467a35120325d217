//! Common test utilities for HyperSockets integration tests
//!
//! This module provides a scriptable mock WebSocket server.

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Notify};
use tokio_tungstenite::tungstenite::Message;

/// Something the test wants the server to do on every live connection
#[derive(Debug, Clone)]
pub enum ServerAction {
    Send(String),
    Close,
}

#[derive(Default)]
struct ServerState {
    connections: AtomicUsize,
    received: Mutex<Vec<String>>,
}

/// A mock WebSocket server that records text frames and can push frames
pub struct MockWsServer {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
    state: Arc<ServerState>,
    actions: broadcast::Sender<ServerAction>,
}

impl MockWsServer {
    /// Create and start a new mock WebSocket server
    pub async fn start() -> Self {
        Self::start_with_greeting(Vec::new()).await
    }

    /// Start a server that sends `greeting` right after every handshake
    pub async fn start_with_greeting(greeting: Vec<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let state = Arc::new(ServerState::default());
        let (actions, _) = broadcast::channel(64);

        let shutdown_clone = shutdown.clone();
        let state_clone = state.clone();
        let actions_clone = actions.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                state_clone.connections.fetch_add(1, Ordering::SeqCst);
                                let shutdown = shutdown_clone.clone();
                                let state = state_clone.clone();
                                let actions = actions_clone.subscribe();
                                let greeting = greeting.clone();
                                tokio::spawn(async move {
                                    Self::handle_connection(stream, shutdown, state, actions, greeting).await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_clone.notified() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown,
            state,
            actions,
        }
    }

    async fn handle_connection(
        stream: tokio::net::TcpStream,
        shutdown: Arc<Notify>,
        state: Arc<ServerState>,
        mut actions: broadcast::Receiver<ServerAction>,
        greeting: Vec<String>,
    ) {
        let ws_stream = match tokio_tungstenite::accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let (mut write, mut read) = ws_stream.split();

        for frame in greeting {
            if write.send(Message::Text(frame)).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            state.received.lock().push(text);
                        }
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    }
                }
                action = actions.recv() => {
                    match action {
                        Ok(ServerAction::Send(text)) => {
                            if write.send(Message::Text(text)).await.is_err() {
                                break;
                            }
                        }
                        Ok(ServerAction::Close) => {
                            let _ = write.send(Message::Close(None)).await;
                            break;
                        }
                        Err(_) => {}
                    }
                }
                _ = shutdown.notified() => {
                    break;
                }
            }
        }
    }

    /// Get the WebSocket URL for this server
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Number of accepted TCP connections so far
    pub fn connection_count(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    /// Text frames received from clients, in arrival order
    pub fn received(&self) -> Vec<String> {
        self.state.received.lock().clone()
    }

    /// Push a text frame to every live connection
    pub fn send_text(&self, text: impl Into<String>) {
        let _ = self.actions.send(ServerAction::Send(text.into()));
    }

    /// Close every live connection
    pub fn close_connections(&self) {
        let _ = self.actions.send(ServerAction::Close);
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockWsServer {
    fn drop(&mut self) {
        self.shutdown();
    }
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

/// An address nothing listens on
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
