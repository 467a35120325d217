use crate::config::ClientConfig;
use crate::connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState, ReconnectFlag};
use crate::heartbeat::{spawn_heartbeat, Heartbeat};
use crate::traits::*;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;
type WsWrite = SplitSink<WsStream, Message>;
type WsRead = SplitStream<WsStream>;

/// Internal command messages for client control
#[derive(Debug)]
enum ClientCommand {
    /// Send a message to the WebSocket
    Send(WsMessage),
    /// Clear the reconnect-allowed flag and end the session
    DisableReconnect,
    /// Set the reconnect-allowed flag and cycle the connection
    RequestReconnect,
    /// Stop for good (reconnect disabled, session closed)
    Shutdown,
}

/// Lifecycle events published by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Transport established, subscriptions about to be sent
    Connected,
    /// Session ended (or connection attempt failed)
    Disconnected,
    /// Reconnecting (attempt number, 1-indexed)
    Reconnecting(usize),
    /// Error occurred
    Error(String),
}

/// Client metrics snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metrics {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub reconnect_count: u64,
    pub connection_state: ConnectionState,
}

/// Why an open session ended
#[derive(Debug)]
enum SessionEnd {
    /// Transport closed or failed underneath us
    Closed(HyperSocketError),
    ReconnectRequested,
    ReconnectDisabled,
    Shutdown,
}

/// Cloneable control surface for a running [`WebSocketClient`]
///
/// Commands are queued to the connection loop and applied there, so the
/// reconnect-allowed flag is only ever written by the loop.
#[derive(Clone)]
pub struct ClientHandle {
    command_tx: mpsc::UnboundedSender<ClientCommand>,
    state: Arc<AtomicConnectionState>,
    metrics: Arc<AtomicMetrics>,
    reconnect_flag: Arc<ReconnectFlag>,
}

impl ClientHandle {
    fn command(&self, command: ClientCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|e| HyperSocketError::ChannelSend(e.to_string()))
    }

    /// Send a message through the WebSocket
    pub fn send(&self, message: WsMessage) -> Result<()> {
        self.command(ClientCommand::Send(message))
    }

    /// Clear the reconnect-allowed flag; the session ends and is not retried
    pub fn disable_reconnect(&self) -> Result<()> {
        self.command(ClientCommand::DisableReconnect)
    }

    /// Set the reconnect-allowed flag and force a reconnect cycle
    pub fn request_reconnect(&self) -> Result<()> {
        self.command(ClientCommand::RequestReconnect)
    }

    /// Graceful shutdown: close the session and stop reconnecting
    pub fn shutdown(&self) -> Result<()> {
        self.command(ClientCommand::Shutdown)
    }

    /// Get current connection state
    #[inline]
    pub fn connection_state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Check if the session is open
    #[inline]
    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    #[inline]
    pub fn reconnect_allowed(&self) -> bool {
        self.reconnect_flag.is_allowed()
    }

    /// Get current metrics
    pub fn metrics(&self) -> Metrics {
        Metrics {
            messages_sent: self.metrics.messages_sent(),
            messages_received: self.metrics.messages_received(),
            reconnect_count: self.metrics.reconnect_count(),
            connection_state: self.state.get(),
        }
    }
}

/// WebSocket connection manager
///
/// Owns the socket lifecycle on a single task:
/// - connects, sends the subscription sequence and starts the heartbeat
/// - hands every inbound frame to the [`FrameHandler`], in order
/// - applies the handler's [`Directive`] and handle commands
/// - reconnects with the configured strategy while reconnection is allowed
///
/// # Type Parameters
/// - `H`: FrameHandler implementation
pub struct WebSocketClient<H>
where
    H: FrameHandler,
{
    config: ClientConfig,
    handler: H,
    state: Arc<AtomicConnectionState>,
    metrics: Arc<AtomicMetrics>,
    command_tx: mpsc::UnboundedSender<ClientCommand>,
    command_rx: mpsc::UnboundedReceiver<ClientCommand>,
    event_tx: Option<mpsc::UnboundedSender<ClientEvent>>,
}

impl<H> WebSocketClient<H>
where
    H: FrameHandler,
{
    /// Create a new WebSocket client from configuration
    ///
    /// This is called by the builder's `build()` method.
    /// Use `hypersockets::builder()` to create a client.
    pub(crate) fn new(config: ClientConfig, handler: H) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        Self {
            config,
            handler,
            state: Arc::new(AtomicConnectionState::new(ConnectionState::Disconnected)),
            metrics: Arc::new(AtomicMetrics::new()),
            command_tx,
            command_rx,
            event_tx: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get a control handle usable from other tasks
    pub fn handle(&self) -> ClientHandle {
        ClientHandle {
            command_tx: self.command_tx.clone(),
            state: Arc::clone(&self.state),
            metrics: Arc::clone(&self.metrics),
            reconnect_flag: Arc::clone(&self.config.reconnect_flag),
        }
    }

    /// Subscribe to lifecycle events
    ///
    /// Only one receiver is active; calling this again replaces it.
    pub fn events(&mut self) -> mpsc::UnboundedReceiver<ClientEvent> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        self.event_tx = Some(event_tx);
        event_rx
    }

    fn emit(&self, event: ClientEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }

    /// Drive the connection until it reaches the terminal state
    ///
    /// Returns `Ok(())` once the session ends while reconnection is disabled
    /// (fatal directive, `disable_reconnect` or `shutdown`), and
    /// `Err(ReconnectionFailed)` if a bounded strategy runs out of attempts.
    pub async fn run(mut self) -> Result<()> {
        let mut reconnect_attempt = 0;
        let mut last_error = String::from("no connection attempt made");

        loop {
            self.state.set(ConnectionState::Connecting);

            match self.connect().await {
                Ok(stream) => {
                    info!("Connected to {}", self.config.url);
                    self.state.set(ConnectionState::Open);
                    self.emit(ClientEvent::Connected);
                    reconnect_attempt = 0;

                    match self.run_session(stream).await {
                        SessionEnd::Closed(e) => {
                            warn!("Connection lost: {}", e);
                            last_error = e.to_string();
                            self.emit(ClientEvent::Error(last_error.clone()));
                        }
                        SessionEnd::ReconnectRequested => {
                            info!("Reconnect requested, cycling connection");
                            last_error = "reconnect requested".to_string();
                        }
                        SessionEnd::ReconnectDisabled => {
                            warn!("Reconnection disabled, closing session");
                        }
                        SessionEnd::Shutdown => {
                            info!("Received shutdown command");
                        }
                    }

                    self.emit(ClientEvent::Disconnected);
                }
                Err(e) => {
                    error!("Failed to connect: {}", e);
                    last_error = e.to_string();
                    self.emit(ClientEvent::Error(last_error.clone()));
                }
            }

            if !self.config.reconnect_flag.is_allowed() {
                debug!("Reconnect-allowed flag is false, stopping");
                break;
            }

            self.state.set(ConnectionState::Reconnecting);

            let Some(delay) = self.config.reconnect_strategy.next_delay(reconnect_attempt) else {
                warn!("Reconnection strategy exhausted, stopping");
                self.state.set(ConnectionState::Disconnected);
                return Err(HyperSocketError::ReconnectionFailed {
                    attempts: reconnect_attempt,
                    reason: last_error,
                });
            };

            info!(
                "Reconnecting in {:?} (attempt {})",
                delay,
                reconnect_attempt + 1
            );

            if !self.wait_before_reconnect(delay).await {
                debug!("Reconnect timer cancelled");
                break;
            }

            reconnect_attempt += 1;
            self.metrics.increment_reconnects();
            self.emit(ClientEvent::Reconnecting(reconnect_attempt));
        }

        self.state.set(ConnectionState::Disconnected);
        info!("Client task exiting");
        Ok(())
    }

    async fn connect(&self) -> Result<WsStream> {
        debug!("Connecting to {}", self.config.url);

        let attempt = connect_async(self.config.url.as_str());
        match tokio::time::timeout(self.config.connect_timeout, attempt).await {
            Ok(Ok((stream, _response))) => Ok(stream),
            Ok(Err(e)) => Err(HyperSocketError::WebSocket(e.to_string())),
            Err(_) => Err(HyperSocketError::Timeout(format!(
                "connect to {} did not complete within {:?}",
                self.config.url, self.config.connect_timeout
            ))),
        }
    }

    /// Sleep out the reconnect delay
    ///
    /// Returns `false` if reconnection was disabled while waiting.
    async fn wait_before_reconnect(&mut self, delay: Duration) -> bool {
        let timer = tokio::time::sleep(delay);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                _ = &mut timer => return true,
                cmd = self.command_rx.recv() => match cmd {
                    Some(ClientCommand::DisableReconnect) | Some(ClientCommand::Shutdown) | None => {
                        self.config.reconnect_flag.set(false);
                        return false;
                    }
                    Some(ClientCommand::RequestReconnect) => {
                        self.config.reconnect_flag.set(true);
                        debug!("Reconnect already pending");
                    }
                    Some(ClientCommand::Send(_)) => {
                        warn!("Dropping outbound frame: not connected");
                    }
                },
            }
        }
    }

    /// Run one open session until it ends
    async fn run_session(&mut self, stream: WsStream) -> SessionEnd {
        let (mut write, mut read) = stream.split();

        if let Err(e) = self.subscribe(&mut write).await {
            return SessionEnd::Closed(e);
        }

        let mut heartbeat = self
            .config
            .heartbeat
            .as_ref()
            .map(|(interval, payload)| spawn_heartbeat(*interval, payload.clone()));

        let end = self.session_loop(&mut write, &mut read, &mut heartbeat).await;

        // No beats may go out on a closing transport
        if let Some(heartbeat) = heartbeat.as_mut() {
            heartbeat.cancel();
        }

        if !matches!(end, SessionEnd::Closed(_)) {
            self.state.set(ConnectionState::Closing);
            if let Err(e) = write.close().await {
                debug!("Close handshake failed: {}", e);
            }
        }

        end
    }

    async fn subscribe(&self, write: &mut WsWrite) -> Result<()> {
        let Some(provider) = &self.config.subscriptions else {
            return Ok(());
        };

        let messages = provider.subscription_messages().await?;
        for message in &messages {
            send_frame(write, &self.metrics, message).await?;
        }
        debug!("Sent {} subscription message(s)", messages.len());
        Ok(())
    }

    async fn session_loop(
        &mut self,
        write: &mut WsWrite,
        read: &mut WsRead,
        heartbeat: &mut Option<Heartbeat>,
    ) -> SessionEnd {
        loop {
            tokio::select! {
                frame = read.next() => match frame {
                    Some(Ok(msg)) => {
                        self.metrics.increment_received();

                        let Some(frame) = tungstenite_to_ws_message(msg) else {
                            continue;
                        };

                        match self.handler.handle(frame) {
                            Directive::Continue => {}
                            Directive::DisableReconnect => {
                                self.config.reconnect_flag.set(false);
                                return SessionEnd::ReconnectDisabled;
                            }
                            Directive::RequestReconnect => {
                                self.config.reconnect_flag.set(true);
                                return SessionEnd::ReconnectRequested;
                            }
                        }
                    }
                    Some(Err(e)) => {
                        return SessionEnd::Closed(HyperSocketError::WebSocket(e.to_string()));
                    }
                    None => {
                        return SessionEnd::Closed(HyperSocketError::ConnectionClosed(
                            "stream ended".into(),
                        ));
                    }
                },

                Some(beat) = next_beat(heartbeat) => {
                    if let Err(e) = send_frame(write, &self.metrics, &beat).await {
                        return SessionEnd::Closed(e);
                    }
                    debug!("Heartbeat sent");
                }

                cmd = self.command_rx.recv() => match cmd {
                    Some(ClientCommand::Send(msg)) => {
                        if let Err(e) = send_frame(write, &self.metrics, &msg).await {
                            return SessionEnd::Closed(e);
                        }
                    }
                    Some(ClientCommand::DisableReconnect) => {
                        self.config.reconnect_flag.set(false);
                        return SessionEnd::ReconnectDisabled;
                    }
                    Some(ClientCommand::RequestReconnect) => {
                        self.config.reconnect_flag.set(true);
                        return SessionEnd::ReconnectRequested;
                    }
                    Some(ClientCommand::Shutdown) | None => {
                        self.config.reconnect_flag.set(false);
                        return SessionEnd::Shutdown;
                    }
                },
            }
        }
    }
}

async fn next_beat(heartbeat: &mut Option<Heartbeat>) -> Option<WsMessage> {
    match heartbeat {
        Some(heartbeat) => heartbeat.next_beat().await,
        None => std::future::pending().await,
    }
}

async fn send_frame(write: &mut WsWrite, metrics: &AtomicMetrics, frame: &WsMessage) -> Result<()> {
    write
        .send(ws_message_to_tungstenite(frame))
        .await
        .map_err(|e| HyperSocketError::WebSocket(format!("Failed to send frame: {}", e)))?;
    metrics.increment_sent();
    Ok(())
}

/// Convert WsMessage to tungstenite Message
fn ws_message_to_tungstenite(msg: &WsMessage) -> Message {
    match msg {
        WsMessage::Text(text) => Message::Text(text.clone()),
        WsMessage::Binary(data) => Message::Binary(data.clone()),
    }
}

/// Convert tungstenite Message to WsMessage
fn tungstenite_to_ws_message(msg: Message) -> Option<WsMessage> {
    match msg {
        Message::Text(text) => Some(WsMessage::Text(text)),
        Message::Binary(data) => Some(WsMessage::Binary(data)),
        Message::Ping(_) | Message::Pong(_) | Message::Close(_) | Message::Frame(_) => None,
    }
}
