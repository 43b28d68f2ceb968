//! Connection manager and receive loop.
//!
//! One [`ConnectionManager`] serves one room membership at a time. Each
//! successful [`connect`](ConnectionManager::connect) spawns a tokio task
//! that exclusively owns the socket and handles:
//!
//! - The handshake, sent as soon as the socket is open
//! - Subscribing to the room topics once the server acknowledges it
//! - Routing delivered messages through the [`EventRouter`]
//! - Outgoing frames queued by the manager (subscriptions, pings)
//! - Optional periodic keep-alive pings
//!
//! # State Machine
//!
//! ```text
//! Disconnected ──connect──► Connecting ──open──► Connected ──close──► Disconnected
//!                               │                    │
//!                               └──────failure───────┴──────────────► Error
//! ```
//!
//! Nothing here reconnects on its own; callers invoke `connect` again.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, interval_at};
use tracing::{debug, error, info, trace, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::identifiers::{RoomCode, SubscriptionId};
use crate::protocol::{Frame, FrameCommand, ping_destination, room_topics};
use crate::router::EventRouter;

use super::socket::{Connector, Transport, WsConnector};
use super::subscription::SubscriptionSet;

// ============================================================================
// ConnectionState
// ============================================================================

/// Observable connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No socket.
    #[default]
    Disconnected,
    /// Socket is being opened.
    Connecting,
    /// Socket is open.
    Connected,
    /// Socket failed to open or failed while open.
    Error,
}

/// Updates the state, notifying watchers only on change.
fn set_state(state_tx: &watch::Sender<ConnectionState>, state: ConnectionState) {
    state_tx.send_if_modified(|current| {
        let changed = *current != state;
        *current = state;
        changed
    });
}

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the receive loop.
enum ConnectionCommand {
    /// Send a frame.
    Send(Frame),
    /// Subscribe to a topic unless already subscribed.
    Subscribe(String),
    /// Close the socket and stop.
    Shutdown,
}

// ============================================================================
// DispatchGate
// ============================================================================

/// Decides whether frames from a socket may still reach the router.
///
/// Dispatch runs under the lock, so once [`retire`](Self::retire) returns
/// no frame from that socket is delivered anymore.
struct DispatchGate {
    /// `false` once the socket is retired.
    open: Mutex<bool>,
}

impl DispatchGate {
    fn new() -> Self {
        Self {
            open: Mutex::new(true),
        }
    }

    /// Runs `f` if the gate is still open.
    fn run<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let open = self.open.lock();
        if *open { Some(f()) } else { None }
    }

    /// Closes the gate and runs `on_close` before any dispatch could see it
    /// open again. Returns `false`, skipping `on_close`, if already closed.
    fn retire(&self, on_close: impl FnOnce()) -> bool {
        let mut open = self.open.lock();
        if !*open {
            return false;
        }
        *open = false;
        on_close();
        true
    }

    fn is_open(&self) -> bool {
        *self.open.lock()
    }
}

// ============================================================================
// ActiveSocket
// ============================================================================

/// Handles to the socket of the current room membership.
struct ActiveSocket {
    /// Room the socket serves.
    room: RoomCode,
    /// Commands to the receive loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Dispatch gate shared with the receive loop.
    gate: Arc<DispatchGate>,
    /// Subscriptions on this socket.
    subscriptions: Arc<Mutex<SubscriptionSet>>,
}

// ============================================================================
// ConnectionManager
// ============================================================================

/// Owns the socket lifecycle for one room membership at a time.
///
/// # Thread Safety
///
/// `ConnectionManager` is `Send + Sync`; share it behind an `Arc`.
/// All sends are queued to the receive loop, which is the only writer to
/// the socket.
pub struct ConnectionManager {
    /// Client configuration.
    config: ClientConfig,
    /// Opens sockets.
    connector: Arc<dyn Connector>,
    /// Event fan-out, shared across connections.
    router: Arc<EventRouter>,
    /// Observable state.
    state_tx: Arc<watch::Sender<ConnectionState>>,
    /// Current socket, if any.
    active: Mutex<Option<ActiveSocket>>,
    /// Bumped by every `disconnect`; detects a disconnect during `connect`.
    epoch: AtomicU64,
}

impl ConnectionManager {
    /// Creates a manager that opens sockets through `connector`.
    #[must_use]
    pub fn new(config: ClientConfig, connector: Arc<dyn Connector>) -> Self {
        let router = Arc::new(EventRouter::new(config.event_capacity));
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            config,
            connector,
            router,
            state_tx: Arc::new(state_tx),
            active: Mutex::new(None),
            epoch: AtomicU64::new(0),
        }
    }

    /// Creates a manager that opens WebSockets.
    #[must_use]
    pub fn websocket(config: ClientConfig) -> Self {
        Self::new(config, Arc::new(WsConnector))
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the event router fed by this manager.
    #[inline]
    #[must_use]
    pub fn router(&self) -> &Arc<EventRouter> {
        &self.router
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Returns a receiver that observes every state change.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Returns the room of the current socket, or `None` once it ended.
    #[must_use]
    pub fn room(&self) -> Option<RoomCode> {
        self.active
            .lock()
            .as_ref()
            .filter(|a| a.gate.is_open())
            .map(|a| a.room.clone())
    }

    /// Returns the subscriptions on the current socket, ordered by id.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<(SubscriptionId, String)> {
        self.active
            .lock()
            .as_ref()
            .map(|a| a.subscriptions.lock().snapshot())
            .unwrap_or_default()
    }

    /// Opens a socket for `room`.
    ///
    /// No-op if already connected to the same room. Any other existing
    /// socket is disconnected first. Returns once the socket is open; the
    /// handshake and subscriptions continue on the receive loop.
    ///
    /// # Errors
    ///
    /// - Whatever the connector returns if the socket cannot be opened
    ///   (state becomes [`ConnectionState::Error`])
    /// - [`Error::ConnectionClosed`] if `disconnect` ran while opening
    pub async fn connect(&self, room: RoomCode) -> Result<()> {
        if self.state() == ConnectionState::Connected && self.room().as_ref() == Some(&room) {
            debug!(%room, "Already connected");
            return Ok(());
        }

        self.disconnect();
        let epoch = self.epoch.load(Ordering::Acquire);
        set_state(&self.state_tx, ConnectionState::Connecting);
        debug!(%room, url = %self.config.ws_url, "Connecting");

        let mut transport = match self.connector.connect(&self.config.ws_url).await {
            Ok(transport) => transport,
            Err(e) => {
                warn!(%room, error = %e, "Failed to open socket");
                if self.epoch.load(Ordering::Acquire) == epoch {
                    set_state(&self.state_tx, ConnectionState::Error);
                }
                return Err(e);
            }
        };

        let gate = Arc::new(DispatchGate::new());
        let subscriptions = Arc::new(Mutex::new(SubscriptionSet::new()));
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let installed = {
            let mut active = self.active.lock();
            if self.epoch.load(Ordering::Acquire) == epoch {
                *active = Some(ActiveSocket {
                    room: room.clone(),
                    command_tx,
                    gate: Arc::clone(&gate),
                    subscriptions: Arc::clone(&subscriptions),
                });
                set_state(&self.state_tx, ConnectionState::Connected);
                true
            } else {
                false
            }
        };

        if !installed {
            debug!(%room, "Disconnected while opening socket");
            if let Err(e) = transport.close().await {
                debug!(%room, error = %e, "Close failed");
            }
            return Err(Error::ConnectionClosed);
        }

        let event_loop = EventLoop {
            room: room.clone(),
            transport,
            command_rx,
            gate,
            subscriptions,
            router: Arc::clone(&self.router),
            state_tx: Arc::clone(&self.state_tx),
            handshake: Frame::connect(
                &self.config.accept_version,
                &self.config.heart_beat_header(),
            ),
            ping_interval: self.config.ping_interval,
        };
        tokio::spawn(event_loop.run());

        info!(%room, "Connected");
        Ok(())
    }

    /// Drops the current socket and forgets the room.
    ///
    /// Idempotent. Once this returns, no frame from the old socket reaches
    /// the router and its latest game event is no longer replayed.
    pub fn disconnect(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);

        let active = self.active.lock().take();
        if let Some(active) = active {
            active.gate.retire(|| self.router.reset());
            active.subscriptions.lock().clear();
            if active.command_tx.send(ConnectionCommand::Shutdown).is_err() {
                debug!(room = %active.room, "Receive loop already stopped");
            }
            debug!(room = %active.room, "Disconnected");
        }

        set_state(&self.state_tx, ConnectionState::Disconnected);
    }

    /// Queues a frame for sending.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if there is no open socket
    /// - [`Error::ConnectionClosed`] if the receive loop has stopped
    pub fn send(&self, frame: Frame) -> Result<()> {
        self.command(ConnectionCommand::Send(frame))
    }

    /// Subscribes to a topic unless it is already subscribed.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub fn subscribe(&self, topic: impl Into<String>) -> Result<()> {
        self.command(ConnectionCommand::Subscribe(topic.into()))
    }

    /// Sends a keep-alive ping for the current room.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    pub fn send_ping(&self) -> Result<()> {
        let room = self.room().ok_or(Error::NotConnected)?;
        self.send(Frame::send(&ping_destination(&room)))
    }

    /// Hands a command to the receive loop of the open socket.
    fn command(&self, command: ConnectionCommand) -> Result<()> {
        let active = self.active.lock();
        let active = active
            .as_ref()
            .filter(|a| a.gate.is_open())
            .ok_or(Error::NotConnected)?;

        active
            .command_tx
            .send(command)
            .map_err(|_| Error::ConnectionClosed)
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.disconnect();
    }
}

// ============================================================================
// EventLoop
// ============================================================================

/// Receive loop state; owns the socket.
struct EventLoop {
    room: RoomCode,
    transport: Box<dyn Transport>,
    command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
    gate: Arc<DispatchGate>,
    subscriptions: Arc<Mutex<SubscriptionSet>>,
    router: Arc<EventRouter>,
    state_tx: Arc<watch::Sender<ConnectionState>>,
    handshake: Frame,
    ping_interval: Option<Duration>,
}

impl EventLoop {
    /// Runs until the socket ends or a shutdown is requested.
    async fn run(mut self) {
        if let Err(e) = self.transport.send(self.handshake.encode()).await {
            error!(room = %self.room, error = %e, "Failed to send handshake");
            self.terminate(ConnectionState::Error).await;
            return;
        }
        trace!(room = %self.room, "Handshake sent");

        let mut ping = self
            .ping_interval
            .map(|period| interval_at(Instant::now() + period, period));

        loop {
            tokio::select! {
                // Incoming frames from the server
                inbound = self.transport.recv() => {
                    match inbound {
                        Some(Ok(text)) => {
                            if let Err(e) = self.handle_inbound(&text).await {
                                error!(room = %self.room, error = %e, "Inbound frame failed");
                                self.terminate(ConnectionState::Error).await;
                                break;
                            }
                        }

                        Some(Err(e)) => {
                            error!(room = %self.room, error = %e, "Socket error");
                            self.terminate(ConnectionState::Error).await;
                            break;
                        }

                        None => {
                            debug!(room = %self.room, "Socket closed by remote");
                            self.terminate(ConnectionState::Disconnected).await;
                            break;
                        }
                    }
                }

                // Commands from the manager
                command = self.command_rx.recv() => {
                    let result = match command {
                        Some(ConnectionCommand::Send(frame)) => {
                            trace!(command = %frame.command, "Sending frame");
                            self.transport.send(frame.encode()).await
                        }

                        Some(ConnectionCommand::Subscribe(topic)) => self.subscribe(&topic).await,

                        Some(ConnectionCommand::Shutdown) | None => {
                            debug!(room = %self.room, "Shutdown requested");
                            self.close_transport().await;
                            break;
                        }
                    };

                    if let Err(e) = result {
                        error!(room = %self.room, error = %e, "Failed to send frame");
                        self.terminate(ConnectionState::Error).await;
                        break;
                    }
                }

                // Keep-alive
                () = next_tick(&mut ping) => {
                    let frame = Frame::send(&ping_destination(&self.room));
                    if let Err(e) = self.transport.send(frame.encode()).await {
                        error!(room = %self.room, error = %e, "Failed to send ping");
                        self.terminate(ConnectionState::Error).await;
                        break;
                    }
                    trace!(room = %self.room, "Ping sent");
                }
            }
        }

        debug!(room = %self.room, "Event loop terminated");
    }

    /// Handles one inbound text frame.
    async fn handle_inbound(&mut self, text: &str) -> Result<()> {
        let frame = Frame::decode(text);

        match frame.command {
            FrameCommand::Connected => {
                debug!(
                    room = %self.room,
                    version = frame.header("version").unwrap_or_default(),
                    "Handshake acknowledged"
                );
                for topic in room_topics(&self.room) {
                    self.subscribe(&topic).await?;
                }
            }

            FrameCommand::Message => {
                if self.gate.run(|| self.router.dispatch(&frame)).is_none() {
                    trace!("Socket retired, frame not dispatched");
                }
            }

            FrameCommand::Other(ref command) if command == "ERROR" => {
                let message = frame.header("message").unwrap_or(frame.body.as_str());
                return Err(Error::protocol(format!("server error: {message}")));
            }

            _ => {
                trace!(command = %frame.command, "Ignoring frame");
            }
        }

        Ok(())
    }

    /// Sends a `SUBSCRIBE` for `topic` if it is new on this socket.
    async fn subscribe(&mut self, topic: &str) -> Result<()> {
        if !self.gate.is_open() {
            return Ok(());
        }

        let frame = self.subscriptions.lock().subscribe(topic);
        match frame {
            Some(frame) => {
                debug!(room = %self.room, destination = topic, "Subscribing");
                self.transport.send(frame.encode()).await
            }
            None => {
                trace!(destination = topic, "Already subscribed");
                Ok(())
            }
        }
    }

    /// Retires the socket after it ended on its own and closes it.
    ///
    /// Leaves the state alone if the manager already retired the socket.
    async fn terminate(&mut self, state: ConnectionState) {
        let retired = self.gate.retire(|| {
            self.router.reset();
            self.subscriptions.lock().clear();
            set_state(&self.state_tx, state);
        });
        if retired {
            info!(room = %self.room, ?state, "Connection ended");
        }

        self.close_transport().await;
    }

    async fn close_transport(&mut self) {
        if let Err(e) = self.transport.close().await {
            debug!(room = %self.room, error = %e, "Close failed");
        }
    }
}

/// Waits for the next keep-alive tick, or forever if pings are off.
async fn next_tick(ping: &mut Option<Interval>) {
    match ping {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

// ============================================================================
// Tests
// ============================================================================
