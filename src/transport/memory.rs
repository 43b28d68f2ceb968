//! In-process transport.
//!
//! A [`MemoryTransport`] is one end of a pipe whose other end, the
//! [`MemoryPeer`], plays the server: it pushes frames, closes or fails the
//! socket, and reads what the client sent. Only compiled for this crate's
//! tests or with the `test-util` feature.
//!
//! # Example
//!
//! ```ignore
//! let connector = MemoryConnector::new();
//! let mut peer = connector.queue();
//!
//! manager.connect("ABC123".into()).await?;
//! let handshake = peer.next_sent().await;
//! peer.push("CONNECTED\nversion:1.2\n\n\0");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use url::Url;

use crate::error::{Error, Result};

use super::socket::{Connector, Transport};

// ============================================================================
// PeerSignal
// ============================================================================

/// What the peer can do to the client end.
enum PeerSignal {
    /// Deliver a text frame.
    Frame(String),
    /// Close cleanly.
    Close,
    /// Fail with an error.
    Fail(String),
}

// ============================================================================
// Pipe
// ============================================================================

/// Creates a connected transport/peer pair.
#[must_use]
pub fn pipe() -> (MemoryTransport, MemoryPeer) {
    let (to_client, from_peer) = mpsc::unbounded_channel();
    let (to_peer, from_client) = mpsc::unbounded_channel();
    let closed = Arc::new(AtomicBool::new(false));

    let transport = MemoryTransport {
        inbound: from_peer,
        outbound: to_peer,
        closed: Arc::clone(&closed),
    };
    let peer = MemoryPeer {
        to_client,
        from_client,
        closed,
    };
    (transport, peer)
}

// ============================================================================
// MemoryTransport
// ============================================================================

/// Client end of an in-process pipe.
pub struct MemoryTransport {
    /// Signals from the peer.
    inbound: mpsc::UnboundedReceiver<PeerSignal>,
    /// Frames to the peer.
    outbound: mpsc::UnboundedSender<String>,
    /// Set once the client closes its end.
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&mut self, text: String) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::ConnectionClosed);
        }
        self.outbound
            .send(text)
            .map_err(|_| Error::ConnectionClosed)
    }

    async fn recv(&mut self) -> Option<Result<String>> {
        match self.inbound.recv().await? {
            PeerSignal::Frame(text) => Some(Ok(text)),
            PeerSignal::Close => None,
            PeerSignal::Fail(message) => Some(Err(Error::connection(message))),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

// ============================================================================
// MemoryPeer
// ============================================================================

/// Server end of an in-process pipe.
pub struct MemoryPeer {
    /// Signals to the client.
    to_client: mpsc::UnboundedSender<PeerSignal>,
    /// Frames from the client.
    from_client: mpsc::UnboundedReceiver<String>,
    /// Set once the client closes its end.
    closed: Arc<AtomicBool>,
}

impl MemoryPeer {
    /// Delivers a raw text frame to the client.
    pub fn push(&self, text: impl Into<String>) {
        let _ = self.to_client.send(PeerSignal::Frame(text.into()));
    }

    /// Closes the socket from the server side.
    pub fn close(&self) {
        let _ = self.to_client.send(PeerSignal::Close);
    }

    /// Fails the socket with an error.
    pub fn fail(&self, message: impl Into<String>) {
        let _ = self.to_client.send(PeerSignal::Fail(message.into()));
    }

    /// Waits for the next frame the client sent.
    ///
    /// Returns `None` once the client end is gone and everything was read.
    pub async fn next_sent(&mut self) -> Option<String> {
        self.from_client.recv().await
    }

    /// Returns `true` once the client closed its end.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

// ============================================================================
// MemoryConnector
// ============================================================================

/// Connector handing out queued in-process transports, oldest first.
#[derive(Default)]
pub struct MemoryConnector {
    /// Transports waiting for a `connect` call.
    queue: Mutex<VecDeque<MemoryTransport>>,
    /// Number of `connect` calls so far.
    attempts: AtomicUsize,
}

impl MemoryConnector {
    /// Creates a connector with nothing queued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a fresh pipe and returns its server end.
    #[must_use]
    pub fn queue(&self) -> MemoryPeer {
        let (transport, peer) = pipe();
        self.queue.lock().push_back(transport);
        peer
    }

    /// Returns the number of `connect` calls so far.
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, url: &Url) -> Result<Box<dyn Transport>> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        let queued = self.queue.lock().pop_front();
        match queued {
            Some(transport) => Ok(Box::new(transport)),
            None => Err(Error::connection(format!("{url} refused: nothing queued"))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
