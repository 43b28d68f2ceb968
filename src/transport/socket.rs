//! Socket abstraction.
//!
//! The connection manager talks to a [`Transport`] it owns exclusively and
//! obtains one per connection from a [`Connector`]. [`WsConnector`] opens a
//! real WebSocket; `MemoryConnector` (`test-util` feature) hands out
//! in-process pipes.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};
use url::Url;

use crate::error::Result;

// ============================================================================
// Transport
// ============================================================================

/// A bidirectional text-frame socket.
#[async_trait]
pub trait Transport: Send {
    /// Sends one text frame.
    async fn send(&mut self, text: String) -> Result<()>;

    /// Receives the next text frame.
    ///
    /// `None` means the peer closed the socket; `Some(Err(_))` means the
    /// socket failed.
    async fn recv(&mut self) -> Option<Result<String>>;

    /// Closes the socket.
    async fn close(&mut self) -> Result<()>;
}

// ============================================================================
// Connector
// ============================================================================

/// Opens transports.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a socket to `url`. Returns once the socket is open.
    async fn connect(&self, url: &Url) -> Result<Box<dyn Transport>>;
}

// ============================================================================
// WebSocket
// ============================================================================

/// WebSocket transport over tokio-tungstenite.
pub struct WsTransport {
    /// Underlying stream.
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, text: String) -> Result<()> {
        self.stream.send(Message::Text(text.into())).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String>> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(text.as_str().to_owned())),

                Some(Ok(Message::Binary(bytes))) => {
                    return Some(Ok(String::from_utf8_lossy(&bytes).into_owned()));
                }

                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "WebSocket closed by remote");
                    return None;
                }

                // Ping/Pong are answered by tungstenite
                Some(Ok(_)) => {}

                Some(Err(e)) => return Some(Err(e.into())),

                None => {
                    debug!("WebSocket stream ended");
                    return None;
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self.stream.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Opens [`WsTransport`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &Url) -> Result<Box<dyn Transport>> {
        trace!(%url, "Opening WebSocket");
        let (stream, response) = connect_async(url.as_str()).await?;
        debug!(%url, status = %response.status(), "WebSocket open");
        Ok(Box::new(WsTransport { stream }))
    }
}
