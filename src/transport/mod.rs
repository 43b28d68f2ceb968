//! Real-time transport layer.
//!
//! This module owns the socket to the game server and everything needed
//! to keep one room membership alive on it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐                         ┌─────────────────┐
//! │  ConnectionManager   │        WebSocket        │  Game server    │
//! │                      │◄───────────────────────►│  (message       │
//! │  → EventLoop (task)  │   text frames, NUL-     │   broker)       │
//! │  → SubscriptionSet   │   terminated            │                 │
//! └──────────┬───────────┘                         └─────────────────┘
//!            │ MESSAGE frames
//!            ▼
//!      EventRouter
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `ConnectionManager::connect` - Open the socket for a room
//! 2. Event loop sends the handshake
//! 3. `CONNECTED` received - Subscribe to the room topics
//! 4. `MESSAGE` frames - Routed to typed event streams
//! 5. `ConnectionManager::disconnect` - Close and forget the room
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Connection manager and receive loop |
//! | `memory` | In-process transport for tests (`test-util` feature) |
//! | `socket` | Transport traits and WebSocket implementation |
//! | `subscription` | Topic to subscription id bookkeeping |

// ============================================================================
// Submodules
// ============================================================================

/// Connection manager and receive loop.
pub mod connection;

/// In-process transport.
#[cfg(any(test, feature = "test-util"))]
pub mod memory;

/// Transport traits and WebSocket implementation.
pub mod socket;

/// Subscription multiplexer.
pub mod subscription;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{ConnectionManager, ConnectionState};
#[cfg(any(test, feature = "test-util"))]
pub use memory::{MemoryConnector, MemoryPeer, MemoryTransport, pipe};
pub use socket::{Connector, Transport, WsConnector, WsTransport};
pub use subscription::SubscriptionSet;
