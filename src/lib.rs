//! Trivia Live - Real-time session layer for a multiplayer trivia client.
//!
//! This library keeps a player's view of a trivia room in sync with the
//! game server over a single WebSocket carrying a STOMP-style text
//! protocol.
//!
//! # Architecture
//!
//! ```text
//! socket ──► ConnectionManager ──► EventRouter ──► GameController ──► ProgressionState
//!               (event loop)        (per-topic        (resolver,          (watch)
//!                                    channels)         countdown)
//! ```
//!
//! Key design principles:
//!
//! - One [`ConnectionManager`] per room membership; its event loop task
//!   exclusively owns the socket
//! - Every inbound `MESSAGE` is decoded once and broadcast to typed channels
//! - Undecodable bodies are dropped and counted, never surfaced as errors
//! - Progression advances only on server events; the countdown is display
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use trivia_live::{ClientConfig, ConnectionManager, GameApi, GameController, PlayerId, Result};
//!
//! async fn play(api: Arc<dyn GameApi>) -> Result<()> {
//!     let config = ClientConfig::new("wss://trivia.example.com/ws")?;
//!     let defaults = config.question_defaults;
//!     let manager = ConnectionManager::websocket(config);
//!
//!     let controller = GameController::new("ABC123".into(), PlayerId(42), api, defaults);
//!     let _feed = controller.attach(manager.router());
//!
//!     manager.connect("ABC123".into()).await?;
//!
//!     let mut state = controller.watch();
//!     state.wait_for(|s| s.question.is_some()).await.ok();
//!     controller.submit_answer(1).await?;
//!
//!     manager.disconnect();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Client configuration |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`game`] | Question resolution and progression |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Frame codec, topics and event payloads |
//! | [`router`] | Typed event fan-out |
//! | [`transport`] | Socket abstraction and connection manager |

// ============================================================================
// Modules
// ============================================================================

/// Client configuration.
pub mod config;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Game progression.
///
/// [`GameController`] applies server events and local actions to
/// [`ProgressionState`].
pub mod game;

/// Type-safe identifiers for rooms, players, questions and subscriptions.
pub mod identifiers;

/// Wire protocol: frames, topics and event payloads.
pub mod protocol;

/// Event router.
pub mod router;

/// Real-time transport layer.
///
/// Socket ownership, handshake, subscriptions and the receive loop.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Configuration
pub use config::ClientConfig;

// Error types
pub use error::{Error, Result};

// Game types
pub use game::{
    Answer, AnswerResult, GameApi, GameController, GameResults, ProgressionState, Question,
    QuestionDefaults, QuestionPhase,
};

// Identifier types
pub use identifiers::{PlayerId, QuestionId, RoomCode, SubscriptionId};

// Protocol types
pub use protocol::{Frame, FrameCommand, GameEvent, GameEventKind, ScoreUpdate};

// Router
pub use router::EventRouter;

// Transport types
pub use transport::{ConnectionManager, ConnectionState, Connector, Transport};
