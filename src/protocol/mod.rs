//! Wire protocol types.
//!
//! # Protocol Overview
//!
//! | Command | Direction | Purpose |
//! |---------|-----------|---------|
//! | `CONNECT` | Client → Server | Handshake (`accept-version`, `heart-beat`) |
//! | `CONNECTED` | Server → Client | Handshake acknowledgment, starts subscriptions |
//! | `SUBSCRIBE` | Client → Server | Topic subscription (`id`, `destination`) |
//! | `MESSAGE` | Server → Client | Delivery on a topic (`destination`, JSON body) |
//! | `SEND` | Client → Server | Keep-alive ping |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `frame` | Frame codec |
//! | `topic` | Topic naming and classification |
//! | `event` | Typed message bodies |
//! | `number` | Lenient integer decoding |

// ============================================================================
// Submodules
// ============================================================================

/// Typed message bodies.
pub mod event;

/// Frame codec.
pub mod frame;

/// Lenient integer decoding for payload fields.
pub(crate) mod number;

/// Topic naming and classification.
pub mod topic;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::{GameEvent, GameEventKind, LeaderboardEntry, Player, PlayerEvent, ScoreUpdate};
pub use frame::{Frame, FrameCommand};
pub use topic::{TopicKind, ping_destination, room_topics};
