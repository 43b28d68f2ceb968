//! Topic naming and classification.
//!
//! | Topic | Destination |
//! |-------|-------------|
//! | Game progression | `/topic/room/{roomCode}/game` |
//! | Player roster | `/topic/room/{roomCode}/players` |
//! | Live leaderboard | `/topic/room/{roomCode}/leaderboard` |
//! | Private results | `/user/queue/score` |
//!
//! Keep-alive pings are published to `/app/room/{roomCode}/ping`.

// ============================================================================
// Imports
// ============================================================================

use crate::identifiers::RoomCode;

// ============================================================================
// TopicKind
// ============================================================================

/// Logical topic a delivered message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKind {
    /// Game progression events.
    Game,
    /// Player roster changes.
    Players,
    /// Leaderboard snapshots.
    Leaderboard,
    /// Player-scoped scoring results.
    Score,
}

impl TopicKind {
    /// Classification order; the first substring match wins.
    const MATCH_ORDER: [(Self, &'static str); 4] = [
        (Self::Game, "/game"),
        (Self::Players, "/players"),
        (Self::Leaderboard, "/leaderboard"),
        (Self::Score, "/score"),
    ];

    /// Classifies a `destination` header value.
    #[must_use]
    pub fn classify(destination: &str) -> Option<Self> {
        Self::MATCH_ORDER
            .iter()
            .find(|(_, needle)| destination.contains(needle))
            .map(|(kind, _)| *kind)
    }
}

// ============================================================================
// Destinations
// ============================================================================

/// Returns the destinations subscribed for a room, in subscription order.
#[must_use]
pub fn room_topics(room: &RoomCode) -> [String; 4] {
    [
        format!("/topic/room/{room}/game"),
        format!("/topic/room/{room}/players"),
        format!("/topic/room/{room}/leaderboard"),
        "/user/queue/score".to_string(),
    ]
}

/// Returns the keep-alive destination for a room.
#[inline]
#[must_use]
pub fn ping_destination(room: &RoomCode) -> String {
    format!("/app/room/{room}/ping")
}

// ============================================================================
// Tests
// ============================================================================
