//! Event payload types.
//!
//! Bodies of `MESSAGE` frames, decoded per topic by the router.
//!
//! # Event Types
//!
//! | Topic | Payload |
//! |-------|---------|
//! | game | [`GameEvent`] |
//! | players | [`PlayerEvent`] |
//! | leaderboard | `Vec<`[`LeaderboardEntry`]`>` |
//! | score | [`ScoreUpdate`] |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::{PlayerId, QuestionId, RoomCode};

// ============================================================================
// GameEventKind
// ============================================================================

/// Game progression event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameEventKind {
    /// A player joined the room.
    PlayerJoined,
    /// A player left the room.
    PlayerLeft,
    /// The host started the game; the first question follows.
    GameStarting,
    /// A question opened for answers.
    QuestionStart,
    /// The current question closed.
    QuestionEnd,
    /// The game is over.
    GameFinished,
    /// Room ownership moved to another player.
    HostChanged,
}

// ============================================================================
// GameEvent
// ============================================================================

/// An event on the game progression topic.
///
/// # Format
///
/// ```json
/// {
///   "eventId": "e-1",
///   "roomCode": "ABC123",
///   "eventType": "QUESTION_START",
///   "questionId": 7,
///   "questionIndex": 0,
///   "totalQuestions": 10,
///   "questionStartTime": 1700000000000,
///   "timerSeconds": 15,
///   "payload": { ... },
///   "question": { ... },
///   "serverTimestamp": 1700000000000
/// }
/// ```
///
/// `payload` and `question` have no fixed schema; see
/// [`resolve_question`](crate::game::resolve_question).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEvent {
    /// Server event id.
    #[serde(default)]
    pub event_id: String,

    /// Room the event belongs to.
    pub room_code: RoomCode,

    /// Event type.
    #[serde(rename = "eventType")]
    pub kind: GameEventKind,

    /// Question the event refers to.
    #[serde(default)]
    pub question_id: Option<QuestionId>,

    /// Zero-based position of the question.
    #[serde(default, deserialize_with = "crate::protocol::number::optional_integer")]
    pub question_index: Option<i64>,

    /// Number of questions in the game.
    #[serde(default, deserialize_with = "crate::protocol::number::optional_integer")]
    pub total_questions: Option<i64>,

    /// Server time the question opened, epoch millis.
    #[serde(default, deserialize_with = "crate::protocol::number::optional_integer")]
    pub question_start_time: Option<i64>,

    /// Answer window in seconds.
    #[serde(default, deserialize_with = "crate::protocol::number::optional_integer")]
    pub timer_seconds: Option<i64>,

    /// Loosely typed payload.
    #[serde(default)]
    pub payload: Option<Value>,

    /// Loosely typed question object.
    #[serde(default)]
    pub question: Option<Value>,

    /// Server time the event was emitted, epoch millis.
    #[serde(default, deserialize_with = "crate::protocol::number::integer")]
    pub server_timestamp: i64,
}

impl GameEvent {
    /// Creates an event with only the required fields set.
    #[must_use]
    pub fn new(room_code: RoomCode, kind: GameEventKind) -> Self {
        Self {
            event_id: String::new(),
            room_code,
            kind,
            question_id: None,
            question_index: None,
            total_questions: None,
            question_start_time: None,
            timer_seconds: None,
            payload: None,
            question: None,
            server_timestamp: 0,
        }
    }
}

// ============================================================================
// PlayerEvent
// ============================================================================

/// Player roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Player id.
    pub id: PlayerId,
    /// Display name.
    #[serde(default)]
    pub nickname: String,
    /// Whether the player owns the room.
    #[serde(default)]
    pub is_host: bool,
    /// Whether the player hosts on behalf of an absent owner.
    #[serde(default)]
    pub is_proxy_host: bool,
    /// Score so far.
    #[serde(default, deserialize_with = "crate::protocol::number::integer")]
    pub total_score: i64,
    /// Consecutive correct answers.
    #[serde(default, deserialize_with = "crate::protocol::number::integer")]
    pub current_streak: i64,
    /// Whether the player currently holds a socket.
    #[serde(default)]
    pub is_connected: bool,
}

/// An event on the player roster topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEvent {
    /// Server event id.
    #[serde(default)]
    pub event_id: String,
    /// Room the event belongs to.
    pub room_code: RoomCode,
    /// Roster change type (`PLAYER_JOINED`, `PLAYER_LEFT`, ...).
    pub event_type: String,
    /// Player the change concerns.
    pub player: Player,
    /// Server time the event was emitted, epoch millis.
    #[serde(default, deserialize_with = "crate::protocol::number::integer")]
    pub server_timestamp: i64,
}

// ============================================================================
// LeaderboardEntry
// ============================================================================

/// One row of a leaderboard snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// One-based rank.
    #[serde(deserialize_with = "crate::protocol::number::integer")]
    pub rank: i64,
    /// Player id.
    pub player_id: PlayerId,
    /// Display name.
    #[serde(default)]
    pub nickname: String,
    /// Score so far.
    #[serde(deserialize_with = "crate::protocol::number::integer")]
    pub total_score: i64,
    /// Consecutive correct answers.
    #[serde(default, deserialize_with = "crate::protocol::number::integer")]
    pub current_streak: i64,
}

// ============================================================================
// ScoreUpdate
// ============================================================================

/// Scoring result for one player's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreUpdate {
    /// Server event id.
    #[serde(default)]
    pub event_id: String,
    /// Room the result belongs to.
    pub room_code: RoomCode,
    /// Player who answered.
    pub player_id: PlayerId,
    /// Display name.
    #[serde(default)]
    pub player_nickname: String,
    /// Question that was answered.
    pub question_id: QuestionId,
    /// Whether the answer was correct.
    pub is_correct: bool,
    /// Index of the correct answer.
    #[serde(deserialize_with = "crate::protocol::number::integer")]
    pub correct_answer_index: i64,
    /// Points awarded for this answer.
    #[serde(deserialize_with = "crate::protocol::number::integer")]
    pub points_earned: i64,
    /// Score after this answer.
    #[serde(deserialize_with = "crate::protocol::number::integer")]
    pub new_total_score: i64,
    /// Streak before this answer.
    #[serde(default, deserialize_with = "crate::protocol::number::integer")]
    pub previous_streak: i64,
    /// Streak after this answer.
    #[serde(deserialize_with = "crate::protocol::number::integer")]
    pub new_streak: i64,
    /// Rank after this answer.
    #[serde(deserialize_with = "crate::protocol::number::integer")]
    pub current_rank: i64,
    /// Server time the event was emitted, epoch millis.
    #[serde(default, deserialize_with = "crate::protocol::number::integer")]
    pub server_timestamp: i64,
}

// ============================================================================
// Tests
// ============================================================================
