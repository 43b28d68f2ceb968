//! Game service collaborator.
//!
//! The request/response side of the game service lives outside this crate.
//! The controller reaches it through [`GameApi`]; the types here mirror
//! the service's JSON bodies.
//!
//! | Call | Endpoint |
//! |------|----------|
//! | [`submit_answer`](GameApi::submit_answer) | `POST /api/rooms/{roomCode}/answer` |
//! | [`leaderboard`](GameApi::leaderboard) | `GET /api/rooms/{roomCode}/leaderboard` |
//! | [`results`](GameApi::results) | `GET /api/rooms/{roomCode}/results` |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::identifiers::{PlayerId, QuestionId, RoomCode};
use crate::protocol::LeaderboardEntry;

use super::state::AnswerResult;

// ============================================================================
// Types
// ============================================================================

/// Answer submission.
///
/// `room_code` goes in the path; the rest is the JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    /// Room being played.
    #[serde(skip)]
    pub room_code: RoomCode,
    /// Answering player.
    pub player_id: PlayerId,
    /// Question being answered.
    pub question_id: QuestionId,
    /// Selected answer index.
    pub selected_answer_index: i64,
    /// Milliseconds from question start to submission.
    pub answer_time_ms: i64,
}

/// Leaderboard as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardSnapshot {
    pub room_code: RoomCode,
    #[serde(default, deserialize_with = "crate::protocol::number::integer")]
    pub question_index: i64,
    #[serde(default, deserialize_with = "crate::protocol::number::integer")]
    pub total_questions: i64,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// One podium place.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodiumEntry {
    #[serde(deserialize_with = "crate::protocol::number::integer")]
    pub rank: i64,
    pub nickname: String,
    #[serde(deserialize_with = "crate::protocol::number::integer")]
    pub total_score: i64,
}

/// End-of-game results.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResults {
    pub room_code: RoomCode,
    pub status: String,
    #[serde(deserialize_with = "crate::protocol::number::integer")]
    pub total_questions: i64,
    /// Game duration in seconds.
    #[serde(default, deserialize_with = "crate::protocol::number::integer")]
    pub duration: i64,
    #[serde(default)]
    pub podium: Vec<PodiumEntry>,
    #[serde(default)]
    pub all_players: Vec<LeaderboardEntry>,
    #[serde(default)]
    pub finished_at: Option<String>,
}

// ============================================================================
// GameApi
// ============================================================================

/// Request/response calls to the game service.
#[async_trait]
pub trait GameApi: Send + Sync {
    /// Submits an answer and returns its scoring.
    async fn submit_answer(&self, request: SubmitAnswerRequest) -> Result<AnswerResult>;

    /// Fetches the current leaderboard.
    async fn leaderboard(&self, room: &RoomCode) -> Result<LeaderboardSnapshot>;

    /// Fetches end-of-game results.
    async fn results(&self, room: &RoomCode) -> Result<GameResults>;
}

// ============================================================================
// Tests
// ============================================================================
