//! Progression state.
//!
//! [`ProgressionState`] is the client-side view of the current question.
//! Only the [`GameController`](super::GameController) mutates it; readers
//! get snapshots through a `watch` channel.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::identifiers::{PlayerId, QuestionId, RoomCode};
use crate::protocol::{LeaderboardEntry, ScoreUpdate};

use super::resolver::Question;

// ============================================================================
// QuestionPhase
// ============================================================================

/// Lifecycle of the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QuestionPhase {
    /// No question yet.
    #[default]
    Idle,
    /// Counting down, no answer submitted.
    Active,
    /// Answer submitted, result pending.
    Answered,
    /// Result known.
    Revealed,
    /// Game over.
    Finished,
}

// ============================================================================
// AnswerResult
// ============================================================================

/// Scoring outcome of the local player's answer.
///
/// Deserializes the submission response; [`ScoreUpdate`] pushes convert
/// into the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    /// Whether the answer was correct.
    pub is_correct: bool,
    /// Index of the correct answer.
    #[serde(alias = "correctIndex", deserialize_with = "crate::protocol::number::integer")]
    pub correct_answer_index: i64,
    /// Points awarded.
    #[serde(deserialize_with = "crate::protocol::number::integer")]
    pub points_earned: i64,
    /// Score after this answer.
    #[serde(deserialize_with = "crate::protocol::number::integer")]
    pub new_total_score: i64,
    /// Streak after this answer.
    #[serde(deserialize_with = "crate::protocol::number::integer")]
    pub new_streak: i64,
    /// Rank after this answer.
    #[serde(deserialize_with = "crate::protocol::number::integer")]
    pub current_rank: i64,
}

impl From<&ScoreUpdate> for AnswerResult {
    fn from(update: &ScoreUpdate) -> Self {
        Self {
            is_correct: update.is_correct,
            correct_answer_index: update.correct_answer_index,
            points_earned: update.points_earned,
            new_total_score: update.new_total_score,
            new_streak: update.new_streak,
            current_rank: update.current_rank,
        }
    }
}

// ============================================================================
// ProgressionState
// ============================================================================

/// Client view of game progression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionState {
    /// Room being played.
    pub room_code: RoomCode,
    /// Local player.
    pub player_id: PlayerId,

    /// Current question.
    pub question: Option<Question>,
    /// Bumped on every accepted question start.
    pub question_sequence: u64,
    /// Zero-based position of the current question.
    pub question_index: i64,
    /// Number of questions in the game; 0 until announced.
    pub total_questions: i64,
    /// Answer window of the current question.
    pub timer_seconds: i64,
    /// Seconds left; never negative.
    pub remaining_seconds: i64,

    /// Answer index the local player picked.
    pub selected_answer: Option<i64>,
    /// Whether the local player has submitted for the current question.
    pub has_answered: bool,
    /// Phase of the current question.
    pub phase: QuestionPhase,
    /// Result for the current question, once known.
    pub last_result: Option<AnswerResult>,

    /// Latest known score.
    pub total_score: i64,
    /// Latest known streak.
    pub current_streak: i64,
    /// Latest known rank; 0 until ranked.
    pub current_rank: i64,

    /// The server closed the current question.
    pub question_ended: bool,
    /// The game is over.
    pub game_finished: bool,
    /// Waiting for the first question.
    pub loading: bool,
    /// Last failed operation.
    pub last_error: Option<String>,

    /// Latest leaderboard snapshot.
    pub leaderboard: Vec<LeaderboardEntry>,
}

impl ProgressionState {
    /// Creates the state for a player joining a room.
    #[must_use]
    pub fn new(room_code: RoomCode, player_id: PlayerId, timer_seconds: i64) -> Self {
        Self {
            room_code,
            player_id,
            question: None,
            question_sequence: 0,
            question_index: 0,
            total_questions: 0,
            timer_seconds,
            remaining_seconds: timer_seconds,
            selected_answer: None,
            has_answered: false,
            phase: QuestionPhase::Idle,
            last_result: None,
            total_score: 0,
            current_streak: 0,
            current_rank: 0,
            question_ended: false,
            game_finished: false,
            loading: true,
            last_error: None,
            leaderboard: Vec::new(),
        }
    }

    /// Returns the id of the current question.
    #[inline]
    #[must_use]
    pub fn question_id(&self) -> Option<QuestionId> {
        self.question.as_ref().map(|q| q.id)
    }

    /// Replaces every per-question field for a new question.
    pub fn start_question(&mut self, question: Question, index: i64, total: i64) {
        self.timer_seconds = question.timer_seconds;
        self.remaining_seconds = question.timer_seconds;
        self.question = Some(question);
        self.question_sequence += 1;
        self.question_index = index;
        self.total_questions = total;
        self.selected_answer = None;
        self.has_answered = false;
        self.phase = QuestionPhase::Active;
        self.last_result = None;
        self.question_ended = false;
        self.loading = false;
        self.last_error = None;
    }

    /// Applies a scoring result for `question_id`.
    ///
    /// Totals always take the latest values. Per-question fields only
    /// change if `question_id` is the current question. Applying the same
    /// result twice, or two results in either order, assigns and never
    /// accumulates.
    pub fn apply_result(&mut self, question_id: QuestionId, result: AnswerResult) {
        self.total_score = result.new_total_score;
        self.current_streak = result.new_streak;
        self.current_rank = result.current_rank;

        if self.question_id() != Some(question_id) {
            return;
        }

        self.last_result = Some(result);
        self.has_answered = true;
        if matches!(self.phase, QuestionPhase::Active | QuestionPhase::Answered) {
            self.phase = QuestionPhase::Revealed;
        }
    }

    /// Marks the game over.
    pub fn finish(&mut self) {
        self.game_finished = true;
        self.phase = QuestionPhase::Finished;
    }
}

// ============================================================================
// Tests
// ============================================================================
