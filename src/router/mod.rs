//! Event router.
//!
//! Turns delivered `MESSAGE` frames into typed events and fans them out on
//! one channel per topic.
//!
//! | Topic | Channel | Replay |
//! |-------|---------|--------|
//! | game | [`ReplayChannel<GameEvent>`] | latest value |
//! | players | `broadcast<PlayerEvent>` | none |
//! | leaderboard | `broadcast<Vec<LeaderboardEntry>>` | none |
//! | score | `broadcast<ScoreUpdate>` | none |
//!
//! A body that fails to decode is dropped and counted; it never reaches a
//! subscriber and never stops the frames behind it.

// ============================================================================
// Submodules
// ============================================================================

/// Latest-value replaying broadcast channel.
pub mod replay;

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::protocol::{
    Frame, FrameCommand, GameEvent, LeaderboardEntry, PlayerEvent, ScoreUpdate, TopicKind,
};

pub use replay::{ReplayChannel, ReplayReceiver};

// ============================================================================
// EventRouter
// ============================================================================

/// Decodes delivered frames and publishes them per topic.
///
/// Publishing never blocks: readers that fall behind lag and skip ahead.
pub struct EventRouter {
    /// Game progression events, latest retained.
    game: ReplayChannel<GameEvent>,
    /// Roster changes.
    players: broadcast::Sender<PlayerEvent>,
    /// Leaderboard snapshots.
    leaderboard: broadcast::Sender<Vec<LeaderboardEntry>>,
    /// Scoring results.
    scores: broadcast::Sender<ScoreUpdate>,
    /// Frames dropped for a missing/unknown destination or undecodable body.
    dropped: AtomicU64,
}

impl EventRouter {
    /// Creates a router whose channels buffer `capacity` events per reader.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            game: ReplayChannel::new(capacity),
            players: broadcast::channel(capacity).0,
            leaderboard: broadcast::channel(capacity).0,
            scores: broadcast::channel(capacity).0,
            dropped: AtomicU64::new(0),
        }
    }

    /// Subscribes to game events, starting with the latest one.
    #[must_use]
    pub fn subscribe_game(&self) -> ReplayReceiver<GameEvent> {
        self.game.subscribe()
    }

    /// Returns the most recent game event.
    #[must_use]
    pub fn latest_game_event(&self) -> Option<GameEvent> {
        self.game.latest()
    }

    /// Forgets the retained game event so later readers start empty.
    pub fn reset(&self) {
        self.game.clear();
    }

    /// Subscribes to roster changes.
    #[must_use]
    pub fn subscribe_players(&self) -> broadcast::Receiver<PlayerEvent> {
        self.players.subscribe()
    }

    /// Subscribes to leaderboard snapshots.
    #[must_use]
    pub fn subscribe_leaderboard(&self) -> broadcast::Receiver<Vec<LeaderboardEntry>> {
        self.leaderboard.subscribe()
    }

    /// Subscribes to scoring results.
    #[must_use]
    pub fn subscribe_scores(&self) -> broadcast::Receiver<ScoreUpdate> {
        self.scores.subscribe()
    }

    /// Returns how many frames have been dropped so far.
    #[inline]
    #[must_use]
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Routes one inbound frame.
    ///
    /// Returns the topic the frame was published on, or `None` if it was
    /// not a `MESSAGE` or was dropped.
    pub fn dispatch(&self, frame: &Frame) -> Option<TopicKind> {
        if frame.command != FrameCommand::Message {
            trace!(command = %frame.command, "Ignoring non-message frame");
            return None;
        }

        let Some(destination) = frame.destination() else {
            self.drop_frame("<none>", "missing destination");
            return None;
        };

        let Some(kind) = TopicKind::classify(destination) else {
            self.drop_frame(destination, "unknown destination");
            return None;
        };

        let published = match kind {
            TopicKind::Game => self
                .decode::<GameEvent>(destination, &frame.body)
                .map(|event| self.game.publish(event)),
            TopicKind::Players => self
                .decode::<PlayerEvent>(destination, &frame.body)
                .map(|event| {
                    let _ = self.players.send(event);
                }),
            TopicKind::Leaderboard => self
                .decode::<Vec<LeaderboardEntry>>(destination, &frame.body)
                .map(|entries| {
                    let _ = self.leaderboard.send(entries);
                }),
            TopicKind::Score => self
                .decode::<ScoreUpdate>(destination, &frame.body)
                .map(|update| {
                    let _ = self.scores.send(update);
                }),
        };

        published.map(|()| {
            trace!(destination, ?kind, "Event published");
            kind
        })
    }

    /// Decodes a body, counting the frame as dropped on failure.
    fn decode<T: DeserializeOwned>(&self, destination: &str, body: &str) -> Option<T> {
        match serde_json::from_str(body) {
            Ok(value) => Some(value),
            Err(e) => {
                self.drop_frame(destination, &e.to_string());
                None
            }
        }
    }

    /// Counts and logs a dropped frame.
    fn drop_frame(&self, destination: &str, reason: &str) {
        let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(destination, reason, total, "Dropped inbound frame");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::identifiers::{PlayerId, QuestionId};
    use crate::protocol::GameEventKind;

    fn message(destination: &str, body: &str) -> Frame {
        Frame::new(FrameCommand::Message)
            .with_header("destination", destination)
            .with_body(body)
    }

    #[tokio::test]
    async fn test_game_event_replayed_to_late_subscriber() {
        let router = EventRouter::new(8);
        let frame = message(
            "/topic/room/ABC123/game",
            r#"{"roomCode":"ABC123","eventType":"GAME_STARTING"}"#,
        );

        assert_eq!(router.dispatch(&frame), Some(TopicKind::Game));

        let mut rx = router.subscribe_game();
        let event = rx.recv().await.expect("replayed event");
        assert_eq!(event.kind, GameEventKind::GameStarting);
    }

    #[tokio::test]
    async fn test_bad_body_dropped_and_stream_continues() {
        let router = EventRouter::new(8);
        let mut scores = router.subscribe_scores();

        let bad = message("/user/queue/score", "{not json");
        let good = message(
            "/user/queue/score",
            r#"{"roomCode":"ABC123","playerId":3,"questionId":7,"isCorrect":false,
                "correctAnswerIndex":2,"pointsEarned":0,"newTotalScore":100,
                "newStreak":0,"currentRank":4}"#,
        );

        assert_eq!(router.dispatch(&bad), None);
        assert_eq!(router.dispatch(&good), Some(TopicKind::Score));
        assert_eq!(router.dropped_frames(), 1);

        let update = scores.recv().await.expect("score update");
        assert_eq!(update.player_id, PlayerId(3));
        assert_eq!(update.current_rank, 4);
    }

    #[tokio::test]
    async fn test_integral_floats_accepted() {
        let router = EventRouter::new(8);
        let mut scores = router.subscribe_scores();

        let game = message(
            "/topic/room/ABC123/game",
            r#"{"roomCode":"ABC123","eventType":"QUESTION_START","questionId":7.0,
                "questionIndex":0.0,"totalQuestions":10.0,"timerSeconds":15.0}"#,
        );
        let score = message(
            "/user/queue/score",
            r#"{"roomCode":"ABC123","playerId":3.0,"questionId":7.0,"isCorrect":true,
                "correctAnswerIndex":1.0,"pointsEarned":850.0,"newTotalScore":850.0,
                "newStreak":1.0,"currentRank":1.0}"#,
        );
        let leaderboard = message(
            "/topic/room/ABC123/leaderboard",
            r#"[{"rank":1.0,"playerId":3.0,"nickname":"ana","totalScore":850.0}]"#,
        );

        assert_eq!(router.dispatch(&game), Some(TopicKind::Game));
        assert_eq!(router.dispatch(&score), Some(TopicKind::Score));
        assert_eq!(router.dispatch(&leaderboard), Some(TopicKind::Leaderboard));
        assert_eq!(router.dropped_frames(), 0);

        let event = router.latest_game_event().expect("game event");
        assert_eq!(event.question_id, Some(QuestionId(7)));
        assert_eq!(event.timer_seconds, Some(15));

        let update = scores.recv().await.expect("score update");
        assert_eq!(update.player_id, PlayerId(3));
        assert_eq!(update.points_earned, 850);
    }

    #[tokio::test]
    async fn test_leaderboard_array() {
        let router = EventRouter::new(8);
        let mut rx = router.subscribe_leaderboard();

        let frame = message(
            "/topic/room/ABC123/leaderboard",
            r#"[{"rank":1,"playerId":3,"nickname":"ana","totalScore":900,"currentStreak":2}]"#,
        );
        assert_eq!(router.dispatch(&frame), Some(TopicKind::Leaderboard));

        let entries = rx.recv().await.expect("leaderboard");
        assert_eq!(entries[0].nickname, "ana");
    }

    #[tokio::test]
    async fn test_player_event() {
        let router = EventRouter::new(8);
        let mut rx = router.subscribe_players();

        let frame = message(
            "/topic/room/ABC123/players",
            r#"{"roomCode":"ABC123","eventType":"PLAYER_LEFT","player":{"id":9,"nickname":"cy"}}"#,
        );
        assert_eq!(router.dispatch(&frame), Some(TopicKind::Players));
        assert_eq!(rx.recv().await.expect("player event").event_type, "PLAYER_LEFT");
    }

    #[tokio::test]
    async fn test_reset_forgets_latest_game_event() {
        let router = EventRouter::new(8);
        let frame = message(
            "/topic/room/ABC123/game",
            r#"{"roomCode":"ABC123","eventType":"GAME_STARTING"}"#,
        );
        router.dispatch(&frame);

        router.reset();

        assert!(router.latest_game_event().is_none());
        let mut rx = router.subscribe_game();
        let replayed = tokio::time::timeout(Duration::from_millis(20), rx.recv()).await;
        assert!(replayed.is_err());
    }

    #[test]
    fn test_non_message_frames_ignored_without_counting() {
        let router = EventRouter::new(8);
        let frame = Frame::new(FrameCommand::Connected).with_header("version", "1.2");

        assert_eq!(router.dispatch(&frame), None);
        assert_eq!(router.dropped_frames(), 0);
    }

    #[test]
    fn test_unknown_and_missing_destination_counted() {
        let router = EventRouter::new(8);

        assert_eq!(router.dispatch(&message("/topic/room/ABC123/chat", "{}")), None);
        assert_eq!(router.dispatch(&Frame::new(FrameCommand::Message)), None);
        assert_eq!(router.dropped_frames(), 2);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let router = EventRouter::new(1);
        let frame = message(
            "/topic/room/ABC123/players",
            r#"{"roomCode":"ABC123","eventType":"PLAYER_JOINED","player":{"id":1}}"#,
        );
        assert_eq!(router.dispatch(&frame), Some(TopicKind::Players));
        assert_eq!(router.dropped_frames(), 0);
    }
}
