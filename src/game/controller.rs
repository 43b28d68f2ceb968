//! Game progression controller.
//!
//! Drives [`ProgressionState`] from server events and local actions.
//!
//! | Input | Effect |
//! |-------|--------|
//! | `QUESTION_START` | Resolve question, reset state, restart countdown |
//! | `QUESTION_END` | Mark question ended |
//! | `GAME_FINISHED` | Stop countdown, terminal phase |
//! | `GAME_STARTING` | Show loading until the first question |
//! | Local score update | Apply scoring result |
//! | Leaderboard push | Replace leaderboard snapshot |
//! | [`submit_answer`](GameController::submit_answer) | One submission per question |
//!
//! The countdown only displays time. Reaching zero submits nothing and
//! advances nothing; the server drives progression.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::error::Result;
use crate::identifiers::{PlayerId, RoomCode};
use crate::protocol::{GameEvent, GameEventKind, LeaderboardEntry, ScoreUpdate};
use crate::router::EventRouter;

use super::api::{GameApi, GameResults, SubmitAnswerRequest};
use super::countdown::Countdown;
use super::resolver::{QuestionDefaults, resolve_question};
use super::state::{AnswerResult, ProgressionState, QuestionPhase};

// ============================================================================
// GameController
// ============================================================================

/// Game progression controller for one player in one room.
///
/// Cheap to clone; clones share state. Event handlers start countdown
/// tasks and must run inside a tokio runtime.
#[derive(Clone)]
pub struct GameController {
    inner: Arc<ControllerInner>,
}

/// Shared controller state.
struct ControllerInner {
    /// Game service.
    api: Arc<dyn GameApi>,
    /// Question fallbacks.
    defaults: QuestionDefaults,
    /// Progression state, observable.
    state: Arc<watch::Sender<ProgressionState>>,
    /// At most one countdown at a time.
    countdown: Mutex<Option<Countdown>>,
    /// When the current question started locally.
    question_started: Mutex<Option<Instant>>,
}

// ============================================================================
// GameController - Construction
// ============================================================================

impl GameController {
    /// Creates a controller for `player_id` in `room_code`.
    #[must_use]
    pub fn new(
        room_code: RoomCode,
        player_id: PlayerId,
        api: Arc<dyn GameApi>,
        defaults: QuestionDefaults,
    ) -> Self {
        let state = ProgressionState::new(room_code, player_id, defaults.timer_seconds);
        let (state_tx, _) = watch::channel(state);

        Self {
            inner: Arc::new(ControllerInner {
                api,
                defaults,
                state: Arc::new(state_tx),
                countdown: Mutex::new(None),
                question_started: Mutex::new(None),
            }),
        }
    }

    /// Returns a snapshot of the progression state.
    #[must_use]
    pub fn state(&self) -> ProgressionState {
        self.inner.state.borrow().clone()
    }

    /// Returns a receiver that observes every state change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<ProgressionState> {
        self.inner.state.subscribe()
    }
}

// ============================================================================
// GameController - Server Events
// ============================================================================

impl GameController {
    /// Applies a game event.
    ///
    /// Events for other rooms are ignored.
    pub fn handle_game_event(&self, event: &GameEvent) {
        if event.room_code != self.inner.state.borrow().room_code {
            debug!(room = %event.room_code, "Ignoring event for another room");
            return;
        }

        match event.kind {
            GameEventKind::QuestionStart => self.start_question(event),

            GameEventKind::QuestionEnd => {
                self.inner.state.send_modify(|s| s.question_ended = true);
                debug!(question = ?event.question_id, "Question ended");
            }

            GameEventKind::GameFinished => {
                self.cancel_countdown();
                self.inner.state.send_modify(ProgressionState::finish);
                info!(room = %event.room_code, "Game finished");
            }

            GameEventKind::GameStarting => {
                self.inner.state.send_modify(|s| s.loading = true);
                debug!(room = %event.room_code, "Game starting");
            }

            GameEventKind::PlayerJoined
            | GameEventKind::PlayerLeft
            | GameEventKind::HostChanged => {
                trace!(kind = ?event.kind, "Roster event");
            }
        }
    }

    /// Applies a scoring result if it belongs to the local player.
    pub fn apply_score_update(&self, update: &ScoreUpdate) {
        let result = AnswerResult::from(update);
        let applied = self.inner.state.send_if_modified(|s| {
            if update.player_id != s.player_id {
                return false;
            }
            s.apply_result(update.question_id, result);
            true
        });

        if applied {
            debug!(
                question = %update.question_id,
                correct = update.is_correct,
                score = update.new_total_score,
                "Score update applied"
            );
        }
    }

    /// Replaces the leaderboard snapshot.
    pub fn apply_leaderboard(&self, entries: Vec<LeaderboardEntry>) {
        trace!(rows = entries.len(), "Leaderboard updated");
        self.inner.state.send_modify(|s| s.leaderboard = entries);
    }

    /// Starts a question from a `QUESTION_START` event.
    fn start_question(&self, event: &GameEvent) {
        let Some(question) = resolve_question(event, &self.inner.defaults) else {
            debug!(event = %event.event_id, "Question start without resolvable question");
            return;
        };

        // Countdown lock serializes question starts
        let mut countdown = self.inner.countdown.lock();

        let mut sequence = None;
        self.inner.state.send_if_modified(|s| {
            if s.game_finished {
                return false;
            }

            let index = event.question_index.unwrap_or(question.order);
            if s.question_id() == Some(question.id) && s.question_index == index {
                return false;
            }

            let total = event
                .total_questions
                .or(Some(s.total_questions).filter(|total| *total > 0))
                .unwrap_or(self.inner.defaults.total_questions);

            *self.inner.question_started.lock() = Some(Instant::now());
            s.start_question(question.clone(), index, total);
            sequence = Some((s.question_sequence, s.timer_seconds));
            true
        });

        let Some((sequence, timer_seconds)) = sequence else {
            trace!(question = %question.id, "Question start ignored");
            return;
        };

        if let Some(previous) = countdown.take() {
            previous.cancel();
        }

        let state = Arc::clone(&self.inner.state);
        *countdown = Some(Countdown::start(timer_seconds, move |remaining| {
            state.send_if_modified(|s| {
                if s.question_sequence != sequence {
                    return false;
                }
                s.remaining_seconds = remaining;
                true
            });
        }));

        info!(question = %question.id, timer_seconds, "Question started");
    }

    fn cancel_countdown(&self) {
        if let Some(countdown) = self.inner.countdown.lock().take() {
            countdown.cancel();
        }
    }
}

// ============================================================================
// GameController - Local Actions
// ============================================================================

impl GameController {
    /// Submits an answer for the current question.
    ///
    /// Only the first call per question reaches the service; the guard is
    /// set before the call and stays set even if the call fails. Returns
    /// `Ok(None)` if the call was not made.
    ///
    /// # Errors
    ///
    /// Returns the service error. It is also recorded in
    /// [`ProgressionState::last_error`].
    pub async fn submit_answer(&self, answer_index: i64) -> Result<Option<AnswerResult>> {
        let mut claim = None;
        self.inner.state.send_if_modified(|s| {
            if s.has_answered || s.game_finished {
                return false;
            }
            let Some(question_id) = s.question_id() else {
                return false;
            };

            let elapsed = self
                .inner
                .question_started
                .lock()
                .map_or(0, |started| {
                    i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX)
                });

            s.has_answered = true;
            s.selected_answer = Some(answer_index);
            s.phase = QuestionPhase::Answered;
            claim = Some(SubmitAnswerRequest {
                room_code: s.room_code.clone(),
                player_id: s.player_id,
                question_id,
                selected_answer_index: answer_index,
                answer_time_ms: elapsed,
            });
            true
        });

        let Some(request) = claim else {
            debug!(answer_index, "Submission ignored");
            return Ok(None);
        };

        let question_id = request.question_id;
        debug!(
            question = %question_id,
            answer_index,
            answer_time_ms = request.answer_time_ms,
            "Submitting answer"
        );

        match self.inner.api.submit_answer(request).await {
            Ok(result) => {
                self.inner
                    .state
                    .send_modify(|s| s.apply_result(question_id, result));
                Ok(Some(result))
            }
            Err(e) => {
                warn!(question = %question_id, error = %e, "Answer submission failed");
                let message = e.to_string();
                self.inner.state.send_modify(|s| s.last_error = Some(message));
                Err(e)
            }
        }
    }

    /// Fetches the leaderboard from the service and stores it.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn refresh_leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        let room = self.inner.state.borrow().room_code.clone();

        match self.inner.api.leaderboard(&room).await {
            Ok(snapshot) => {
                self.apply_leaderboard(snapshot.leaderboard.clone());
                Ok(snapshot.leaderboard)
            }
            Err(e) => {
                warn!(%room, error = %e, "Leaderboard refresh failed");
                let message = e.to_string();
                self.inner.state.send_modify(|s| s.last_error = Some(message));
                Err(e)
            }
        }
    }

    /// Fetches end-of-game results.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    pub async fn final_results(&self) -> Result<GameResults> {
        let room = self.inner.state.borrow().room_code.clone();
        let results = self.inner.api.results(&room).await?;
        debug!(%room, players = results.all_players.len(), "Results fetched");
        Ok(results)
    }
}

// ============================================================================
// GameController - Wiring
// ============================================================================

impl GameController {
    /// Feeds the controller from a router until the router goes away.
    ///
    /// Lagging readers skip ahead; the game channel always replays its
    /// latest event first.
    #[must_use]
    pub fn attach(&self, router: &EventRouter) -> JoinHandle<()> {
        let mut game = router.subscribe_game();
        let mut scores = router.subscribe_scores();
        let mut leaderboard = router.subscribe_leaderboard();
        let controller = self.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = game.recv() => match event {
                        Ok(event) => controller.handle_game_event(&event),
                        Err(RecvError::Lagged(skipped)) => warn!(skipped, "Game events lagged"),
                        Err(RecvError::Closed) => break,
                    },

                    update = scores.recv() => match update {
                        Ok(update) => controller.apply_score_update(&update),
                        Err(RecvError::Lagged(skipped)) => warn!(skipped, "Score updates lagged"),
                        Err(RecvError::Closed) => break,
                    },

                    entries = leaderboard.recv() => match entries {
                        Ok(entries) => controller.apply_leaderboard(entries),
                        Err(RecvError::Lagged(skipped)) => warn!(skipped, "Leaderboard lagged"),
                        Err(RecvError::Closed) => break,
                    },
                }
            }

            controller.shutdown();
            debug!("Controller detached");
        })
    }

    /// Stops the countdown.
    pub fn shutdown(&self) {
        self.cancel_countdown();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Notify;

    use crate::error::Error;
    use crate::game::api::LeaderboardSnapshot;
    use crate::identifiers::QuestionId;
    use crate::protocol::{Frame, FrameCommand};

    // ------------------------------------------------------------------------
    // Fixtures
    // ------------------------------------------------------------------------

    #[derive(Default)]
    struct MockApi {
        calls: AtomicUsize,
        requests: Mutex<Vec<SubmitAnswerRequest>>,
        fail: AtomicBool,
        release: Option<Arc<Notify>>,
    }

    fn scored() -> AnswerResult {
        AnswerResult {
            is_correct: true,
            correct_answer_index: 1,
            points_earned: 150,
            new_total_score: 450,
            new_streak: 3,
            current_rank: 2,
        }
    }

    fn entry() -> LeaderboardEntry {
        LeaderboardEntry {
            rank: 1,
            player_id: PlayerId(1),
            nickname: "ana".into(),
            total_score: 450,
            current_streak: 3,
        }
    }

    #[async_trait]
    impl GameApi for MockApi {
        async fn submit_answer(&self, request: SubmitAnswerRequest) -> Result<AnswerResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().push(request);
            if let Some(release) = &self.release {
                release.notified().await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::api("service unavailable"));
            }
            Ok(scored())
        }

        async fn leaderboard(&self, room: &RoomCode) -> Result<LeaderboardSnapshot> {
            Ok(LeaderboardSnapshot {
                room_code: room.clone(),
                question_index: 0,
                total_questions: 10,
                leaderboard: vec![entry()],
            })
        }

        async fn results(&self, room: &RoomCode) -> Result<GameResults> {
            Ok(GameResults {
                room_code: room.clone(),
                status: "FINISHED".into(),
                total_questions: 10,
                duration: 120,
                podium: Vec::new(),
                all_players: vec![entry()],
                finished_at: None,
            })
        }
    }

    fn controller(api: &Arc<MockApi>) -> GameController {
        GameController::new(
            "ABC123".into(),
            PlayerId(1),
            Arc::clone(api) as Arc<dyn GameApi>,
            QuestionDefaults::default(),
        )
    }

    fn event(value: serde_json::Value) -> GameEvent {
        serde_json::from_value(value).expect("game event")
    }

    fn question_start(id: i64, timer_seconds: i64) -> GameEvent {
        event(json!({
            "roomCode": "ABC123",
            "eventType": "QUESTION_START",
            "questionIndex": id - 1,
            "totalQuestions": 5,
            "question": {
                "id": id,
                "questionText": format!("Question {id}"),
                "answers": ["a", "b", "c"],
                "timerSeconds": timer_seconds
            }
        }))
    }

    fn kind(kind: GameEventKind) -> GameEvent {
        GameEvent::new("ABC123".into(), kind)
    }

    fn score_update(player: i64, question: i64) -> ScoreUpdate {
        let result = scored();
        ScoreUpdate {
            event_id: String::new(),
            room_code: "ABC123".into(),
            player_id: PlayerId(player),
            player_nickname: "ana".into(),
            question_id: QuestionId(question),
            is_correct: result.is_correct,
            correct_answer_index: result.correct_answer_index,
            points_earned: result.points_earned,
            new_total_score: result.new_total_score,
            previous_streak: 2,
            new_streak: result.new_streak,
            current_rank: result.current_rank,
            server_timestamp: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Question lifecycle
    // ------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_question_start_runs_countdown() {
        let api = Arc::new(MockApi::default());
        let controller = controller(&api);

        controller.handle_game_event(&question_start(1, 15));
        let state = controller.state();
        assert_eq!(state.phase, QuestionPhase::Active);
        assert_eq!(state.question_id(), Some(QuestionId(1)));
        assert_eq!(state.total_questions, 5);
        assert!(!state.loading);

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        assert_eq!(controller.state().remaining_seconds, 10);

        tokio::time::sleep(Duration::from_secs(30)).await;
        let state = controller.state();
        assert_eq!(state.remaining_seconds, 0);
        assert_eq!(state.phase, QuestionPhase::Active);
        assert!(!state.has_answered);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_question_replaces_countdown() {
        let api = Arc::new(MockApi::default());
        let controller = controller(&api);

        controller.handle_game_event(&question_start(1, 15));
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(controller.state().remaining_seconds, 12);

        controller.handle_game_event(&question_start(2, 20));
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        let state = controller.state();
        assert_eq!(state.question_id(), Some(QuestionId(2)));
        assert_eq!(state.remaining_seconds, 18);
    }

    #[tokio::test]
    async fn test_unresolvable_question_ignored() {
        let api = Arc::new(MockApi::default());
        let controller = controller(&api);
        controller.handle_game_event(&question_start(1, 15));
        let before = controller.state();

        controller.handle_game_event(&event(json!({
            "roomCode": "ABC123",
            "eventType": "QUESTION_START",
            "question": {"questionText": "no id"}
        })));

        assert_eq!(controller.state(), before);
    }

    #[tokio::test]
    async fn test_duplicate_question_start_ignored() {
        let api = Arc::new(MockApi::default());
        let controller = controller(&api);
        controller.handle_game_event(&question_start(1, 15));
        controller.submit_answer(0).await.expect("submit");

        controller.handle_game_event(&question_start(1, 15));

        let state = controller.state();
        assert!(state.has_answered);
        assert_eq!(state.question_sequence, 1);
    }

    #[tokio::test]
    async fn test_index_and_total_fallbacks() {
        let api = Arc::new(MockApi::default());
        let controller = controller(&api);

        controller.handle_game_event(&event(json!({
            "roomCode": "ABC123",
            "eventType": "QUESTION_START",
            "question": {"id": 1, "questionOrder": 3}
        })));
        let state = controller.state();
        assert_eq!(state.question_index, 3);
        assert_eq!(state.total_questions, 10);

        controller.handle_game_event(&question_start(2, 15));
        controller.handle_game_event(&event(json!({
            "roomCode": "ABC123",
            "eventType": "QUESTION_START",
            "questionIndex": 2,
            "question": {"id": 3}
        })));
        let state = controller.state();
        assert_eq!(state.question_index, 2);
        assert_eq!(state.total_questions, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_question_end_and_game_finished() {
        let api = Arc::new(MockApi::default());
        let controller = controller(&api);
        controller.handle_game_event(&kind(GameEventKind::GameStarting));
        assert!(controller.state().loading);

        controller.handle_game_event(&question_start(1, 15));
        controller.handle_game_event(&kind(GameEventKind::QuestionEnd));
        assert!(controller.state().question_ended);
        assert!(!controller.state().has_answered);

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        controller.handle_game_event(&kind(GameEventKind::GameFinished));
        tokio::time::sleep(Duration::from_secs(5)).await;

        let state = controller.state();
        assert_eq!(state.phase, QuestionPhase::Finished);
        assert!(state.game_finished);
        assert_eq!(state.remaining_seconds, 14);

        controller.handle_game_event(&question_start(2, 15));
        assert_eq!(controller.state().question_id(), Some(QuestionId(1)));
    }

    #[tokio::test]
    async fn test_event_for_other_room_ignored() {
        let api = Arc::new(MockApi::default());
        let controller = controller(&api);

        controller.handle_game_event(&GameEvent::new("XYZ789".into(), GameEventKind::GameFinished));

        assert!(!controller.state().game_finished);
    }

    // ------------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_submit_applies_result_and_reports_elapsed() {
        let api = Arc::new(MockApi::default());
        let controller = controller(&api);
        controller.handle_game_event(&question_start(1, 15));

        tokio::time::sleep(Duration::from_secs(3)).await;
        let result = controller.submit_answer(2).await.expect("submit");

        assert_eq!(result, Some(scored()));
        let request = api.requests.lock()[0].clone();
        assert_eq!(request.question_id, QuestionId(1));
        assert_eq!(request.selected_answer_index, 2);
        assert_eq!(request.answer_time_ms, 3_000);

        let state = controller.state();
        assert_eq!(state.phase, QuestionPhase::Revealed);
        assert_eq!(state.selected_answer, Some(2));
        assert_eq!(state.total_score, 450);
        assert_eq!(state.current_rank, 2);
    }

    #[tokio::test]
    async fn test_second_submit_makes_no_call() {
        let release = Arc::new(Notify::new());
        let api = Arc::new(MockApi {
            release: Some(Arc::clone(&release)),
            ..MockApi::default()
        });
        let controller = controller(&api);
        controller.handle_game_event(&question_start(1, 15));

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit_answer(0).await }
        });
        while api.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        // First call is still in flight
        assert_eq!(controller.submit_answer(1).await.expect("second"), None);
        release.notify_one();
        assert!(first.await.expect("join").expect("first").is_some());

        assert_eq!(controller.submit_answer(2).await.expect("third"), None);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.state().selected_answer, Some(0));
    }

    #[tokio::test]
    async fn test_failed_submit_forfeits_question() {
        let api = Arc::new(MockApi::default());
        api.fail.store(true, Ordering::SeqCst);
        let controller = controller(&api);
        controller.handle_game_event(&question_start(1, 15));

        let result = controller.submit_answer(1).await;
        assert!(matches!(result, Err(Error::Api { .. })));

        let state = controller.state();
        assert!(state.has_answered);
        assert_eq!(state.phase, QuestionPhase::Answered);
        assert!(state.last_error.is_some());

        assert_eq!(controller.submit_answer(1).await.expect("retry"), None);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);

        controller.handle_game_event(&question_start(2, 15));
        assert!(controller.state().last_error.is_none());
    }

    #[tokio::test]
    async fn test_submit_without_question_ignored() {
        let api = Arc::new(MockApi::default());
        let controller = controller(&api);

        assert_eq!(controller.submit_answer(0).await.expect("submit"), None);
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    // ------------------------------------------------------------------------
    // Score updates
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_score_update_and_response_order_independent() {
        // Response first, push second
        let api = Arc::new(MockApi::default());
        let response_first = controller(&api);
        response_first.handle_game_event(&question_start(1, 15));
        response_first.submit_answer(1).await.expect("submit");
        response_first.apply_score_update(&score_update(1, 1));

        // Push first, response second
        let release = Arc::new(Notify::new());
        let gated = Arc::new(MockApi {
            release: Some(Arc::clone(&release)),
            ..MockApi::default()
        });
        let push_first = controller(&gated);
        push_first.handle_game_event(&question_start(1, 15));
        let pending = tokio::spawn({
            let controller = push_first.clone();
            async move { controller.submit_answer(1).await }
        });
        while gated.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        push_first.apply_score_update(&score_update(1, 1));
        release.notify_one();
        pending.await.expect("join").expect("submit");

        let mut a = response_first.state();
        let mut b = push_first.state();
        a.remaining_seconds = 0;
        b.remaining_seconds = 0;
        assert_eq!(a, b);
        assert_eq!(a.phase, QuestionPhase::Revealed);
        assert_eq!(a.total_score, 450);
    }

    #[tokio::test]
    async fn test_score_update_for_other_player_ignored() {
        let api = Arc::new(MockApi::default());
        let controller = controller(&api);
        controller.handle_game_event(&question_start(1, 15));

        controller.apply_score_update(&score_update(9, 1));

        let state = controller.state();
        assert_eq!(state.total_score, 0);
        assert!(state.last_result.is_none());
    }

    #[tokio::test]
    async fn test_score_push_without_submit_reveals() {
        let api = Arc::new(MockApi::default());
        let controller = controller(&api);
        controller.handle_game_event(&question_start(1, 15));

        controller.apply_score_update(&score_update(1, 1));

        let state = controller.state();
        assert_eq!(state.phase, QuestionPhase::Revealed);
        assert_eq!(state.last_result, Some(scored()));
        assert_eq!(controller.submit_answer(0).await.expect("submit"), None);
    }

    // ------------------------------------------------------------------------
    // Leaderboard and wiring
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_refresh_leaderboard_and_results() {
        let api = Arc::new(MockApi::default());
        let controller = controller(&api);

        let rows = controller.refresh_leaderboard().await.expect("leaderboard");
        assert_eq!(rows, vec![entry()]);
        assert_eq!(controller.state().leaderboard, vec![entry()]);

        let results = controller.final_results().await.expect("results");
        assert_eq!(results.status, "FINISHED");
    }

    #[tokio::test]
    async fn test_attach_follows_router() {
        let api = Arc::new(MockApi::default());
        let controller = controller(&api);
        let router = EventRouter::new(16);
        let mut watch = controller.watch();
        let _task = controller.attach(&router);

        let message = |destination: &str, body: String| {
            Frame::new(FrameCommand::Message)
                .with_header("destination", destination)
                .with_body(body)
        };

        let start = serde_json::to_string(&question_start(1, 15)).expect("serialize");
        router.dispatch(&message("/topic/room/ABC123/game", start));
        watch
            .wait_for(|s| s.question_id() == Some(QuestionId(1)))
            .await
            .expect("question");

        let update = serde_json::to_string(&score_update(1, 1)).expect("serialize");
        router.dispatch(&message("/user/queue/score", update));
        watch
            .wait_for(|s| s.phase == QuestionPhase::Revealed)
            .await
            .expect("revealed");

        let board = serde_json::to_string(&vec![entry()]).expect("serialize");
        router.dispatch(&message("/topic/room/ABC123/leaderboard", board));
        watch
            .wait_for(|s| !s.leaderboard.is_empty())
            .await
            .expect("leaderboard");
    }
}
