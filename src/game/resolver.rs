//! Tolerant question resolver.
//!
//! Question payloads arrive in several shapes. The question object is
//! taken from the first of these that is a JSON object:
//!
//! | Order | Source |
//! |-------|--------|
//! | 1 | `event.question` |
//! | 2 | `event.payload.question` |
//! | 3 | `event.payload` |
//!
//! Each field is then read through an ordered key table, falling back to
//! top-level event fields and finally to [`QuestionDefaults`]. Resolution
//! is pure and never fails: a payload that cannot yield a question
//! resolves to `None`.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value};

use crate::identifiers::QuestionId;
use crate::protocol::GameEvent;
use crate::protocol::number::to_integer;

// ============================================================================
// Constants
// ============================================================================

/// Question identifier keys.
const ID_KEYS: &[&str] = &["id"];

/// Question text keys.
const TEXT_KEYS: &[&str] = &["questionText", "text", "question"];

/// Answer list keys.
const ANSWER_LIST_KEYS: &[&str] = &["answers", "answerOptions", "options"];

/// Answer index keys.
const ANSWER_INDEX_KEYS: &[&str] = &["answerIndex", "index", "id"];

/// Answer text keys.
const ANSWER_TEXT_KEYS: &[&str] = &["answerText", "text", "answer"];

/// Question order keys.
const ORDER_KEYS: &[&str] = &["questionOrder", "questionIndex"];

/// Timer keys.
const TIMER_KEYS: &[&str] = &["timerSeconds"];

/// Text shown when a payload carries no question text.
pub const PLACEHOLDER_TEXT: &str = "Question";

// ============================================================================
// Types
// ============================================================================

/// Fallbacks used when neither the question nor the event carries a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionDefaults {
    /// Question order.
    pub order: i64,
    /// Answer window in seconds.
    pub timer_seconds: i64,
    /// Questions per game, used when no total was ever announced.
    pub total_questions: i64,
}

impl Default for QuestionDefaults {
    fn default() -> Self {
        Self {
            order: 0,
            timer_seconds: 15,
            total_questions: 10,
        }
    }
}

/// A selectable answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// Index submitted when this answer is selected.
    pub index: i64,
    /// Display text, never blank.
    pub text: String,
}

/// A question as shown to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Server identifier, used for submissions.
    pub id: QuestionId,
    /// Question text.
    pub text: String,
    /// Answers in payload order.
    pub answers: Vec<Answer>,
    /// Position within the game.
    pub order: i64,
    /// Answer window in seconds.
    pub timer_seconds: i64,
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolves the question carried by a game event.
///
/// Returns `None` if the event has no question object or no question id.
#[must_use]
pub fn resolve_question(event: &GameEvent, defaults: &QuestionDefaults) -> Option<Question> {
    let object = question_object(event)?;

    let id = first_i64(object, ID_KEYS)
        .map(QuestionId)
        .or(event.question_id)?;

    let text = first_str(object, TEXT_KEYS)
        .unwrap_or(PLACEHOLDER_TEXT)
        .to_string();

    let answers = first_present(object, ANSWER_LIST_KEYS)
        .and_then(Value::as_array)
        .map(|entries| resolve_answers(entries))
        .unwrap_or_default();

    let order = first_i64(object, ORDER_KEYS)
        .or(event.question_index)
        .unwrap_or(defaults.order);

    let timer_seconds = first_i64(object, TIMER_KEYS)
        .or(event.timer_seconds)
        .unwrap_or(defaults.timer_seconds)
        .max(0);

    Some(Question {
        id,
        text,
        answers,
        order,
        timer_seconds,
    })
}

/// Picks the question object by source precedence.
fn question_object(event: &GameEvent) -> Option<&Map<String, Value>> {
    let payload = event.payload.as_ref();

    event
        .question
        .as_ref()
        .and_then(Value::as_object)
        .or_else(|| payload.and_then(|p| p.get("question")).and_then(Value::as_object))
        .or_else(|| payload.and_then(Value::as_object))
}

/// Resolves answer entries. Entries that are neither objects nor strings
/// are skipped; positions still count them.
fn resolve_answers(entries: &[Value]) -> Vec<Answer> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(position, entry)| {
            let (index, text) = match entry {
                Value::Object(object) => (
                    first_i64(object, ANSWER_INDEX_KEYS).unwrap_or(position as i64),
                    first_str(object, ANSWER_TEXT_KEYS).unwrap_or_default(),
                ),
                Value::String(text) => (position as i64, text.as_str()),
                _ => return None,
            };

            Some(Answer {
                index,
                text: display_text(text, position),
            })
        })
        .collect()
}

/// Replaces blank text with `Option N`, N being the 1-based position.
fn display_text(text: &str, position: usize) -> String {
    if text.trim().is_empty() {
        format!("Option {}", position + 1)
    } else {
        text.to_string()
    }
}

// ============================================================================
// Field Lookup
// ============================================================================

/// Returns the first non-null value among `keys`.
fn first_present<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

/// Returns the first string value among `keys`.
fn first_str<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
}

/// Returns the first numeric value among `keys`, truncating floats.
fn first_i64(object: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(as_integer))
}

/// Reads a JSON number as an integer.
fn as_integer(value: &Value) -> Option<i64> {
    value.as_number().and_then(to_integer)
}

// ============================================================================
// Tests
// ============================================================================
