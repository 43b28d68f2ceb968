//! Game progression.
//!
//! Turns routed events into the client-side view of the current question.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `api` | Game service collaborator trait and bodies |
//! | `controller` | Event-driven progression controller |
//! | `countdown` | Cancellable one-second countdown |
//! | `resolver` | Tolerant question resolver |
//! | `state` | Progression state |

// ============================================================================
// Submodules
// ============================================================================

/// Game service collaborator.
pub mod api;

/// Progression controller.
pub mod controller;

/// Question countdown.
pub mod countdown;

/// Tolerant question resolver.
pub mod resolver;

/// Progression state.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use api::{GameApi, GameResults, LeaderboardSnapshot, PodiumEntry, SubmitAnswerRequest};
pub use controller::GameController;
pub use countdown::Countdown;
pub use resolver::{Answer, Question, QuestionDefaults, resolve_question};
pub use state::{AnswerResult, ProgressionState, QuestionPhase};
