//! Type-safe identifiers.
//!
//! Newtype wrappers keep room codes, player ids and question ids from being
//! mixed up at call sites that take several of them.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::protocol::number::integer;

// ============================================================================
// RoomCode
// ============================================================================

/// Short code identifying a game room (e.g. `ABC123`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Creates a room code.
    #[inline]
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for RoomCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

// ============================================================================
// PlayerId
// ============================================================================

/// Server-assigned player identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct PlayerId(pub i64);

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        integer(deserializer).map(Self)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// QuestionId
// ============================================================================

/// Server-assigned question identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct QuestionId(pub i64);

impl<'de> Deserialize<'de> for QuestionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        integer(deserializer).map(Self)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// SubscriptionId
// ============================================================================

/// Per-connection subscription identifier, rendered as `sub-N`.
///
/// Only used for protocol bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u32);

impl SubscriptionId {
    /// Creates a subscription id from its sequence number.
    #[inline]
    #[must_use]
    pub const fn new(sequence: u32) -> Self {
        Self(sequence)
    }

    /// Returns the sequence number.
    #[inline]
    #[must_use]
    pub const fn sequence(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_id_display() {
        assert_eq!(SubscriptionId::new(0).to_string(), "sub-0");
        assert_eq!(SubscriptionId::new(12).to_string(), "sub-12");
    }

    #[test]
    fn test_room_code_from_str() {
        let code: RoomCode = "ABC123".into();
        assert_eq!(code.as_str(), "ABC123");
        assert_eq!(code.to_string(), "ABC123");
    }

    #[test]
    fn test_ids_deserialize_transparently() {
        let id: PlayerId = serde_json::from_str("42").expect("player id");
        assert_eq!(id, PlayerId(42));

        let id: QuestionId = serde_json::from_str("7.0").expect("float question id");
        assert_eq!(id, QuestionId(7));

        let code: RoomCode = serde_json::from_str("\"XYZ\"").expect("room code");
        assert_eq!(code, RoomCode::new("XYZ"));
    }
}
