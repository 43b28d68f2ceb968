//! Subscription multiplexer.
//!
//! Tracks which topics are subscribed on the current socket. Every topic
//! maps to exactly one subscription; asking again is a no-op.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;

use crate::identifiers::SubscriptionId;
use crate::protocol::Frame;

// ============================================================================
// SubscriptionSet
// ============================================================================

/// Topic subscriptions for one connection.
///
/// Ids are `sub-0`, `sub-1`, ... in subscription order and restart after
/// [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    /// Topic → assigned id.
    topics: FxHashMap<String, SubscriptionId>,
    /// Sequence number of the next id.
    next: u32,
}

impl SubscriptionSet {
    /// Creates an empty set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a topic.
    ///
    /// Returns the `SUBSCRIBE` frame to send, or `None` if the topic is
    /// already tracked.
    pub fn subscribe(&mut self, topic: &str) -> Option<Frame> {
        if self.topics.contains_key(topic) {
            return None;
        }

        let id = SubscriptionId::new(self.next);
        self.next += 1;
        self.topics.insert(topic.to_string(), id);
        Some(Frame::subscribe(id, topic))
    }

    /// Returns `(id, topic)` pairs ordered by id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(SubscriptionId, String)> {
        let mut entries: Vec<_> = self
            .topics
            .iter()
            .map(|(topic, id)| (*id, topic.clone()))
            .collect();
        entries.sort_unstable();
        entries
    }

    /// Forgets every subscription and restarts numbering.
    pub fn clear(&mut self) {
        self.topics.clear();
        self.next = 0;
    }
}

// ============================================================================
// Tests
// ============================================================================
