//! Broadcast channel that replays its latest value to new subscribers.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

// ============================================================================
// ReplayChannel
// ============================================================================

/// Broadcast channel that remembers the most recently published value.
///
/// A subscriber created after a publish first receives that value, then
/// everything published afterwards. Publishing never waits on readers; a
/// reader that falls more than `capacity` values behind observes
/// [`RecvError::Lagged`].
pub struct ReplayChannel<T> {
    /// Most recent value. Also serializes publish against subscribe.
    latest: Mutex<Option<T>>,
    /// Fan-out sender.
    tx: broadcast::Sender<T>,
}

impl<T: Clone> ReplayChannel<T> {
    /// Creates a channel buffering up to `capacity` values per reader.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            latest: Mutex::new(None),
            tx,
        }
    }

    /// Publishes a value to all current readers and retains it.
    pub fn publish(&self, value: T) {
        let mut latest = self.latest.lock();
        *latest = Some(value.clone());
        // No readers is fine
        let _ = self.tx.send(value);
    }

    /// Returns the most recently published value.
    #[must_use]
    pub fn latest(&self) -> Option<T> {
        self.latest.lock().clone()
    }

    /// Creates a reader that starts with the latest value, if any.
    #[must_use]
    pub fn subscribe(&self) -> ReplayReceiver<T> {
        let latest = self.latest.lock();
        ReplayReceiver {
            pending: latest.clone(),
            rx: self.tx.subscribe(),
        }
    }

    /// Forgets the retained value. Readers created afterwards start empty.
    pub fn clear(&self) {
        *self.latest.lock() = None;
    }
}

// ============================================================================
// ReplayReceiver
// ============================================================================

/// Reader half of a [`ReplayChannel`].
pub struct ReplayReceiver<T> {
    /// Value replayed before anything from `rx`.
    pending: Option<T>,
    /// Live values.
    rx: broadcast::Receiver<T>,
}

impl<T: Clone> ReplayReceiver<T> {
    /// Receives the next value.
    ///
    /// # Errors
    ///
    /// - [`RecvError::Lagged`] if this reader fell behind
    /// - [`RecvError::Closed`] if the channel was dropped
    pub async fn recv(&mut self) -> Result<T, RecvError> {
        if let Some(value) = self.pending.take() {
            return Ok(value);
        }
        self.rx.recv().await
    }
}

// ============================================================================
// Tests
// ============================================================================
