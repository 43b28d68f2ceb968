//! Question countdown.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::trace;

// ============================================================================
// Constants
// ============================================================================

/// Countdown resolution.
const TICK: Duration = Duration::from_secs(1);

// ============================================================================
// Countdown
// ============================================================================

/// A one-second countdown running on its own task.
///
/// `on_tick` receives the remaining seconds after each tick, ending with 0.
/// Reaching zero only stops the task. Dropping the countdown cancels it.
pub struct Countdown {
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Starts counting down from `seconds`. Negative values count as 0.
    pub fn start<F>(seconds: i64, mut on_tick: F) -> Self
    where
        F: FnMut(i64) + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut remaining = seconds.max(0);
            let mut ticker = interval_at(Instant::now() + TICK, TICK);

            while remaining > 0 {
                ticker.tick().await;
                remaining -= 1;
                on_tick(remaining);
            }

            trace!("Countdown elapsed");
        });

        Self { handle }
    }

    /// Stops the countdown. No tick is delivered afterwards.
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicI64, Ordering};

    fn tracked(seconds: i64) -> (Countdown, Arc<AtomicI64>) {
        let remaining = Arc::new(AtomicI64::new(seconds));
        let sink = Arc::clone(&remaining);
        let countdown = Countdown::start(seconds, move |left| sink.store(left, Ordering::SeqCst));
        (countdown, remaining)
    }

    #[tokio::test(start_paused = true)]
    async fn test_five_seconds_elapsed() {
        let (_countdown, remaining) = tracked(15);

        tokio::time::sleep(Duration::from_millis(5_500)).await;

        assert_eq!(remaining.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_zero() {
        let (_countdown, remaining) = tracked(3);

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(remaining.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(remaining.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_freezes_value() {
        let (countdown, remaining) = tracked(15);

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        countdown.cancel();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(remaining.load(Ordering::SeqCst), 13);
    }

    #[tokio::test(start_paused = true)]
    async fn test_negative_start_never_ticks() {
        let (_countdown, remaining) = tracked(-4);

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(remaining.load(Ordering::SeqCst), -4);
    }
}
