//! Earliest-next-call throttle for one outbound channel.
//!
//! A throttle never delays work on results already in hand: it only holds
//! back the *next* call on its channel until `interval` has passed since the
//! previous one was released.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Shared throttle handle. Clones share the same schedule.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    next_allowed: Arc<Mutex<Option<Instant>>>,
}

impl Throttle {
    /// Create a throttle with the given minimum spacing between calls.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_allowed: Arc::new(Mutex::new(None)),
        }
    }

    /// A throttle that never waits.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Configured spacing.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until a call is allowed, then reserve the next slot.
    ///
    /// The lock is held across the sleep so concurrent callers queue up in
    /// order rather than all waking at the same instant.
    pub async fn ready(&self) {
        let mut next = self.next_allowed.lock().await;
        if let Some(at) = *next {
            if at > Instant::now() {
                tracing::trace!(wait_ms = (at - Instant::now()).as_millis(), "throttling");
                tokio::time::sleep_until(at).await;
            }
        }
        *next = Some(Instant::now() + self.interval);
    }
}
