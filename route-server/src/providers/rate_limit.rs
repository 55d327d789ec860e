//! Per-provider request throttling.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

/// Longest spacing a limiter will enforce. Slower rates are clamped to this.
pub const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Minimum-interval throttle shared by every caller of one provider.
///
/// Each call reserves the next dispatch slot under a lock, so concurrent
/// callers queue behind each other's wait instead of all observing an idle
/// limiter and bursting. The lock is released before sleeping.
///
/// A caller dropped while waiting hands its slot back, provided no later
/// caller has queued behind it in the meantime.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    /// Dispatch time of the most recently reserved call.
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Limiter allowing `requests_per_second` calls per second.
    ///
    /// Non-positive or non-finite rates disable throttling. Rates slower
    /// than one call per [`MAX_INTERVAL`] are clamped to it.
    pub fn new(requests_per_second: f64) -> Self {
        let interval = if requests_per_second.is_finite() && requests_per_second > 0.0 {
            Duration::try_from_secs_f64(1.0 / requests_per_second).unwrap_or(MAX_INTERVAL)
        } else {
            Duration::ZERO
        };
        Self::with_interval(interval)
    }

    /// Limiter with an explicit minimum spacing between calls, at most
    /// [`MAX_INTERVAL`].
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval: interval.min(MAX_INTERVAL),
            last_dispatch: Mutex::new(None),
        }
    }

    /// Limiter that never waits.
    pub fn unlimited() -> Self {
        Self::with_interval(Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for this provider's next slot, then run `operation`.
    pub async fn throttle<F, Fut, T>(&self, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let reservation = self.reserve().await;
        if !reservation.wait.is_zero() {
            trace!(
                wait_ms = reservation.wait.as_millis() as u64,
                "throttling provider call"
            );
            tokio::time::sleep(reservation.wait).await;
        }
        reservation.commit();
        operation().await
    }

    /// Claim the next dispatch slot.
    async fn reserve(&self) -> Reservation<'_> {
        let mut last = self.last_dispatch.lock().await;
        let now = Instant::now();
        let previous = *last;
        let slot = match previous {
            Some(prev) => (prev + self.interval).max(now),
            None => now,
        };
        *last = Some(slot);
        Reservation {
            limiter: self,
            slot,
            previous,
            wait: slot - now,
            committed: false,
        }
    }
}

/// A claimed dispatch slot that is released again if dropped before use.
struct Reservation<'a> {
    limiter: &'a RateLimiter,
    slot: Instant,
    previous: Option<Instant>,
    wait: Duration,
    committed: bool,
}

impl Reservation<'_> {
    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        // Only the newest slot can be handed back; if the lock is busy the
        // slot is simply spent.
        if let Ok(mut last) = self.limiter.last_dispatch.try_lock()
            && *last == Some(self.slot)
        {
            trace!("releasing abandoned dispatch slot");
            *last = self.previous;
        }
    }
}
