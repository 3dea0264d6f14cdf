//! The expiry tick source.

use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// A fixed-period timer driving generation rotations.
///
/// Wraps a tokio [`Interval`] configured to *skip* missed ticks: if the
/// control task falls behind (or the process is suspended), the timer fires
/// once at the next period boundary instead of replaying a catch-up cascade
/// of rotations. A burst of rotations would wipe generations that never got
/// their full period of residency.
pub(crate) struct ExpiryTimer {
    interval: Interval,
}

impl ExpiryTimer {
    /// Creates a timer firing every `period`. The first tick completes one
    /// full period after creation, not immediately.
    pub(crate) fn new(period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // Interval's first tick resolves instantly; burn it so rotation one
        // happens a full period after the cache opens.
        interval.reset();
        Self { interval }
    }

    /// Completes at the next period boundary.
    pub(crate) async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, timeout};

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_waits_a_full_period() {
        let mut timer = ExpiryTimer::new(Duration::from_secs(5));

        // Nothing before the period elapses.
        let early = timeout(Duration::from_secs(4), timer.tick()).await;
        assert!(early.is_err());

        // The boundary arrives within the next second.
        let on_time = timeout(Duration::from_secs(2), timer.tick()).await;
        assert!(on_time.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missed_ticks_are_skipped_not_replayed() {
        let mut timer = ExpiryTimer::new(Duration::from_secs(5));

        // Sleep through several periods without ticking.
        advance(Duration::from_secs(17)).await;

        // One catch-up tick fires...
        timeout(Duration::from_secs(1), timer.tick())
            .await
            .expect("overdue tick should fire");

        // ...but the backlog does not: the next tick waits for a boundary.
        let burst = timeout(Duration::from_secs(2), timer.tick()).await;
        assert!(burst.is_err());
    }
}
