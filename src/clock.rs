use std::time::Duration;

use static_assertions::const_assert;
use tokio::time::Instant;

/// Tick rate of the node: 100 Hz, a 10 ms tick.
pub const TICK_HZ: u64 = 100;
pub const TICK_MS: u64 = 1000 / TICK_HZ;
pub const TICK_DURATION: Duration = Duration::from_millis(TICK_MS);

// The tick must divide a millisecond grid exactly or tick deltas drift.
const_assert!(1000 % TICK_HZ == 0);
const_assert!(TICK_MS > 0);

/// Monotonic tick counter.
///
/// Wraps the runtime's monotonic clock so that all cycle timing is expressed
/// in whole ticks, the same unit the deadline thresholds are configured in.
/// Copies of a `TickClock` share the same epoch.
#[derive(Debug, Clone, Copy)]
pub struct TickClock {
    epoch: Instant,
}

impl TickClock {
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Ticks elapsed since the clock was started.
    pub fn now_ticks(&self) -> u64 {
        let elapsed_ms = self.epoch.elapsed().as_millis() as u64;
        elapsed_ms / TICK_MS
    }
}

/// Convert a duration to whole ticks, truncating sub-tick remainder.
pub fn duration_to_ticks(duration: Duration) -> u64 {
    duration.as_millis() as u64 / TICK_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_conversion() {
        assert_eq!(duration_to_ticks(Duration::from_millis(0)), 0);
        assert_eq!(duration_to_ticks(Duration::from_millis(9)), 0);
        assert_eq!(duration_to_ticks(Duration::from_millis(10)), 1);
        assert_eq!(duration_to_ticks(Duration::from_millis(100)), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_counter_advances_with_time() {
        let clock = TickClock::start();
        assert_eq!(clock.now_ticks(), 0);

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(clock.now_ticks(), 10);

        tokio::time::advance(Duration::from_millis(65)).await;
        assert_eq!(clock.now_ticks(), 16);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_copies_share_epoch() {
        let clock = TickClock::start();
        let copy = clock;

        tokio::time::advance(Duration::from_millis(50)).await;
        assert_eq!(clock.now_ticks(), copy.now_ticks());
    }
}
