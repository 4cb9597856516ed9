use serde::{Deserialize, Serialize};

use crate::clock::TickClock;

/// Outcome of comparing one cycle's elapsed ticks against its soft deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleClass {
    OnTime,
    Missed,
}

/// Classify a completed cycle. `Missed` iff `elapsed_ticks > threshold_ticks`.
///
/// Stateless by design: thresholds vary per task, so the comparison lives
/// here and the counters live with the callers.
pub fn classify(elapsed_ticks: u64, threshold_ticks: u64) -> CycleClass {
    if elapsed_ticks > threshold_ticks {
        CycleClass::Missed
    } else {
        CycleClass::OnTime
    }
}

/// Start/end tick pair measured around one task cycle.
///
/// Created fresh each iteration and discarded after classification; never
/// shared across tasks.
#[derive(Debug, Clone, Copy)]
pub struct CycleTiming {
    start_tick: u64,
    end_tick: u64,
}

impl CycleTiming {
    pub fn start(clock: &TickClock) -> Self {
        let now = clock.now_ticks();
        Self {
            start_tick: now,
            end_tick: now,
        }
    }

    pub fn stop(&mut self, clock: &TickClock) {
        self.end_tick = clock.now_ticks();
    }

    pub fn elapsed_ticks(&self) -> u64 {
        self.end_tick.saturating_sub(self.start_tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_is_strict_greater_than() {
        assert_eq!(classify(5, 5), CycleClass::OnTime);
        assert_eq!(classify(6, 5), CycleClass::Missed);
    }

    #[test]
    fn test_zero_elapsed_is_on_time() {
        assert_eq!(classify(0, 5), CycleClass::OnTime);
        assert_eq!(classify(0, 0), CycleClass::OnTime);
        assert_eq!(classify(1, 0), CycleClass::Missed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_timing_measures_tick_delta() {
        let clock = TickClock::start();
        let mut timing = CycleTiming::start(&clock);

        tokio::time::advance(std::time::Duration::from_millis(60)).await;
        timing.stop(&clock);

        assert_eq!(timing.elapsed_ticks(), 6);
        assert_eq!(classify(timing.elapsed_ticks(), 5), CycleClass::Missed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unstopped_timing_reports_zero() {
        let clock = TickClock::start();
        let timing = CycleTiming::start(&clock);

        tokio::time::advance(std::time::Duration::from_millis(100)).await;
        assert_eq!(timing.elapsed_ticks(), 0);
    }
}
