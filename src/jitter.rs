use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the execution-jitter injector.
///
/// Mirrors the demo scenario this node simulates: roughly one cycle in
/// `inverse_rate` is stretched by `stall` so the deadline monitor has
/// something to report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JitterConfig {
    pub enabled: bool,
    /// Average cycles between stalls; 0 disables injection.
    pub inverse_rate: u32,
    pub stall: Duration,
}

impl JitterConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            inverse_rate: 0,
            stall: Duration::ZERO,
        }
    }
}

/// Probabilistic stall injector driven by a deterministic LCG.
#[derive(Debug)]
pub struct JitterInjector {
    config: JitterConfig,
    rng_state: u64,
}

impl JitterInjector {
    pub fn new(config: JitterConfig) -> Self {
        Self {
            config,
            rng_state: 0x1234_5678_9ABC_DEF0, // Fixed seed for deterministic behavior
        }
    }

    /// Roll once per cycle; returns the stall to apply, if any.
    pub fn maybe_stall(&mut self) -> Option<Duration> {
        if !self.config.enabled || self.config.inverse_rate == 0 {
            return None;
        }

        if self.next_random() % u64::from(self.config.inverse_rate) == 0 {
            Some(self.config.stall)
        } else {
            None
        }
    }

    fn next_random(&mut self) -> u64 {
        // Linear Congruential Generator: X(n+1) = (aX(n) + c) mod m
        // Using parameters from Numerical Recipes
        self.rng_state = self.rng_state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.rng_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_injector_never_stalls() {
        let mut injector = JitterInjector::new(JitterConfig::disabled());
        for _ in 0..1000 {
            assert_eq!(injector.maybe_stall(), None);
        }
    }

    #[test]
    fn test_rate_one_always_stalls() {
        let mut injector = JitterInjector::new(JitterConfig {
            enabled: true,
            inverse_rate: 1,
            stall: Duration::from_millis(60),
        });
        for _ in 0..10 {
            assert_eq!(injector.maybe_stall(), Some(Duration::from_millis(60)));
        }
    }

    #[test]
    fn test_zero_rate_never_stalls() {
        let mut injector = JitterInjector::new(JitterConfig {
            enabled: true,
            inverse_rate: 0,
            stall: Duration::from_millis(60),
        });
        assert_eq!(injector.maybe_stall(), None);
    }

    #[test]
    fn test_sequence_is_deterministic() {
        let config = JitterConfig {
            enabled: true,
            inverse_rate: 50,
            stall: Duration::from_millis(60),
        };
        let mut a = JitterInjector::new(config);
        let mut b = JitterInjector::new(config);

        for _ in 0..500 {
            assert_eq!(a.maybe_stall(), b.maybe_stall());
        }
    }
}
