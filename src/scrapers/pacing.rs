//! Randomised courtesy delays between page loads.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Bounds for a randomised pause, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayConfig {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayConfig {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }
}

/// Sleeps for a random duration within the configured bounds.
///
/// The delays only spread load on the origin server; nothing depends on
/// their exact length.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    min: Duration,
    max: Duration,
}

impl Pacer {
    pub fn new(config: DelayConfig) -> Self {
        let min = Duration::from_millis(config.min_ms);
        let max = Duration::from_millis(config.max_ms.max(config.min_ms));
        Self { min, max }
    }

    /// A pacer that never sleeps.
    pub fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    /// Pick the next pause length.
    pub fn next_delay(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(min..=max))
    }

    pub async fn pause(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        debug!("Pausing for {:?}", delay);
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_within_bounds() {
        let pacer = Pacer::new(DelayConfig::new(10, 15));
        for _ in 0..100 {
            let d = pacer.next_delay();
            assert!(d >= Duration::from_millis(10) && d <= Duration::from_millis(15));
        }
    }

    #[test]
    fn test_inverted_bounds_use_min() {
        let pacer = Pacer::new(DelayConfig::new(20, 5));
        assert_eq!(pacer.next_delay(), Duration::from_millis(20));
    }

    #[test]
    fn test_none_is_zero() {
        assert_eq!(Pacer::none().next_delay(), Duration::ZERO);
    }
}
