//! Retry pacing for the accept loop.

use std::time::Duration;

use rand::Rng;

use crate::config::BackoffConfig;

/// Counts consecutive `accept` failures and turns them into retry delays.
///
/// The delay doubles with each failure, starting at `base_ms` and capped at
/// `max_ms`, plus up to 10% random jitter. A successful accept resets it.
#[derive(Debug, Clone)]
pub struct AcceptBackoff {
    base: Duration,
    max: Duration,
    failures: u32,
}

impl AcceptBackoff {
    pub fn new(cfg: &BackoffConfig) -> Self {
        Self {
            base: Duration::from_millis(cfg.base_ms),
            max: Duration::from_millis(cfg.max_ms),
            failures: 0,
        }
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Records a failed accept and returns how long to wait before retrying.
    pub fn on_failure(&mut self) -> Duration {
        self.failures = self.failures.saturating_add(1);
        let shift = (self.failures - 1).min(31);
        let delay = self.base.saturating_mul(1u32 << shift).min(self.max);
        delay + jitter(delay)
    }

    pub fn on_success(&mut self) {
        self.failures = 0;
    }
}

fn jitter(delay: Duration) -> Duration {
    let range_ms = (delay.as_millis() / 10) as u64;
    if range_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..range_ms))
}
