//! Exponential backoff with jitter for client initialization.

use std::time::Duration;

use rand::Rng;

use crate::config::SessionConfig;

/// Backoff policy for repeated initialization attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub max_attempts: u32,
    pub base_ms: u64,
    pub max_ms: u64,
}

impl Backoff {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            max_attempts: config.init_max_attempts.max(1),
            base_ms: config.init_base_delay_ms,
            max_ms: config.init_max_delay_ms,
        }
    }

    /// Delay to wait before `attempt` (1-based). The first attempt runs immediately.
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }

        let exponential_base = 2u64.saturating_pow(attempt - 2);
        let capped = self.base_ms.saturating_mul(exponential_base).min(self.max_ms);

        // Up to 10% jitter on top of the capped delay
        let jitter_range = capped / 10;
        let jitter = if jitter_range > 0 {
            rand::thread_rng().gen_range(0..jitter_range)
        } else {
            0
        };

        Duration::from_millis(capped + jitter)
    }
}
