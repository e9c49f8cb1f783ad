use std::time::Duration;

use bitrans_core::TranslateConfig;

/// Delay between a failed attempt and the next one.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// `base * attempt`, capped at `max`.
    Linear { base: Duration, max: Duration },
}

impl Backoff {
    /// Delay after the given 1-based failed attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed(delay) => delay,
            Backoff::Linear { base, max } => base.saturating_mul(attempt).min(max),
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::Fixed(DEFAULT_BACKOFF)
    }
}

/// Bounded retry policy for one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; at least 1.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(retries: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            backoff,
        }
    }

    /// `task_retry_threshold + 1` attempts.
    pub fn for_config(config: &TranslateConfig, backoff: Backoff) -> Self {
        Self::new(config.task_retry_threshold, backoff)
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}

/// Suspension between retries; injected so tests run without real delays.
#[async_trait::async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempts_include_first_try() {
        let config = TranslateConfig {
            task_retry_threshold: 3,
            ..TranslateConfig::default()
        };
        assert_eq!(RetryPolicy::for_config(&config, Backoff::default()).max_attempts, 4);
        assert_eq!(RetryPolicy::new(u32::MAX, Backoff::default()).max_attempts, u32::MAX);
    }

    #[test]
    fn linear_backoff_is_capped() {
        let backoff = Backoff::Linear {
            base: Duration::from_millis(500),
            max: Duration::from_secs(1),
        };
        assert_eq!(backoff.delay(1), Duration::from_millis(500));
        assert_eq!(backoff.delay(5), Duration::from_secs(1));
    }
}
