//! Exponential backoff calculation for retry delays

use std::time::Duration;

use serde::Deserialize;

/// Largest exponent applied to the base delay; beyond this the cap wins anyway
const MAX_BACKOFF_SHIFT: u32 = 16;

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    30_000 // 30 seconds
}

/// Retry policy configuration
///
/// Doubles as the `retry` section of the application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the initial attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Upper bound for any computed delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Delay before the `attempt`-th retry (1-based).
///
/// `min(base_delay * 2^(attempt - 1), max_delay)`, with the shift saturated
/// so large attempt numbers cannot overflow. No jitter is applied.
pub fn calculate_backoff(policy: &RetryPolicy, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
    let factor = 1u64 << exponent;
    let delay_ms = policy
        .base_delay_ms
        .saturating_mul(factor)
        .min(policy.max_delay_ms);

    Duration::from_millis(delay_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(base_delay_ms: u64, max_delay_ms: u64) -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay_ms,
            max_delay_ms,
        }
    }

    #[test]
    fn test_first_attempt_is_base_delay() {
        let delay = calculate_backoff(&policy(1_000, 30_000), 1);
        assert_eq!(delay, Duration::from_millis(1_000));
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let p = policy(1_000, 30_000);
        assert_eq!(calculate_backoff(&p, 2), Duration::from_millis(2_000));
        assert_eq!(calculate_backoff(&p, 3), Duration::from_millis(4_000));
        assert_eq!(calculate_backoff(&p, 5), Duration::from_millis(16_000));
    }

    #[test]
    fn test_backoff_caps_at_max_delay() {
        let p = policy(1_000, 30_000);
        assert_eq!(calculate_backoff(&p, 10), Duration::from_millis(30_000));
    }

    #[test]
    fn test_backoff_huge_attempt_does_not_overflow() {
        let p = policy(1_000, 30_000);
        assert_eq!(calculate_backoff(&p, u32::MAX), Duration::from_millis(30_000));
    }

    #[test]
    fn test_backoff_is_deterministic() {
        let p = policy(500, 10_000);
        for attempt in 1..8 {
            assert_eq!(
                calculate_backoff(&p, attempt),
                calculate_backoff(&p, attempt)
            );
        }
    }
}
