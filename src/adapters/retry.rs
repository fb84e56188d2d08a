//! Backoff schedule for guidance requests.
//!
//! Guidance is optional, so the schedule stays short: a couple of attempts
//! with a capped exponential pause between them. A failed schedule never
//! surfaces as an error; the caller falls back to deterministic text.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_GUIDANCE_ATTEMPTS: u32 = 2;
pub const DEFAULT_FIRST_PAUSE_MS: u64 = 500;
pub const DEFAULT_PAUSE_CAP_MS: u64 = 5000;
pub const DEFAULT_BACKOFF: f64 = 2.0;

/// How often and how patiently to re-send a failed guidance request
///
/// Deserialized from the `llm.retry_policy` block of the config file; any
/// omitted key keeps its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total requests allowed, first one included
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_GUIDANCE_ATTEMPTS,
            initial_delay_ms: DEFAULT_FIRST_PAUSE_MS,
            max_delay_ms: DEFAULT_PAUSE_CAP_MS,
            backoff_multiplier: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// One request, no second chance
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Pause after the given failed attempt (1-indexed), capped at `max_delay_ms`
    ///
    /// A multiplier below 1.0 is treated as 1.0 so pauses never shrink.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let cap_ms = self.max_delay_ms.max(self.initial_delay_ms);
        let growth = self
            .backoff_multiplier
            .max(1.0)
            .powi(attempt.saturating_sub(1).min(64) as i32);
        let millis = (self.initial_delay_ms as f64 * growth).min(cap_ms as f64);
        Duration::from_millis(millis as u64)
    }

    /// Whether another request may follow the given failed attempt
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pauses_grow_then_cap() {
        let policy = RetryPolicy {
            initial_delay_ms: 100,
            max_delay_ms: 350,
            ..RetryPolicy::default()
        };

        let pauses: Vec<u128> = (1..=4)
            .map(|attempt| policy.delay_for_attempt(attempt).as_millis())
            .collect();
        assert_eq!(pauses, vec![100, 200, 350, 350]);
    }

    #[test]
    fn test_shrinking_multiplier_is_flat() {
        let policy = RetryPolicy {
            backoff_multiplier: 0.5,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(500));
    }

    #[test]
    fn test_default_allows_one_retry() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(1));
        assert!(!policy.should_retry(2));
        assert!(!RetryPolicy::none().should_retry(1));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let policy: RetryPolicy = serde_yaml::from_str("max_attempts: 4").unwrap();
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.initial_delay_ms, DEFAULT_FIRST_PAUSE_MS);
    }
}
