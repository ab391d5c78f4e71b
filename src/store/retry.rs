//! Bounded exponential backoff around store calls

use super::{StoreError, StoreResult};
use backoff::ExponentialBackoffBuilder;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Retry policy for transient store errors
///
/// Only [`StoreError::Transient`] is retried. Once `max_attempts` calls have
/// failed transiently the error becomes [`StoreError::RetriesExhausted`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub multiplier: f64,
    /// Randomization factor applied to each interval (0 disables jitter)
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            initial_interval_ms: 50,
            max_interval_ms: 2_000,
            multiplier: 2.0,
            jitter: 0.5,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn none() -> Self {
        RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        }
    }

    /// Retries with a fixed short interval, for tests and benches
    pub fn immediate(max_attempts: u32) -> Self {
        RetryPolicy {
            max_attempts,
            initial_interval_ms: 1,
            max_interval_ms: 1,
            multiplier: 1.0,
            jitter: 0.0,
        }
    }

    /// Call `op` until it succeeds, fails permanently, or the attempt bound
    /// is reached
    pub fn run<T, F>(&self, mut op: F) -> StoreResult<T>
    where
        F: FnMut() -> StoreResult<T>,
    {
        let max_attempts = self.max_attempts.max(1);
        let schedule = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(self.initial_interval_ms))
            .with_max_interval(Duration::from_millis(self.max_interval_ms))
            .with_multiplier(self.multiplier)
            .with_randomization_factor(self.jitter)
            .with_max_elapsed_time(None)
            .build();

        let mut attempts = 0u32;
        let result = backoff::retry(schedule, || {
            attempts += 1;
            match op() {
                Ok(value) => Ok(value),
                Err(e) if e.is_transient() && attempts < max_attempts => {
                    warn!("Attempt {}/{} failed: {}", attempts, max_attempts, e);
                    Err(backoff::Error::transient(e))
                }
                Err(e) if e.is_transient() => Err(backoff::Error::permanent(StoreError::RetriesExhausted {
                    attempts,
                    last: e.to_string(),
                })),
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        });

        result.map_err(|e| match e {
            backoff::Error::Permanent(e) => e,
            backoff::Error::Transient { err, .. } => err,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_succeeds_after_transient_failures() {
        let policy = RetryPolicy::immediate(3);
        let mut calls = 0;
        let result = policy.run(|| {
            calls += 1;
            if calls < 3 {
                Err(StoreError::Transient("busy".into()))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result, Ok(3));
    }

    #[test]
    fn test_exhaustion_is_permanent() {
        let policy = RetryPolicy::immediate(2);
        let mut calls = 0;
        let result: StoreResult<()> = policy.run(|| {
            calls += 1;
            Err(StoreError::Transient("busy".into()))
        });
        assert_eq!(calls, 2);
        match result {
            Err(StoreError::RetriesExhausted { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_permanent_is_not_retried() {
        let policy = RetryPolicy::immediate(5);
        let mut calls = 0;
        let result: StoreResult<()> = policy.run(|| {
            calls += 1;
            Err(StoreError::Permanent("constraint violated".into()))
        });
        assert_eq!(calls, 1);
        assert_eq!(result, Err(StoreError::Permanent("constraint violated".into())));
    }

    #[test]
    fn test_zero_attempts_means_one() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::immediate(1)
        };
        let mut calls = 0;
        let _ = policy.run(|| -> StoreResult<()> {
            calls += 1;
            Err(StoreError::Transient("busy".into()))
        });
        assert_eq!(calls, 1);
    }
}
