// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded exponential backoff with jitter for connection establishment.

use crate::domain::{ConfigError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::time::{Duration, Instant};

/// Retry schedule for connecting to a coordination service.
///
/// Attempt `n` (1-based) that fails is followed by a delay of
/// `initial_delay_ms * 2^(n-1)` capped at `max_delay_ms`, plus up to 10% jitter.
/// Retrying stops after `max_retries` retries or once `max_elapsed_ms` has
/// passed, whichever comes first.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::RetryPolicy;
///
/// let policy: RetryPolicy = serde_yaml::from_str("initial_delay_ms: 50\nmax_retries: 2").unwrap();
/// assert_eq!(policy.max_retries, 2);
/// assert_eq!(policy.max_delay_ms, RetryPolicy::default().max_delay_ms);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Delay after the first failed attempt, in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound for a single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Overall time budget across all attempts, in milliseconds.
    pub max_elapsed_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
            max_retries: 29,
            max_elapsed_ms: 120_000,
        }
    }
}

impl RetryPolicy {
    /// A policy making a single attempt.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(0);
        }

        let exponential_base = 2u64.saturating_pow(attempt - 1);
        let capped_delay = self
            .initial_delay_ms
            .saturating_mul(exponential_base)
            .min(self.max_delay_ms);

        // Apply jitter (0 to 10% of the delay)
        let jitter_range = capped_delay / 10;
        let jitter = if jitter_range > 0 {
            rand::thread_rng().gen_range(0..jitter_range)
        } else {
            0
        };

        Duration::from_millis(capped_delay + jitter)
    }

    /// Runs `operation` until it succeeds or the policy is exhausted.
    ///
    /// `operation` receives the 1-based attempt number. Exhaustion yields
    /// [`ConfigError::RemoteConnectFailure`] carrying the last error.
    pub fn run<T, E, F>(&self, target: &str, mut operation: F) -> Result<T>
    where
        E: StdError + Send + Sync + 'static,
        F: FnMut(u32) -> std::result::Result<T, E>,
    {
        let started = Instant::now();
        let budget = Duration::from_millis(self.max_elapsed_ms);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let error = match operation(attempt) {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!("Connected to {} after {} attempts", target, attempt);
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            let delay = self.delay_for(attempt);
            let exhausted = attempt > self.max_retries || started.elapsed() + delay > budget;
            if exhausted {
                tracing::error!(
                    "Giving up on {} after {} attempts: {}",
                    target,
                    attempt,
                    error
                );
                return Err(ConfigError::RemoteConnectFailure {
                    attempts: attempt,
                    message: format!("could not connect to {}: {}", target, error),
                    source: Some(Box::new(error)),
                });
            }

            tracing::warn!(
                "Attempt {} to reach {} failed: {}; retrying in {:?}",
                attempt,
                target,
                error,
                delay
            );
            std::thread::sleep(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn fast(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            initial_delay_ms: 1,
            max_delay_ms: 2,
            max_retries,
            max_elapsed_ms: 10_000,
        }
    }

    #[test]
    fn test_delay_growth_and_cap() {
        let policy = RetryPolicy {
            initial_delay_ms: 100,
            max_delay_ms: 1_000,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(0));
        assert!(policy.delay_for(1) >= Duration::from_millis(100));
        assert!(policy.delay_for(2) >= Duration::from_millis(200));
        assert!(policy.delay_for(10) >= Duration::from_millis(1_000));
        assert!(policy.delay_for(10) < Duration::from_millis(1_100));
    }

    #[test]
    fn test_succeeds_after_failures() {
        let result = fast(5).run("test", |attempt| {
            if attempt < 3 {
                Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
            } else {
                Ok(attempt)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_exhaustion_is_connect_failure() {
        let mut calls = 0;
        let result: Result<()> = fast(2).run("test", |_| {
            calls += 1;
            Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
        });

        assert_eq!(calls, 3);
        assert!(matches!(
            result,
            Err(ConfigError::RemoteConnectFailure { attempts: 3, .. })
        ));
    }

    #[test]
    fn test_elapsed_budget_stops_retries() {
        let policy = RetryPolicy {
            initial_delay_ms: 50,
            max_delay_ms: 50,
            max_retries: 100,
            max_elapsed_ms: 10,
        };
        let result: Result<()> = policy.run("test", |_| {
            Err(io::Error::new(io::ErrorKind::TimedOut, "timeout"))
        });
        assert!(matches!(
            result,
            Err(ConfigError::RemoteConnectFailure { attempts: 1, .. })
        ));
    }
}
