//! Shared retry policy for outbound HTTP calls.
//!
//! Every setup call (mailbox provisioning, target-site GET/POST) goes through
//! the same policy. The polling loop itself never backs off; only individual
//! requests do.

use reqwest::StatusCode;
use std::time::Duration;

use crate::config::RetryConfig;

/// Retry policy: attempt count and backoff schedule.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first try.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor applied to the previous delay after each failure.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            multiplier: config.multiplier,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Millisecond-scale delays for unit tests.
    #[cfg(test)]
    pub fn instant() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            multiplier: 2.0,
        }
    }

    /// Backoff schedule step: multiply and cap.
    fn next_delay(&self, delay: Duration) -> Duration {
        let next_ms = (delay.as_millis() as f64 * self.multiplier) as u128;
        Duration::from_millis(next_ms.min(self.max_delay.as_millis()) as u64)
    }
}

/// HTTP statuses worth retrying. Everything else is treated as a hard answer.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || matches!(
            status,
            StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_EARLY | StatusCode::TOO_MANY_REQUESTS
        )
}

/// Run `f` up to `policy.max_attempts` times with exponential backoff.
///
/// Returns the first success, or the last error once attempts are exhausted.
pub async fn retry_with_backoff<F, Fut, T, E>(policy: &RetryPolicy, f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_if(policy, f, |_| true).await
}

/// Like [`retry_with_backoff`], but only errors classified transient by
/// `is_transient` are retried; anything else returns immediately.
pub async fn retry_if<F, Fut, T, E, P>(policy: &RetryPolicy, mut f: F, is_transient: P) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut delay = policy.initial_delay;
    let mut last_err: Option<E> = None;

    for attempt in 1..=max_attempts {
        match f().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(attempt, "retry succeeded");
                }
                return Ok(value);
            }
            Err(e) => {
                if !is_transient(&e) {
                    tracing::debug!(attempt, error = %e, "non-transient error, not retrying");
                    return Err(e);
                }
                if attempt < max_attempts {
                    tracing::warn!(
                        attempt,
                        max = max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = policy.next_delay(delay);
                } else {
                    tracing::warn!(attempt, max = max_attempts, error = %e, "attempts exhausted");
                    last_err = Some(e);
                }
            }
        }
    }

    // The loop assigns last_err before falling through.
    Err(last_err.expect("retry loop ended without an error"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_attempt_success() {
        let policy = RetryPolicy::instant();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<u32, String> = retry_with_backoff(&policy, || {
            let c = counter.clone();
            async move {
                c.fetch_add(1, Ordering::Relaxed);
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_recovers_on_later_attempt() {
        let policy = RetryPolicy::instant();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<u32, String> = retry_with_backoff(&policy, || {
            let c = counter.clone();
            async move {
                let n = c.fetch_add(1, Ordering::Relaxed) + 1;
                if n < 3 {
                    Err(format!("attempt {n} failed"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_returns_last_error() {
        let policy = RetryPolicy::instant();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<u32, String> = retry_with_backoff(&policy, || {
            let c = counter.clone();
            async move {
                c.fetch_add(1, Ordering::Relaxed);
                Err("mailbox endpoint down".to_string())
            }
        })
        .await;

        assert_eq!(result.unwrap_err(), "mailbox endpoint down");
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_no_retry_is_single_attempt() {
        let policy = RetryPolicy::no_retry();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let _: Result<(), String> = retry_with_backoff(&policy, || {
            let c = counter.clone();
            async move {
                c.fetch_add(1, Ordering::Relaxed);
                Err("fail".to_string())
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_retry_if_stops_on_terminal_error() {
        let policy = RetryPolicy::instant();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), String> = retry_if(
            &policy,
            || {
                let c = counter.clone();
                async move {
                    c.fetch_add(1, Ordering::Relaxed);
                    Err("terminal: page marker gone".to_string())
                }
            },
            |e| !e.starts_with("terminal"),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::REQUEST_TIMEOUT));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::FORBIDDEN));
        assert!(!is_retryable_status(StatusCode::OK));
    }

    #[test]
    fn test_policy_from_config() {
        let config = crate::config::RetryConfig {
            max_attempts: 0,
            initial_delay_ms: 100,
            max_delay_ms: 1000,
            multiplier: 3.0,
        };
        let policy = RetryPolicy::from(&config);
        // A zero attempt count would never run the call.
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.initial_delay, Duration::from_millis(100));
        assert_eq!(policy.multiplier, 3.0);
    }

    #[test]
    fn test_backoff_schedule_multiplies_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1000),
            multiplier: 3.0,
        };
        let step1 = policy.next_delay(policy.initial_delay);
        assert_eq!(step1, Duration::from_millis(300));
        let step2 = policy.next_delay(step1);
        assert_eq!(step2, Duration::from_millis(900));
        // Capped at max_delay from here on.
        assert_eq!(policy.next_delay(step2), Duration::from_millis(1000));
    }
}
