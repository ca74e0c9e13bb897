//! Bounded retry with a fixed delay.
//!
//! Wraps a single fallible call. There is no backoff growth and no jitter:
//! attempt, wait `delay`, attempt again, up to `max_attempts` in total.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// How often and how far apart a call is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first; 0 behaves like 1.
    pub max_attempts: u32,
    /// Wait between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Retry `op` on any failure.
pub async fn retry<T, E, Op, Fut>(policy: &RetryPolicy, op: Op) -> Result<T, E>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    retry_when(policy, op, |_| true).await
}

/// Retry `op` while `should_retry` accepts the failure.
pub async fn retry_when<T, E, Op, Fut, P>(
    policy: &RetryPolicy,
    op: Op,
    should_retry: P,
) -> Result<T, E>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    retry_observed(policy, None, op, should_retry, |_, _| {}).await
}

/// Full form: `on_retry` is called with the number of the upcoming attempt
/// before each wait. If `cancel` fires while waiting, the last failure is
/// returned at once.
pub async fn retry_observed<T, E, Op, Fut, P, N>(
    policy: &RetryPolicy,
    cancel: Option<&CancellationToken>,
    mut op: Op,
    should_retry: P,
    mut on_retry: N,
) -> Result<T, E>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    N: FnMut(u32, &E),
    E: Display,
{
    let attempts = policy.attempts();
    let mut attempt = 1;
    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if attempt >= attempts || !should_retry(&err) {
            return Err(err);
        }

        warn!(
            attempt,
            max_attempts = attempts,
            "Attempt failed, retrying in {:?}: {}",
            policy.delay,
            err
        );
        attempt += 1;
        on_retry(attempt, &err);

        match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(err),
                    _ = tokio::time::sleep(policy.delay) => {}
                }
            }
            None => tokio::time::sleep(policy.delay).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(500))
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_is_attempted_max_times() {
        let calls = &AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<(), String> = retry(&policy(3), move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Err(format!("failure {}", n))
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result, Err("failure 3".to_string()));
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_is_not_retried() {
        let calls = &AtomicU32::new(0);
        let result: Result<u32, String> = retry(&policy(5), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = &AtomicU32::new(0);
        let result: Result<&str, String> = retry(&policy(3), move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err("transient".to_string())
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_means_one() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), String> = retry(&policy(0), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("nope".to_string())
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_predicate_stops_retrying() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), String> = retry_when(
            &policy(5),
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("fatal".to_string())
            },
            |e| e != "fatal",
        )
        .await;

        assert_eq!(result, Err("fatal".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_retry_sees_upcoming_attempts() {
        let mut seen = Vec::new();
        let _: Result<(), String> = retry_observed(
            &policy(3),
            None,
            || async { Err("x".to_string()) },
            |_| true,
            |attempt, _| seen.push(attempt),
        )
        .await;

        assert_eq!(seen, vec![2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_wait() {
        let token = CancellationToken::new();
        token.cancel();
        let calls = &AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<(), String> = retry_observed(
            &RetryPolicy::new(3, Duration::from_secs(60)),
            Some(&token),
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("x".to_string())
            },
            |_| true,
            |_, _| {},
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_secs(60));
    }
}
