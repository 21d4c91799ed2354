//! # Bounded retry combinator.
//!
//! [`retry`] runs an async operation until it succeeds or the [`RetryPolicy`]
//! attempt budget is spent, sleeping [`BackoffPolicy::next`] between attempts.
//!
//! ```text
//! attempt 1 ──► op(1) ── Ok ─────────────────────────────► Ok(value)
//!                  └──── Err(e1) ─► notify(1, e1, delay) ─► sleep
//! attempt 2 ──► op(2) ── Err(e2) ─► ...
//! attempt N ──► op(N) ── Err(eN) ─► notify(N, eN, None) ─► Err(RetryExhausted { last: eN })
//! ```
//!
//! ## Rules
//! - At least one attempt is always made (`attempts = 0` behaves as `1`).
//! - The loop is bounded: at most `attempts` calls, `attempts - 1` sleeps.
//! - On exhaustion the **last** error is returned unchanged.

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::policies::{BackoffPolicy, JitterPolicy};

/// Attempt budget and delay schedule for [`retry`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first one).
    pub attempts: u32,
    /// Delay between attempts; attempt `n` (1-based) waits `backoff.next(n - 1)`.
    pub backoff: BackoffPolicy,
}

impl Default for RetryPolicy {
    /// 10 attempts, 100ms doubling up to 5s, equal jitter.
    fn default() -> Self {
        Self {
            attempts: 10,
            backoff: BackoffPolicy {
                first: Duration::from_millis(100),
                max: Duration::from_secs(5),
                factor: 2.0,
                jitter: JitterPolicy::Equal,
            },
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given attempt budget and backoff.
    pub fn new(attempts: u32, backoff: BackoffPolicy) -> Self {
        Self { attempts, backoff }
    }

    /// Attempt budget clamped to at least one.
    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.attempts.max(1)
    }

    /// Upper bound of the total time spent sleeping between attempts.
    pub fn worst_case_delay(&self) -> Duration {
        let sleeps = self.max_attempts() - 1;
        self.backoff.max.saturating_mul(sleeps)
    }
}

/// Returned by [`retry`] when every attempt failed.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    /// Number of attempts made.
    pub attempts: u32,
    /// Error returned by the final attempt.
    pub last: E,
}

impl<E> RetryExhausted<E> {
    /// Returns the last error.
    pub fn into_last(self) -> E {
        self.last
    }
}

impl<E: fmt::Display> fmt::Display for RetryExhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gave up after {} attempts: {}", self.attempts, self.last)
    }
}

impl<E: Error + 'static> Error for RetryExhausted<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.last)
    }
}

/// Retries `op` under `policy`, retrying every error.
///
/// `notify(attempt, &err, next_delay)` is called after each failed attempt;
/// `next_delay` is `None` when no further attempt will be made.
pub async fn retry<T, E, F, Fut, N>(
    policy: &RetryPolicy,
    op: F,
    notify: N,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    N: FnMut(u32, &E, Option<Duration>),
{
    retry_if(policy, op, |_| true, notify).await
}

/// Like [`retry`], but stops early when `retryable` rejects an error.
pub async fn retry_if<T, E, F, Fut, R, N>(
    policy: &RetryPolicy,
    mut op: F,
    retryable: R,
    mut notify: N,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    N: FnMut(u32, &E, Option<Duration>),
{
    let budget = policy.max_attempts();
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let err = match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if attempt >= budget || !retryable(&err) {
            notify(attempt, &err, None);
            return Err(RetryExhausted {
                attempts: attempt,
                last: err,
            });
        }

        let delay = policy.backoff.next(attempt - 1);
        notify(attempt, &err, Some(delay));
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, BackoffPolicy::constant(Duration::from_millis(10)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_nth_attempt() {
        let calls = Cell::new(0u32);
        let res: Result<&str, RetryExhausted<String>> = retry(
            &fast(5),
            |attempt| {
                calls.set(calls.get() + 1);
                async move {
                    if attempt < 3 {
                        Err(format!("boom #{attempt}"))
                    } else {
                        Ok("done")
                    }
                }
            },
            |_, _, _| {},
        )
        .await;

        assert_eq!(res.ok(), Some("done"));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let calls = Cell::new(0u32);
        let res: Result<(), _> = retry(
            &fast(4),
            |attempt| {
                calls.set(calls.get() + 1);
                async move { Err(format!("fail #{attempt}")) }
            },
            |_, _, _| {},
        )
        .await;

        let err = res.err().map(RetryExhausted::into_last);
        assert_eq!(err.as_deref(), Some("fail #4"));
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_runs_once() {
        let calls = Cell::new(0u32);
        let res: Result<(), RetryExhausted<&str>> = retry(
            &fast(0),
            |_| {
                calls.set(calls.get() + 1);
                async { Err("nope") }
            },
            |_, _, _| {},
        )
        .await;

        assert_eq!(res.err().map(|e| e.attempts), Some(1));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_notify_reports_delays() {
        let mut seen = Vec::new();
        let _ = retry(
            &fast(3),
            |_| async { Err::<(), _>("x") },
            |attempt, _, delay| seen.push((attempt, delay)),
        )
        .await;

        assert_eq!(
            seen,
            vec![
                (1, Some(Duration::from_millis(10))),
                (2, Some(Duration::from_millis(10))),
                (3, None),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_if_stops_on_permanent_error() {
        let calls = Cell::new(0u32);
        let res: Result<(), _> = retry_if(
            &fast(10),
            |_| {
                calls.set(calls.get() + 1);
                async { Err("permanent") }
            },
            |e: &&str| *e != "permanent",
            |_, _, _| {},
        )
        .await;

        assert!(res.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_worst_case_delay() {
        let policy = RetryPolicy::new(
            4,
            BackoffPolicy {
                first: Duration::from_millis(100),
                max: Duration::from_secs(1),
                factor: 2.0,
                jitter: JitterPolicy::None,
            },
        );
        assert_eq!(policy.worst_case_delay(), Duration::from_secs(3));
    }
}
