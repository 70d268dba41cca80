//! Retry orchestration around fallible async operations

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;

use super::backoff::{calculate_backoff, RetryPolicy};

/// Why a retried operation did not produce a value
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed; carries the final attempt's error verbatim
    #[error("retries exhausted: {0}")]
    Exhausted(E),

    /// A shutdown signal arrived while waiting for the next attempt
    #[error("operation cancelled while waiting to retry")]
    Cancelled,
}

impl<E> RetryError<E> {
    /// The final attempt's error, if this is an exhaustion
    pub fn into_inner(self) -> Option<E> {
        match self {
            RetryError::Exhausted(e) => Some(e),
            RetryError::Cancelled => None,
        }
    }
}

/// Runs an async operation up to `max_retries + 1` times with exponential
/// backoff between attempts.
///
/// The wait between attempts is a non-blocking timer; with a cancel receiver
/// attached, a shutdown signal aborts the pending wait and no further attempt
/// is started.
pub struct Retrier {
    policy: RetryPolicy,
    cancel: Option<broadcast::Receiver<()>>,
}

impl Retrier {
    /// Create a retrier without cancellation
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            cancel: None,
        }
    }

    /// Create a retrier whose backoff waits abort when `cancel` fires
    pub fn with_cancel(policy: RetryPolicy, cancel: broadcast::Receiver<()>) -> Self {
        Self {
            policy,
            cancel: Some(cancel),
        }
    }

    /// Run `operation` until it succeeds, attempts are exhausted, or the
    /// retrier is cancelled. Intermediate failures are logged, not surfaced.
    pub async fn run<F, Fut, T, E>(
        &mut self,
        operation_name: &str,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt: u32 = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt > self.policy.max_retries => {
                    tracing::error!(
                        operation = operation_name,
                        max_retries = self.policy.max_retries,
                        error = %e,
                        "All retry attempts failed"
                    );
                    return Err(RetryError::Exhausted(e));
                }
                Err(e) => {
                    let delay = calculate_backoff(&self.policy, attempt);
                    tracing::warn!(
                        operation = operation_name,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Attempt failed, waiting before retry"
                    );
                    self.wait(operation_name, delay).await?;
                    attempt += 1;
                }
            }
        }
    }

    async fn wait<E>(&mut self, operation_name: &str, delay: Duration) -> Result<(), RetryError<E>> {
        match self.cancel.as_mut() {
            Some(cancel) => {
                tokio::select! {
                    _ = cancel.recv() => {
                        tracing::warn!(
                            operation = operation_name,
                            "Cancelled while waiting to retry"
                        );
                        Err(RetryError::Cancelled)
                    }
                    _ = tokio::time::sleep(delay) => Ok(()),
                }
            }
            None => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay_ms: 20,
            max_delay_ms: 200,
        }
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let mut retrier = Retrier::new(fast_policy(3));
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<u32, RetryError<String>> = retrier
            .run("test_op", move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::Relaxed);
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_success_after_failures_waits_backoff() {
        let mut retrier = Retrier::new(fast_policy(3));
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let start = Instant::now();
        let result: Result<&str, RetryError<String>> = retrier
            .run("test_op", move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::Relaxed) < 2 {
                        Err("boom".to_string())
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::Relaxed), 3);
        // Two waits: 20ms then 40ms
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_exhaustion_preserves_final_error() {
        let mut retrier = Retrier::new(fast_policy(2));
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), RetryError<String>> = retrier
            .run("test_op", move || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
                    Err(format!("failure {}", n))
                }
            })
            .await;

        // max_retries = 2 means 3 attempts total; the last error comes back as-is
        assert_eq!(calls.load(Ordering::Relaxed), 3);
        match result {
            Err(RetryError::Exhausted(e)) => assert_eq!(e, "failure 3"),
            other => panic!("expected exhaustion, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_cancel_aborts_pending_wait() {
        let (cancel_tx, cancel_rx) = broadcast::channel(1);
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay_ms: 5_000,
            max_delay_ms: 30_000,
        };
        let mut retrier = Retrier::with_cancel(policy, cancel_rx);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let handle = tokio::spawn(async move {
            retrier
                .run("test_op", move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::Relaxed);
                        Err::<(), _>("always fails".to_string())
                    }
                })
                .await
        });

        // Let the first attempt fail and the backoff wait begin
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel_tx.send(()).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("cancellation should end the run promptly")
            .expect("task should not panic");

        assert!(matches!(result, Err(RetryError::Cancelled)));
        // The next attempt never started
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_into_inner() {
        let exhausted: RetryError<&str> = RetryError::Exhausted("e");
        assert_eq!(exhausted.into_inner(), Some("e"));

        let cancelled: RetryError<&str> = RetryError::Cancelled;
        assert_eq!(cancelled.into_inner(), None);
    }
}
