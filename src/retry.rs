// src/retry.rs
//! Bounded exponential-backoff retry for the external call boundaries
//! (feed fetch, spreadsheet append, email send).

use std::future::Future;
use std::time::Duration;

use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use tracing::warn;

use crate::config::RetryConfig;
use crate::error::DigestError;

/// Run `op`, retrying transient failures up to `policy.max_retries` extra
/// attempts. Permanent failures return immediately.
pub async fn with_backoff<T, F, Fut>(
    label: &str,
    policy: RetryConfig,
    mut op: F,
) -> Result<T, DigestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DigestError>>,
{
    let initial = Duration::from_millis(policy.initial_delay_ms.max(1));
    let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
        current_interval: initial,
        initial_interval: initial,
        randomization_factor: 0.0,
        multiplier: 2.0,
        max_interval: initial * 32,
        max_elapsed_time: None,
        ..Default::default()
    };

    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                let delay = backoff.next_backoff().unwrap_or(initial);
                attempt += 1;
                warn!(
                    label,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_delay_ms: 1,
        }
    }

    fn transient() -> DigestError {
        DigestError::Sink {
            kind: "spreadsheet",
            reason: "HTTP 503".into(),
            permanent: false,
        }
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let out = with_backoff("test", fast_policy(3), move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(transient())
            } else {
                Ok(7u32)
            }
        })
        .await;
        assert_eq!(out.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let out: Result<(), _> = with_backoff("test", fast_policy(3), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(DigestError::Sink {
                kind: "email",
                reason: "HTTP 401".into(),
                permanent: true,
            })
        })
        .await;
        assert!(out.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn budget_is_bounded() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let out: Result<(), _> = with_backoff("test", fast_policy(2), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(transient())
        })
        .await;
        assert!(out.is_err());
        // initial attempt + two retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
