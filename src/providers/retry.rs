// Retry logic with exponential backoff

use anyhow::Result;
use std::time::Duration;
use tokio::time::sleep;

use crate::errors::GenerationError;

const BASE_DELAY_MS: u64 = 1000;

/// Execute `f`, retrying up to `max_retries` more times with exponential backoff.
///
/// Client errors (4xx other than 429) are returned immediately: repeating the
/// same request cannot fix them.
pub async fn with_retry<F, Fut, T>(max_retries: u32, f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt >= max_retries || !is_retryable(&e) {
                    return Err(e);
                }

                let delay = Duration::from_millis(BASE_DELAY_MS * 2u64.pow(attempt));
                attempt += 1;
                tracing::warn!(
                    "Request failed (attempt {}/{}), retrying in {:?}: {}",
                    attempt,
                    max_retries + 1,
                    delay,
                    e
                );
                sleep(delay).await;
            }
        }
    }
}

fn is_retryable(error: &anyhow::Error) -> bool {
    match error.downcast_ref::<GenerationError>() {
        Some(GenerationError::Status { status, .. }) => {
            *status == 429 || !(400..500).contains(status)
        }
        Some(GenerationError::Structured { .. }) | Some(GenerationError::NoHumanMessage) => false,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn status_error(status: u16) -> anyhow::Error {
        GenerationError::Status {
            provider: "test".to_string(),
            status,
            body: String::new(),
        }
        .into()
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry(3, || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(status_error(503))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(2, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(status_error(500))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(0, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(anyhow::anyhow!("connection reset"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(3, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(status_error(401))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limits_are_retried() {
        let calls = AtomicU32::new(0);
        let _: Result<()> = with_retry(1, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(status_error(429))
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
