// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 Singulabs bot contributors

use crate::domain::constants;
use crate::domain::error::AppError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Delay before re-running a failed attempt: `2^attempt * base + jitter`.
/// Rate limits use a smaller base than server errors.
pub fn transient_backoff(err: &AppError, attempt: usize) -> Duration {
    let base_ms = match err {
        AppError::RateLimited => constants::RATE_LIMIT_BASE_DELAY_MS,
        _ => constants::SERVER_ERROR_BASE_DELAY_MS,
    };
    let jitter_ms = rand::thread_rng().gen_range(0..constants::RETRY_JITTER_MS);
    Duration::from_millis((1u64 << attempt.min(16)) * base_ms + jitter_ms)
}

/// Retry an async operation on transient failures (429/5xx) with exponential
/// backoff. `max_retries` bounds the number of failed attempts that get
/// retried, so the operation runs at most `max_retries + 1` times and the
/// final error is re-raised unchanged. Non-transient errors propagate
/// immediately.
pub async fn retry_transient<F, Fut, T>(mut op: F, max_retries: usize) -> Result<T, AppError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_transient() && attempt < max_retries => {
                let delay = transient_backoff(&e, attempt);
                tracing::warn!(
                    target: "retry",
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    attempt = attempt + 1,
                    max_retries,
                    "Transient failure, backing off"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn rate_limit_then_success_uses_one_attempt_per_failure() {
        let counter = AtomicUsize::new(0);
        let res = retry_transient(
            |_| {
                let current = counter.fetch_add(1, Ordering::Relaxed);
                async move {
                    if current < 2 {
                        Err(AppError::RateLimited)
                    } else {
                        Ok(7u32)
                    }
                }
            },
            constants::MAX_UPLOAD_RETRIES,
        )
        .await;

        assert_eq!(res.unwrap(), 7);
        // Two failing responses observed, so three attempts total.
        assert_eq!(counter.load(Ordering::Relaxed), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn server_errors_exhaust_the_cap_after_six_attempts() {
        let counter = AtomicUsize::new(0);
        let res: Result<(), AppError> = retry_transient(
            |_| {
                counter.fetch_add(1, Ordering::Relaxed);
                async { Err(AppError::Server { status: 502 }) }
            },
            constants::MAX_UPLOAD_RETRIES,
        )
        .await;

        assert!(matches!(res, Err(AppError::Server { status: 502 })));
        assert_eq!(counter.load(Ordering::Relaxed), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn non_transient_errors_are_not_retried() {
        let counter = AtomicUsize::new(0);
        let res: Result<(), AppError> = retry_transient(
            |_| {
                counter.fetch_add(1, Ordering::Relaxed);
                async {
                    Err(AppError::Client {
                        endpoint: "/api/upload".into(),
                        status: 400,
                    })
                }
            },
            constants::MAX_UPLOAD_RETRIES,
        )
        .await;

        assert!(matches!(res, Err(AppError::Client { status: 400, .. })));
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn backoff_grows_exponentially_with_class_specific_base() {
        let rate = transient_backoff(&AppError::RateLimited, 0);
        assert!(rate >= Duration::from_millis(2_000));
        assert!(rate < Duration::from_millis(4_000));

        let server = transient_backoff(&AppError::Server { status: 500 }, 2);
        assert!(server >= Duration::from_millis(20_000));
        assert!(server < Duration::from_millis(22_000));
    }
}
