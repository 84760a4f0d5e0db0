use std::future::Future;

use backoff::backoff::Backoff;
use tracing::debug;

use corelink_utils::format_duration;

use crate::context::is_context_error;
use crate::error::RetryError;
use crate::policy::default_backoff;

/// Tag `err` as retryable.
pub fn retryable<E>(err: E) -> backoff::Error<E> {
    backoff::Error::transient(err)
}

/// Tag `err` as fatal. A bare `E` converted through `?` is fatal as well.
pub fn fatal<E>(err: E) -> backoff::Error<E> {
    backoff::Error::permanent(err)
}

/// Run `op` with the default policy until it succeeds, fails fatally, or the
/// retry budget is spent.
pub async fn retry<T, E, F, Fut>(op: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, backoff::Error<E>>>,
    E: std::error::Error + 'static,
{
    retry_with_backoff(default_backoff(), op).await
}

pub async fn retry_with_backoff<B, T, E, F, Fut>(
    mut backoff: B,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    B: Backoff,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, backoff::Error<E>>>,
    E: std::error::Error + 'static,
{
    backoff.reset();
    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        let (err, retry_after) = match op().await {
            Ok(value) => return Ok(value),
            Err(backoff::Error::Permanent(err)) => return Err(RetryError::Fatal(err)),
            Err(backoff::Error::Transient { err, retry_after }) => (err, retry_after),
        };

        if is_context_error(&err) {
            return Err(RetryError::Fatal(err));
        }

        let Some(wait) = backoff.next_backoff() else {
            return Err(RetryError::LimitExceeded {
                attempts,
                last: err,
            });
        };
        let wait = retry_after.unwrap_or(wait);

        debug!(
            attempt = attempts,
            wait = %format_duration(wait),
            error = %err,
            "retrying after transient failure"
        );
        tokio::time::sleep(wait).await;
    }
}

/// Like [`retry`], but every error except a context error is retryable.
pub async fn retry_all<T, E, F, Fut>(op: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + 'static,
{
    retry_all_with_backoff(default_backoff(), op).await
}

pub async fn retry_all_with_backoff<B, T, E, F, Fut>(
    backoff: B,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    B: Backoff,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + 'static,
{
    retry_with_backoff(backoff, || {
        let fut = op();
        async move { fut.await.map_err(retryable) }
    })
    .await
}
