//! Cancellation and deadline errors.

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// The work was abandoned because its context ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

impl From<tokio::time::error::Elapsed> for ContextError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Self::DeadlineExceeded
    }
}

/// Whether `err`, or any error in its `source()` chain, is a context error.
pub fn is_context_error(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<ContextError>() || e.is::<tokio::time::error::Elapsed>() {
            return true;
        }
        current = e.source();
    }
    false
}

/// Fail with [`ContextError::Canceled`] once `token` has been cancelled.
pub fn ensure_active(token: &CancellationToken) -> Result<(), ContextError> {
    if token.is_cancelled() {
        Err(ContextError::Canceled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("rpc failed")]
    struct Wrapped(#[source] ContextError);

    #[derive(Debug, Error)]
    #[error("connection reset")]
    struct Transport;

    #[test]
    fn direct_context_error_detected() {
        assert!(is_context_error(&ContextError::Canceled));
        assert!(is_context_error(&ContextError::DeadlineExceeded));
    }

    #[test]
    fn wrapped_context_error_detected() {
        assert!(is_context_error(&Wrapped(ContextError::DeadlineExceeded)));
    }

    #[test]
    fn unrelated_error_not_detected() {
        assert!(!is_context_error(&Transport));
    }

    #[tokio::test]
    async fn elapsed_counts_as_deadline() {
        let elapsed = tokio::time::timeout(
            std::time::Duration::from_millis(1),
            std::future::pending::<()>(),
        )
        .await
        .unwrap_err();
        assert!(is_context_error(&elapsed));
        assert_eq!(ContextError::from(elapsed), ContextError::DeadlineExceeded);
    }

    #[test]
    fn ensure_active_follows_token() {
        let token = CancellationToken::new();
        assert!(ensure_active(&token).is_ok());
        token.cancel();
        assert_eq!(ensure_active(&token), Err(ContextError::Canceled));
    }
}
