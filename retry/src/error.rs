use thiserror::Error;

/// Why a retry loop gave up.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The callback failed with an error that must not be retried.
    #[error(transparent)]
    Fatal(E),

    /// Every attempt failed with a retryable error and the policy ran out.
    #[error("retry limit exceeded after {attempts} attempts: {last}")]
    LimitExceeded {
        attempts: u32,
        #[source]
        last: E,
    },
}

impl<E> RetryError<E> {
    /// The last underlying failure.
    pub fn into_inner(self) -> E {
        match self {
            Self::Fatal(e) => e,
            Self::LimitExceeded { last, .. } => last,
        }
    }

    pub fn inner(&self) -> &E {
        match self {
            Self::Fatal(e) => e,
            Self::LimitExceeded { last, .. } => last,
        }
    }

    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, Self::LimitExceeded { .. })
    }
}
