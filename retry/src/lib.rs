//! Retry engine for calls against flaky remote services.
//!
//! Callbacks tag each failure as retryable ([`retryable`]) or fatal
//! ([`fatal`], or simply `?` on a bare error). Fatal errors end the loop on the
//! first failure; retryable ones are retried according to a backoff policy
//! until the policy runs out, at which point a [`RetryError::LimitExceeded`]
//! carrying the last failure is returned.
//!
//! Context errors ([`ContextError`], or anything whose `source()` chain
//! contains one) are never retried, whatever their tag.
//!
//! The `retry_all*` variants treat every error as retryable except context
//! errors, for callers that have no finer-grained signal.

pub mod context;
mod engine;
pub mod error;
pub mod policy;

pub use context::{ensure_active, is_context_error, ContextError};
pub use engine::{fatal, retry, retry_all, retry_all_with_backoff, retry_with_backoff, retryable};
pub use error::RetryError;
pub use policy::{
    constant_backoff, default_backoff, default_constant_backoff, exponential_backoff, MaxRetries,
};

/// Outcome tag of a single attempt: `Transient` is retryable, `Permanent` is fatal.
pub type AttemptError<E> = backoff::Error<E>;
