//! Backoff policies.
//!
//! Every policy is a [`MaxRetries`] wrapper around one of the `backoff`
//! crate's schedules, so the number of waits is always bounded.

use std::time::Duration;

use backoff::backoff::{Backoff, Constant};
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

pub const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_millis(250);
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_MULTIPLIER: f64 = 1.5;
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Bounds an inner schedule to `max_retries` waits.
///
/// With `max_retries = n` a retry loop calls its callback at most `n + 1` times.
#[derive(Debug, Clone)]
pub struct MaxRetries<B> {
    inner: B,
    max_retries: u32,
    retries: u32,
}

impl<B: Backoff> MaxRetries<B> {
    pub fn new(inner: B, max_retries: u32) -> Self {
        Self {
            inner,
            max_retries,
            retries: 0,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

impl<B: Backoff> Backoff for MaxRetries<B> {
    fn next_backoff(&mut self) -> Option<Duration> {
        if self.retries >= self.max_retries {
            return None;
        }
        self.retries += 1;
        self.inner.next_backoff()
    }

    fn reset(&mut self) {
        self.retries = 0;
        self.inner.reset();
    }
}

/// Jitter-free exponential schedule: 250ms, x1.5 per step, capped at 3s, 5 retries.
pub fn default_backoff() -> MaxRetries<ExponentialBackoff> {
    exponential_backoff(
        DEFAULT_INITIAL_INTERVAL,
        DEFAULT_MAX_INTERVAL,
        DEFAULT_MAX_RETRIES,
    )
}

/// Jitter-free exponential schedule with the default multiplier.
pub fn exponential_backoff(
    initial: Duration,
    max_interval: Duration,
    max_retries: u32,
) -> MaxRetries<ExponentialBackoff> {
    let inner = ExponentialBackoffBuilder::new()
        .with_initial_interval(initial)
        .with_randomization_factor(0.0)
        .with_multiplier(DEFAULT_MULTIPLIER)
        .with_max_interval(max_interval)
        .with_max_elapsed_time(None)
        .build();
    MaxRetries::new(inner, max_retries)
}

pub fn constant_backoff(interval: Duration, max_retries: u32) -> MaxRetries<Constant> {
    MaxRetries::new(Constant::new(interval), max_retries)
}

/// Constant schedule using the default initial interval and retry count.
pub fn default_constant_backoff() -> MaxRetries<Constant> {
    constant_backoff(DEFAULT_INITIAL_INTERVAL, DEFAULT_MAX_RETRIES)
}
