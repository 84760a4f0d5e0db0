//! Supervisor for fire-and-forget background tasks.
//!
//! A task spawned through [`Work::spawn`] never takes the process down: a
//! returned error or a panic is logged once with the worker name, handed to
//! the `on_stop` hook, and then the `on_complete` hook fires.

use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info_span, Instrument, Span};

const UNKNOWN_WORKER: &str = "unknown";

/// Why a background task stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("{0}")]
    Failed(String),

    #[error("recovered from PANIC in background task: {0}")]
    Panicked(String),
}

type CompleteHook = Box<dyn FnOnce() + Send + 'static>;
type StopHook = Box<dyn FnOnce(&TaskError) + Send + 'static>;

/// Options for a background task.
#[derive(Default)]
pub struct Work {
    name: Option<String>,
    span: Option<Span>,
    on_complete: Option<CompleteHook>,
    on_stop: Option<StopHook>,
}

impl Work {
    pub fn new() -> Self {
        Self::default()
    }

    /// Worker name attached to every log line of the task.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Span the task runs in. Defaults to a `bg` span carrying the worker name.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Runs after the body finishes, on every exit path.
    pub fn on_complete(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(hook));
        self
    }

    /// Runs when the body returned an error or panicked.
    pub fn on_stop(mut self, hook: impl FnOnce(&TaskError) + Send + 'static) -> Self {
        self.on_stop = Some(Box::new(hook));
        self
    }

    /// Spawn `f(token)` on the tokio runtime.
    pub fn spawn<F, Fut, E>(self, token: CancellationToken, f: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let Work {
            name,
            span,
            on_complete,
            on_stop,
        } = self;
        let name = name.unwrap_or_else(|| UNKNOWN_WORKER.to_owned());
        let span = span.unwrap_or_else(|| info_span!("bg", worker = %name));

        tokio::spawn(
            async move {
                let outcome = AssertUnwindSafe(async move { f(token).await })
                    .catch_unwind()
                    .await;

                let failure = match outcome {
                    Ok(Ok(())) => None,
                    Ok(Err(e)) => Some(TaskError::Failed(e.to_string())),
                    Err(panic) => Some(TaskError::Panicked(panic_message(panic.as_ref()))),
                };

                if let Some(err) = failure {
                    error!(worker = %name, error = %err, "background task failed");
                    if let Some(hook) = on_stop {
                        hook(&err);
                    }
                }
                if let Some(hook) = on_complete {
                    hook();
                }
            }
            .instrument(span),
        );
    }
}

/// Spawn `f(token)` with default options.
pub fn work<F, Fut, E>(token: CancellationToken, f: F)
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    Work::new().spawn(token, f)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
