//! One input channel, many consumers.
//!
//! Every item read from the input is cloned to each consumer registered at
//! that moment. Each delivery runs in its own short-lived writer task, so a
//! slow consumer never stalls the others. The price is that ordering is only
//! best-effort, even for a single consumer.
//!
//! When the input closes, every consumer still registered receives whatever
//! was already in flight and then sees its channel close. Consumers added
//! after that get a channel that is already closed.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Running,
    Closing,
    Closed,
}

struct OutputState<T> {
    status: Status,
    sender: Option<mpsc::Sender<T>>,
}

struct Output<T> {
    id: u64,
    state: Mutex<OutputState<T>>,
    closing: CancellationToken,
    writers: TaskTracker,
}

impl<T: Send + 'static> Output<T> {
    fn new(id: u64, sender: mpsc::Sender<T>) -> Self {
        Self {
            id,
            state: Mutex::new(OutputState {
                status: Status::Running,
                sender: Some(sender),
            }),
            closing: CancellationToken::new(),
            writers: TaskTracker::new(),
        }
    }

    fn closed(id: u64) -> Self {
        Self {
            id,
            state: Mutex::new(OutputState {
                status: Status::Closed,
                sender: None,
            }),
            closing: CancellationToken::new(),
            writers: TaskTracker::new(),
        }
    }

    fn sender_if_running(&self) -> Option<mpsc::Sender<T>> {
        let state = self.state.lock();
        match state.status {
            Status::Running => state.sender.clone(),
            Status::Closing | Status::Closed => None,
        }
    }

    fn forward(self: &Arc<Self>, item: T) {
        let output = Arc::clone(self);
        self.writers.spawn(async move {
            let Some(tx) = output.sender_if_running() else {
                return;
            };
            tokio::select! {
                _ = output.closing.cancelled() => {}
                _ = tx.send(item) => {}
            }
        });
    }

    /// Abandon in-flight deliveries, then drop the sender.
    async fn close(&self) {
        {
            let mut state = self.state.lock();
            if state.status == Status::Closed {
                return;
            }
            state.status = Status::Closing;
        }
        self.closing.cancel();
        self.finish().await;
    }

    /// Let in-flight deliveries land, then drop the sender.
    async fn finish(&self) {
        self.writers.close();
        self.writers.wait().await;

        let mut state = self.state.lock();
        state.status = Status::Closed;
        state.sender = None;
    }
}

struct Inner<T> {
    input: Mutex<Option<mpsc::Receiver<T>>>,
    outputs: RwLock<Vec<Arc<Output<T>>>>,
    buffer_size: usize,
    started: AtomicBool,
    /// Set under the registry write lock once the input has closed.
    finished: AtomicBool,
    next_id: AtomicU64,
}

/// Fans one input channel out to any number of consumers.
pub struct FanOut<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for FanOut<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> FanOut<T> {
    /// Each consumer gets a channel of capacity `buffer_size` (at least 1).
    pub fn new(input: mpsc::Receiver<T>, buffer_size: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                input: Mutex::new(Some(input)),
                outputs: RwLock::new(Vec::new()),
                buffer_size: buffer_size.max(1),
                started: AtomicBool::new(false),
                finished: AtomicBool::new(false),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Register a consumer. Items read before this call are not delivered to it.
    /// Once the input has closed the returned channel is already closed.
    pub fn add(&self) -> (mpsc::Receiver<T>, Detach<T>) {
        let (tx, rx) = mpsc::channel(self.inner.buffer_size);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let output = {
            let mut registry = self.inner.outputs.write();
            if self.inner.finished.load(Ordering::SeqCst) {
                Arc::new(Output::closed(id))
            } else {
                let output = Arc::new(Output::new(id, tx));
                registry.push(Arc::clone(&output));
                output
            }
        };
        (
            rx,
            Detach {
                inner: Arc::clone(&self.inner),
                output,
            },
        )
    }

    pub fn consumer_count(&self) -> usize {
        self.inner.outputs.read().len()
    }

    /// Whether the input has closed. A finished fan-out delivers nothing more.
    pub fn is_finished(&self) -> bool {
        self.inner.finished.load(Ordering::SeqCst)
    }

    /// Start forwarding. Calling this more than once has no effect.
    pub fn start(&self) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            warn!("fan-out already started");
            return;
        }
        let Some(mut input) = self.inner.input.lock().take() else {
            return;
        };
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            while let Some(item) = input.recv().await {
                let outputs = inner.outputs.read().clone();
                for output in &outputs {
                    output.forward(item.clone());
                }
            }

            let outputs = {
                let mut registry = inner.outputs.write();
                inner.finished.store(true, Ordering::SeqCst);
                std::mem::take(&mut *registry)
            };
            debug!(consumers = outputs.len(), "fan-out input closed");
            for output in outputs {
                tokio::spawn(async move { output.finish().await });
            }
        });
    }
}

/// Handle that removes a single consumer from its [`FanOut`].
pub struct Detach<T> {
    inner: Arc<Inner<T>>,
    output: Arc<Output<T>>,
}

impl<T: Send + 'static> Detach<T> {
    /// Deregister and close this consumer. In-flight deliveries are abandoned
    /// and nothing is written to the channel afterwards. Idempotent.
    pub async fn close(&self) {
        let id = self.output.id;
        self.inner.outputs.write().retain(|o| o.id != id);
        self.output.close().await;
    }
}
