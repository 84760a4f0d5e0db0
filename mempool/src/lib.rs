//! Pool of pending messages keyed by `(type, digest)`.
//!
//! Re-adding a message with a known digest only refreshes its gas parameters,
//! so a message keeps its place in line however often it is resubmitted.

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::Mutex;

/// A pooled message with its gas parameters.
#[derive(Debug, Clone)]
pub struct PoolMsg<P> {
    pub payload: P,
    pub msg_type: String,
    pub digest: String,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub added_at: Instant,
    seq: u64,
}

struct PoolInner<P> {
    by_type: HashMap<String, HashMap<String, PoolMsg<P>>>,
    next_seq: u64,
}

pub struct MessagePool<P> {
    inner: Mutex<PoolInner<P>>,
}

impl<P> Default for MessagePool<P> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(PoolInner {
                by_type: HashMap::new(),
                next_seq: 0,
            }),
        }
    }
}

impl<P: Clone> MessagePool<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a message, or update the gas parameters of an existing one.
    /// Returns `true` when the message was not pooled before.
    pub fn add_message(
        &self,
        payload: P,
        msg_type: impl Into<String>,
        digest: impl Into<String>,
        gas_price: u128,
        gas_limit: u64,
    ) -> bool {
        let msg_type = msg_type.into();
        let digest = digest.into();
        let mut inner = self.inner.lock();
        let seq = inner.next_seq;

        let entries = inner.by_type.entry(msg_type.clone()).or_default();
        if let Some(existing) = entries.get_mut(&digest) {
            existing.gas_price = gas_price;
            existing.gas_limit = gas_limit;
            return false;
        }
        entries.insert(
            digest.clone(),
            PoolMsg {
                payload,
                msg_type,
                digest,
                gas_limit,
                gas_price,
                added_at: Instant::now(),
                seq,
            },
        );
        inner.next_seq += 1;
        true
    }

    /// Up to `max` messages of `msg_type`, oldest first. Nothing is removed.
    pub fn get_multiple_messages(&self, msg_type: &str, max: usize) -> Vec<PoolMsg<P>> {
        let inner = self.inner.lock();
        let Some(entries) = inner.by_type.get(msg_type) else {
            return Vec::new();
        };
        let mut msgs: Vec<&PoolMsg<P>> = entries.values().collect();
        msgs.sort_by_key(|m| (m.added_at, m.seq));
        msgs.into_iter().take(max).cloned().collect()
    }

    /// Drop the given digests of `msg_type`. Returns how many were present.
    pub fn remove_messages<S: AsRef<str>>(&self, msg_type: &str, digests: &[S]) -> usize {
        let mut inner = self.inner.lock();
        let Some(entries) = inner.by_type.get_mut(msg_type) else {
            return 0;
        };
        let removed = digests
            .iter()
            .filter(|d| entries.remove(d.as_ref()).is_some())
            .count();
        if entries.is_empty() {
            inner.by_type.remove(msg_type);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().by_type.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
