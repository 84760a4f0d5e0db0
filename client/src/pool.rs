//! Batched submission of pooled votes.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use corelink_types::{wrap_batch_with_authz, BallotIndex, CorechainMsg};

use crate::{ClientError, CorechainClient};

impl CorechainClient {
    /// Validate `msg` and hold it for the next [`flush_pooled`](Self::flush_pooled).
    /// Re-enqueueing a pending message only updates its gas parameters.
    pub fn enqueue_vote(
        &self,
        msg: CorechainMsg,
        gas_price: u128,
        gas_limit: u64,
    ) -> Result<BallotIndex, ClientError> {
        msg.validate_basic()?;
        let digest = msg.digest()?;
        let msg_type = msg.type_url();
        self.inner
            .pool
            .add_message(msg, msg_type, digest.as_str(), gas_price, gas_limit);
        self.update_pool_gauge();
        Ok(digest)
    }

    /// Broadcast up to `max` of the oldest pooled messages of `msg_type` in one
    /// transaction. Returns `None` when nothing was pooled.
    ///
    /// The gas limit is the sum of the pooled limits and the base gas price is
    /// floored at the highest pooled price. Messages leave the pool only once
    /// the broadcast succeeds.
    pub async fn flush_pooled(
        &self,
        token: &CancellationToken,
        msg_type: &str,
        max: usize,
    ) -> Result<Option<String>, ClientError> {
        let batch = self.inner.pool.get_multiple_messages(msg_type, max);
        let Some(first) = batch.first() else {
            return Ok(None);
        };
        let signer = self.authz_signer(first.payload.key_type())?;

        let gas_limit = batch
            .iter()
            .fold(0u64, |acc, m| acc.saturating_add(m.gas_limit));
        let min_gas_price = batch.iter().map(|m| m.gas_price).max();
        let digests: Vec<String> = batch.iter().map(|m| m.digest.clone()).collect();
        let envelope =
            wrap_batch_with_authz(batch.into_iter().map(|m| m.payload).collect(), &signer)?;

        let tx_hash = self
            .broadcast_with_retry(
                token,
                gas_limit,
                &envelope,
                &signer,
                min_gas_price,
                "unable to broadcast pooled messages",
            )
            .await?;

        self.inner.pool.remove_messages(msg_type, &digests);
        self.update_pool_gauge();
        debug!(tx_hash = %tx_hash, msg_type, count = digests.len(), "flushed pooled messages");
        Ok(Some(tx_hash))
    }

    pub fn pooled_len(&self) -> usize {
        self.inner.pool.len()
    }

    fn update_pool_gauge(&self) {
        let len = i64::try_from(self.inner.pool.len()).unwrap_or(i64::MAX);
        self.inner.metrics.pooled_messages.set(len);
    }
}
