//! Outbound transaction reporting.

use tokio_util::sync::CancellationToken;
use tracing::info;

use corelink_types::{CorechainMsg, MsgAddOutboundTracker};

use crate::constants::ADD_OUTBOUND_TRACKER_GAS_LIMIT;
use crate::{ClientError, CorechainClient};

/// What to do after broadcasting an outbound transaction to an external chain
/// failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastErrorAction {
    /// Try the broadcast again.
    pub retry: bool,
    /// Report the transaction hash to the outbound tracker anyway.
    pub report: bool,
}

/// Classify an external chain's broadcast error message.
pub fn classify_outbound_broadcast_error(message: &str) -> BroadcastErrorAction {
    if message.contains("nonce too low") || message.contains("replacement transaction underpriced")
    {
        return BroadcastErrorAction {
            retry: false,
            report: false,
        };
    }
    // The transaction is already in the external mempool.
    if message.contains("already known") {
        return BroadcastErrorAction {
            retry: false,
            report: true,
        };
    }
    BroadcastErrorAction {
        retry: true,
        report: false,
    }
}

impl CorechainClient {
    /// Report an outbound transaction hash for `(chain_id, nonce)`.
    ///
    /// Returns an empty hash without broadcasting when the tracker already
    /// lists `tx_hash`.
    pub async fn add_outbound_tracker(
        &self,
        token: &CancellationToken,
        chain_id: i64,
        nonce: u64,
        tx_hash: &str,
    ) -> Result<String, ClientError> {
        let tracker = self.outbound_tracker(token, chain_id, nonce).await?;
        if tracker.is_some_and(|t| t.contains(tx_hash)) {
            info!(chain_id, nonce, tx_hash, "outbound tracker already has hash");
            return Ok(String::new());
        }

        let msg = CorechainMsg::AddOutboundTracker(MsgAddOutboundTracker {
            creator: self.operator_address(),
            chain_id,
            nonce,
            tx_hash: tx_hash.to_owned(),
        });
        self.post_message(
            token,
            ADD_OUTBOUND_TRACKER_GAS_LIMIT,
            msg,
            "unable to broadcast outbound tracker",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_too_low_is_dropped() {
        let action = classify_outbound_broadcast_error("nonce too low: address 0xabc");
        assert_eq!(action, BroadcastErrorAction { retry: false, report: false });
    }

    #[test]
    fn underpriced_replacement_is_dropped() {
        let action = classify_outbound_broadcast_error("replacement transaction underpriced");
        assert!(!action.retry && !action.report);
    }

    #[test]
    fn already_known_is_reported() {
        let action = classify_outbound_broadcast_error("already known");
        assert_eq!(action, BroadcastErrorAction { retry: false, report: true });
    }

    #[test]
    fn anything_else_is_retried() {
        let action = classify_outbound_broadcast_error("connection refused");
        assert_eq!(action, BroadcastErrorAction { retry: true, report: false });
    }
}
