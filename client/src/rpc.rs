//! The consensus-chain RPC surface the client consumes.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use corelink_retry::ContextError;
use corelink_types::{
    AccountInfo, BallotIndex, BroadcastResponse, Keygen, NewBlockEvent, OperationalFlags,
    OutboundTracker, SignedTx, TssInfo, TxResult,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    #[error("corechain unavailable: {0}")]
    Unavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Context(#[source] ContextError),
}

impl From<ContextError> for RpcError {
    fn from(e: ContextError) -> Self {
        Self::Context(e)
    }
}

/// Queries and submission endpoints of the corechain node.
#[async_trait]
pub trait CorechainRpc: Send + Sync {
    /// Whether `voter` already has a vote recorded in `ballot`.
    async fn has_voted(&self, ballot: &BallotIndex, voter: &str) -> Result<bool, RpcError>;

    /// Submit a signed transaction and wait for the mempool check only.
    async fn broadcast_tx_sync(&self, tx: SignedTx) -> Result<BroadcastResponse, RpcError>;

    /// Execution result of an included transaction.
    async fn tx_result(&self, tx_hash: &str) -> Result<TxResult, RpcError>;

    async fn account(&self, address: &str) -> Result<AccountInfo, RpcError>;

    async fn block_height(&self) -> Result<i64, RpcError>;

    /// Current base gas price, in the fee denomination's smallest unit.
    async fn base_gas_price(&self) -> Result<u128, RpcError>;

    /// Open a stream of new-block events. The stream ends when the
    /// underlying subscription drops.
    async fn subscribe_new_blocks(&self) -> Result<mpsc::Receiver<NewBlockEvent>, RpcError>;

    async fn outbound_tracker(
        &self,
        chain_id: i64,
        nonce: u64,
    ) -> Result<Option<OutboundTracker>, RpcError>;

    async fn operational_flags(&self) -> Result<OperationalFlags, RpcError>;

    async fn tss(&self) -> Result<TssInfo, RpcError>;

    async fn keygen(&self) -> Result<Keygen, RpcError>;
}
