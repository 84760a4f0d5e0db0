//! Read-only corechain queries, retried with the default policy.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use corelink_retry::retry_all;
use corelink_types::{Keygen, OperationalFlags, OutboundTracker, TssInfo, TxResult};

use crate::client::cancellable;
use crate::rpc::{CorechainRpc, RpcError};
use crate::{ClientError, CorechainClient};

impl CorechainClient {
    pub async fn block_height(&self, token: &CancellationToken) -> Result<i64, ClientError> {
        self.query(token, "unable to query block height", |rpc| async move {
            rpc.block_height().await
        })
        .await
    }

    pub async fn operational_flags(
        &self,
        token: &CancellationToken,
    ) -> Result<OperationalFlags, ClientError> {
        self.query(token, "unable to query operational flags", |rpc| async move {
            rpc.operational_flags().await
        })
        .await
    }

    pub async fn tss(&self, token: &CancellationToken) -> Result<TssInfo, ClientError> {
        self.query(token, "unable to query tss", |rpc| async move { rpc.tss().await })
            .await
    }

    pub async fn keygen(&self, token: &CancellationToken) -> Result<Keygen, ClientError> {
        self.query(token, "unable to query keygen", |rpc| async move {
            rpc.keygen().await
        })
        .await
    }

    pub async fn tx_result(
        &self,
        token: &CancellationToken,
        tx_hash: &str,
    ) -> Result<TxResult, ClientError> {
        self.query(token, "unable to query tx result", |rpc| {
            let tx_hash = tx_hash.to_owned();
            async move { rpc.tx_result(&tx_hash).await }
        })
        .await
    }

    pub async fn outbound_tracker(
        &self,
        token: &CancellationToken,
        chain_id: i64,
        nonce: u64,
    ) -> Result<Option<OutboundTracker>, ClientError> {
        self.query(token, "unable to query outbound tracker", |rpc| async move {
            rpc.outbound_tracker(chain_id, nonce).await
        })
        .await
    }

    async fn query<T, F, Fut>(
        &self,
        token: &CancellationToken,
        context: &'static str,
        f: F,
    ) -> Result<T, ClientError>
    where
        F: Fn(Arc<dyn CorechainRpc>) -> Fut,
        Fut: Future<Output = Result<T, RpcError>>,
    {
        retry_all(|| {
            let call = f(Arc::clone(&self.inner.rpc));
            let token = token.clone();
            async move {
                cancellable(&token, async { Ok::<_, ClientError>(call.await?) }).await
            }
        })
        .await
        .map_err(|e| ClientError::retry(context, e))
    }
}
