use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use regex::Regex;
use tokio_util::sync::CancellationToken;

use corelink_fanout::FanOut;
use corelink_mempool::MessagePool;
use corelink_retry::ContextError;
use corelink_types::{AuthzSigner, BallotIndex, CorechainMsg, KeyType, NewBlockEvent};

use crate::broadcast::SequenceState;
use crate::config::ClientConfig;
use crate::constants::SEQUENCE_MISMATCH_PATTERN;
use crate::keys::Keyring;
use crate::metrics::ClientMetrics;
use crate::rpc::CorechainRpc;
use crate::ClientError;

/// Handle to the corechain for one observer. Cheap to clone; clones share
/// the broadcast lock, sequence cache, and background tasks.
#[derive(Clone)]
pub struct CorechainClient {
    pub(crate) inner: Arc<Inner>,
}

pub(crate) struct Inner {
    pub(crate) config: ClientConfig,
    pub(crate) rpc: Arc<dyn CorechainRpc>,
    pub(crate) keys: Arc<dyn Keyring>,
    pub(crate) metrics: ClientMetrics,
    /// Held for the whole of a broadcast.
    pub(crate) sequences: tokio::sync::Mutex<SequenceState>,
    /// Ballot -> highest gas limit a vote on it ran out of.
    pub(crate) out_of_gas: RwLock<HashMap<BallotIndex, u64>>,
    pub(crate) blocks: tokio::sync::Mutex<Option<FanOut<NewBlockEvent>>>,
    pub(crate) pool: MessagePool<CorechainMsg>,
    /// Parent of every detached task the client spawns.
    pub(crate) root: CancellationToken,
    pub(crate) sequence_mismatch: Regex,
}

impl CorechainClient {
    pub fn new(
        config: ClientConfig,
        rpc: Arc<dyn CorechainRpc>,
        keys: Arc<dyn Keyring>,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        let sequence_mismatch =
            Regex::new(SEQUENCE_MISMATCH_PATTERN).map_err(|e| ClientError::Config(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                rpc,
                keys,
                metrics: ClientMetrics::new(),
                sequences: tokio::sync::Mutex::new(SequenceState::default()),
                out_of_gas: RwLock::new(HashMap::new()),
                blocks: tokio::sync::Mutex::new(None),
                pool: MessagePool::new(),
                root: CancellationToken::new(),
                sequence_mismatch,
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn metrics(&self) -> &ClientMetrics {
        &self.inner.metrics
    }

    pub fn operator_address(&self) -> String {
        self.inner.keys.operator_address()
    }

    /// The grantee identity that signs messages of `key_type`.
    pub fn authz_signer(&self, key_type: KeyType) -> Result<AuthzSigner, ClientError> {
        Ok(AuthzSigner {
            key_type,
            grantee_address: self.inner.keys.grantee_address(key_type)?,
        })
    }

    /// Stop every monitor and subscription forwarder spawned by this client.
    pub fn shutdown(&self) {
        self.inner.root.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.root.is_cancelled()
    }

    /// Token for work that must outlive the call that started it.
    pub(crate) fn detached_token(&self) -> CancellationToken {
        self.inner.root.child_token()
    }
}

/// Run `fut` unless `token` is cancelled first.
pub(crate) async fn cancellable<T, F>(token: &CancellationToken, fut: F) -> Result<T, ClientError>
where
    F: Future<Output = Result<T, ClientError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ContextError::Canceled.into()),
        res = fut => res,
    }
}
