//! Signing and submission of authorized transactions.
//!
//! Each key type has its own corechain account, and therefore its own
//! sequence. The client caches `(account_number, sequence)` per key type and
//! increments the sequence locally after every accepted broadcast, so
//! consecutive broadcasts within one block never wait for the chain to catch
//! up. The cache is refreshed whenever a new block is seen, keeping the larger
//! of the local and on-chain sequence.

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use corelink_retry::{ensure_active, retry_all_with_backoff};
use corelink_types::{AccountInfo, AuthzEnvelope, AuthzSigner, Coin, KeyType, UnsignedTx};

use crate::client::cancellable;
use crate::constants::{CODE_SEQUENCE_MISMATCH, FEE_MARGIN_DENOMINATOR, FEE_MARGIN_NUMERATOR};
use crate::{ClientError, CorechainClient};

#[derive(Debug, Default)]
pub(crate) struct SequenceState {
    pub(crate) last_height: i64,
    pub(crate) accounts: HashMap<KeyType, AccountInfo>,
}

impl CorechainClient {
    /// Sign and submit `envelope` once, returning the transaction hash.
    pub async fn broadcast(
        &self,
        token: &CancellationToken,
        gas_limit: u64,
        envelope: &AuthzEnvelope,
        signer: &AuthzSigner,
    ) -> Result<String, ClientError> {
        self.broadcast_once(token, gas_limit, envelope, signer, None)
            .await
    }

    /// [`broadcast`](Self::broadcast) under the configured retry policy.
    pub(crate) async fn broadcast_with_retry(
        &self,
        token: &CancellationToken,
        gas_limit: u64,
        envelope: &AuthzEnvelope,
        signer: &AuthzSigner,
        min_gas_price: Option<u128>,
        context: &'static str,
    ) -> Result<String, ClientError> {
        retry_all_with_backoff(self.inner.config.broadcast_backoff(), move || {
            self.broadcast_once(token, gas_limit, envelope, signer, min_gas_price)
        })
        .await
        .map_err(|e| ClientError::retry(context, e))
    }

    async fn broadcast_once(
        &self,
        token: &CancellationToken,
        gas_limit: u64,
        envelope: &AuthzEnvelope,
        signer: &AuthzSigner,
        min_gas_price: Option<u128>,
    ) -> Result<String, ClientError> {
        ensure_active(token)?;
        let mut guard = cancellable(token, async {
            Ok::<_, ClientError>(self.inner.sequences.lock().await)
        })
        .await?;
        let state = &mut *guard;
        let rpc = &self.inner.rpc;

        // Nothing below is cancelled once signing starts, so an accepted
        // transaction always advances the cached sequence.
        let (account, base_gas_price) = cancellable(token, async {
            let height = rpc.block_height().await?;
            if height > state.last_height || !state.accounts.contains_key(&signer.key_type) {
                let fresh = rpc.account(&signer.grantee_address).await?;
                let cached = state.accounts.entry(signer.key_type).or_insert(fresh);
                cached.account_number = fresh.account_number;
                cached.sequence = cached.sequence.max(fresh.sequence);
                state.last_height = state.last_height.max(height);
                debug!(
                    key_type = %signer.key_type,
                    height,
                    sequence = cached.sequence,
                    "refreshed account sequence"
                );
            }
            let account = state.accounts[&signer.key_type];
            let base = rpc.base_gas_price().await?;
            Ok::<_, ClientError>((account, min_gas_price.map_or(base, |floor| base.max(floor))))
        })
        .await?;

        let tx = UnsignedTx {
            chain_id: self.inner.config.chain_id.clone(),
            account_number: account.account_number,
            sequence: account.sequence,
            gas_limit,
            fee: Coin {
                denom: self.inner.config.fee_denom.clone(),
                amount: self.fee_amount(gas_limit, base_gas_price),
            },
            memo: String::new(),
            body: envelope.clone(),
        };
        let signed = self.inner.keys.sign(&tx, signer.key_type)?;

        let response = match rpc.broadcast_tx_sync(signed).await {
            Ok(response) => response,
            Err(e) => {
                self.inner.metrics.broadcasts_failed.inc();
                return Err(e.into());
            }
        };

        if response.code == 0 {
            if let Some(cached) = state.accounts.get_mut(&signer.key_type) {
                cached.sequence += 1;
            }
            self.inner.metrics.broadcasts_submitted.inc();
            debug!(tx_hash = %response.tx_hash, sequence = account.sequence, "broadcast accepted");
            return Ok(response.tx_hash);
        }

        self.inner.metrics.broadcasts_failed.inc();
        if response.code == CODE_SEQUENCE_MISMATCH {
            if let Some(expected) = self.expected_sequence(&response.raw_log) {
                if let Some(cached) = state.accounts.get_mut(&signer.key_type) {
                    cached.sequence = expected;
                }
                self.inner.metrics.sequence_resets.inc();
                warn!(
                    key_type = %signer.key_type,
                    used = account.sequence,
                    expected,
                    "reset account sequence after mismatch"
                );
            }
        }
        Err(ClientError::BroadcastRejected {
            code: response.code,
            raw_log: response.raw_log,
        })
    }

    /// `gas_limit × base × reduction_rate × 1.5`, truncated.
    pub(crate) fn fee_amount(&self, gas_limit: u64, base_gas_price: u128) -> u128 {
        let bps = u128::from(self.inner.config.gas_price_reduction_rate_bps);
        u128::from(gas_limit)
            .saturating_mul(base_gas_price)
            .saturating_mul(bps)
            .saturating_mul(FEE_MARGIN_NUMERATOR)
            / (10_000 * FEE_MARGIN_DENOMINATOR)
    }

    fn expected_sequence(&self, raw_log: &str) -> Option<u64> {
        let caps = self.inner.sequence_mismatch.captures(raw_log)?;
        caps.get(1)?.as_str().parse().ok()
    }
}
