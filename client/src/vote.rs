//! Ballot votes and their result monitors.
//!
//! Inbound and outbound votes are broadcast at most once per observer and
//! ballot, then watched by a detached monitor. A vote that runs out of gas is
//! resent once with the caller's retry gas limit; the ballot is remembered so
//! later votes on it start at the higher limit, or stop altogether once even
//! that limit has failed.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn};

use corelink_bg::Work;
use corelink_retry::retry_all_with_backoff;
use corelink_types::{
    wrap_with_authz, BallotIndex, Blame, ConfirmationMode, CorechainMsg, MsgVoteBlame,
    MsgVoteBlockHeader, MsgVoteGasPrice, MsgVoteInbound, MsgVoteOutbound, MsgVoteTss,
    ReceiveStatus,
};

use crate::client::cancellable;
use crate::constants::{
    gas_price_multiplier_percent, FAILED_TO_EXECUTE, OUT_OF_GAS, POST_BLAME_DATA_GAS_LIMIT,
    POST_BLOCK_HEADER_GAS_LIMIT, POST_GAS_PRICE_GAS_LIMIT, POST_TSS_GAS_LIMIT,
};
use crate::{ClientError, CorechainClient};

/// A vote monitor that failed, reported back to the caller that posted it.
#[derive(Debug, Clone)]
pub struct MonitorError {
    pub error: String,
    pub inbound_block_height: u64,
    pub tx_hash: String,
    pub ballot_index: BallotIndex,
}

impl CorechainClient {
    /// Vote on an observed inbound transaction.
    ///
    /// Returns `(tx_hash, ballot_index)`. The hash is empty when no
    /// transaction was sent: the observer already voted, or the ballot has
    /// exhausted its gas escalation.
    pub async fn post_vote_inbound(
        &self,
        token: &CancellationToken,
        gas_limit: u64,
        retry_gas_limit: u64,
        msg: MsgVoteInbound,
    ) -> Result<(String, BallotIndex), ClientError> {
        self.post_vote_inbound_reporting(token, gas_limit, retry_gas_limit, msg, None)
            .await
    }

    /// Like [`post_vote_inbound`](Self::post_vote_inbound), with monitor
    /// failures sent to `monitor_errors`.
    pub async fn post_vote_inbound_reporting(
        &self,
        token: &CancellationToken,
        gas_limit: u64,
        retry_gas_limit: u64,
        mut msg: MsgVoteInbound,
        monitor_errors: Option<mpsc::Sender<MonitorError>>,
    ) -> Result<(String, BallotIndex), ClientError> {
        // Fast and slow observations land in the same ballot.
        msg.confirmation_mode = ConfirmationMode::Safe;
        self.post_vote(
            token,
            gas_limit,
            retry_gas_limit,
            msg.into(),
            monitor_errors,
        )
        .await
    }

    pub async fn post_vote_outbound(
        &self,
        token: &CancellationToken,
        gas_limit: u64,
        retry_gas_limit: u64,
        msg: MsgVoteOutbound,
    ) -> Result<(String, BallotIndex), ClientError> {
        self.post_vote(token, gas_limit, retry_gas_limit, msg.into(), None)
            .await
    }

    /// Poll the result of an inbound vote and react to it.
    pub async fn monitor_vote_inbound_result(
        &self,
        token: CancellationToken,
        tx_hash: String,
        retry_gas_limit: u64,
        msg: MsgVoteInbound,
    ) -> Result<(), ClientError> {
        self.monitor_vote_result(token, tx_hash, retry_gas_limit, msg.into(), None)
            .await
    }

    /// Poll the result of an outbound vote and react to it.
    pub async fn monitor_vote_outbound_result(
        &self,
        token: CancellationToken,
        tx_hash: String,
        retry_gas_limit: u64,
        msg: MsgVoteOutbound,
    ) -> Result<(), ClientError> {
        self.monitor_vote_result(token, tx_hash, retry_gas_limit, msg.into(), None)
            .await
    }

    pub async fn post_vote_gas_price(
        &self,
        token: &CancellationToken,
        chain_id: i64,
        gas_price: u64,
        priority_fee: u64,
        block_number: u64,
    ) -> Result<String, ClientError> {
        let scaled = u128::from(gas_price) * u128::from(gas_price_multiplier_percent(chain_id)) / 100;
        let msg = CorechainMsg::VoteGasPrice(MsgVoteGasPrice {
            creator: self.operator_address(),
            chain_id,
            price: u64::try_from(scaled).unwrap_or(u64::MAX),
            priority_fee,
            block_number,
        });
        self.post_message(token, POST_GAS_PRICE_GAS_LIMIT, msg, "unable to broadcast vote gas price")
            .await
    }

    pub async fn post_vote_tss(
        &self,
        token: &CancellationToken,
        tss_pubkey: String,
        keygen_height: i64,
        status: ReceiveStatus,
    ) -> Result<String, ClientError> {
        let msg = CorechainMsg::VoteTss(MsgVoteTss {
            creator: self.operator_address(),
            tss_pubkey,
            keygen_height,
            status,
        });
        self.post_message(token, POST_TSS_GAS_LIMIT, msg, "unable to broadcast vote for setting tss")
            .await
    }

    pub async fn post_vote_blame_data(
        &self,
        token: &CancellationToken,
        chain_id: i64,
        blame: Blame,
    ) -> Result<String, ClientError> {
        let msg = CorechainMsg::VoteBlame(MsgVoteBlame {
            creator: self.operator_address(),
            chain_id,
            blame,
        });
        self.post_message(token, POST_BLAME_DATA_GAS_LIMIT, msg, "unable to broadcast blame data")
            .await
    }

    pub async fn post_vote_block_header(
        &self,
        token: &CancellationToken,
        chain_id: i64,
        block_hash: Vec<u8>,
        height: i64,
        header: Vec<u8>,
    ) -> Result<String, ClientError> {
        let msg = CorechainMsg::VoteBlockHeader(MsgVoteBlockHeader {
            creator: self.operator_address(),
            chain_id,
            block_hash,
            height,
            header,
        });
        self.post_message(
            token,
            POST_BLOCK_HEADER_GAS_LIMIT,
            msg,
            "unable to broadcast block header",
        )
        .await
    }

    /// The failed gas limit recorded for `ballot`, if any.
    pub fn out_of_gas_limit(&self, ballot: &BallotIndex) -> Option<u64> {
        self.inner.out_of_gas.read().get(ballot).copied()
    }

    /// Wrap and broadcast a message that needs no ballot bookkeeping.
    pub(crate) async fn post_message(
        &self,
        token: &CancellationToken,
        gas_limit: u64,
        msg: CorechainMsg,
        context: &'static str,
    ) -> Result<String, ClientError> {
        let signer = self.authz_signer(msg.key_type())?;
        let envelope = wrap_with_authz(msg, &signer)?;
        self.broadcast_with_retry(token, gas_limit, &envelope, &signer, None, context)
            .await
    }

    async fn post_vote(
        &self,
        token: &CancellationToken,
        gas_limit: u64,
        retry_gas_limit: u64,
        msg: CorechainMsg,
        monitor_errors: Option<mpsc::Sender<MonitorError>>,
    ) -> Result<(String, BallotIndex), ClientError> {
        let ballot = msg.digest()?;
        let Some((gas_limit, retry_gas_limit)) =
            self.adjusted_gas_limits(&ballot, gas_limit, retry_gas_limit)
        else {
            info!(ballot_index = %ballot, "stop voting due to gas limit");
            return Ok((String::new(), ballot));
        };

        let signer = self.authz_signer(msg.key_type())?;
        let envelope = wrap_with_authz(msg.clone(), &signer)?;

        let rpc = &self.inner.rpc;
        let voted = cancellable(token, async {
            Ok::<_, ClientError>(rpc.has_voted(&ballot, msg.creator()).await?)
        })
        .await?;
        if voted {
            self.inner.metrics.votes_skipped.inc();
            debug!(ballot_index = %ballot, "already voted");
            return Ok((String::new(), ballot));
        }

        let tx_hash = self
            .broadcast_with_retry(
                token,
                gas_limit,
                &envelope,
                &signer,
                None,
                "unable to broadcast vote",
            )
            .await?;

        self.spawn_monitor(
            tx_hash.clone(),
            ballot.clone(),
            retry_gas_limit,
            msg,
            monitor_errors,
        );
        Ok((tx_hash, ballot))
    }

    /// Gas limits to use for `ballot` given past out-of-gas failures, or
    /// `None` when even the highest limit on offer has already failed.
    fn adjusted_gas_limits(
        &self,
        ballot: &BallotIndex,
        gas_limit: u64,
        retry_gas_limit: u64,
    ) -> Option<(u64, u64)> {
        let Some(failed) = self.out_of_gas_limit(ballot) else {
            return Some((gas_limit, retry_gas_limit));
        };
        let max_gas_limit = gas_limit.max(retry_gas_limit);
        if failed >= max_gas_limit {
            return None;
        }
        info!(
            ballot_index = %ballot,
            gas_limit,
            new_gas_limit = max_gas_limit,
            "adjusted gas limit"
        );
        Some((max_gas_limit, 0))
    }

    fn record_out_of_gas(&self, ballot: &BallotIndex, gas_limit: u64) {
        let mut failed = self.inner.out_of_gas.write();
        let entry = failed.entry(ballot.clone()).or_insert(gas_limit);
        *entry = (*entry).max(gas_limit);
    }

    fn clear_out_of_gas(&self, ballot: &BallotIndex) {
        self.inner.out_of_gas.write().remove(ballot);
    }

    /// Start the detached result monitor for a freshly broadcast vote.
    fn spawn_monitor(
        &self,
        tx_hash: String,
        ballot_index: BallotIndex,
        retry_gas_limit: u64,
        msg: CorechainMsg,
        monitor_errors: Option<mpsc::Sender<MonitorError>>,
    ) {
        let client = self.clone();
        let name = match &msg {
            CorechainMsg::VoteInbound(_) => "monitor_vote_inbound",
            _ => "monitor_vote_outbound",
        };
        let span = info_span!("monitor", worker = name, tx_hash = %tx_hash);
        Work::new()
            .name(name)
            .span(span)
            .spawn(self.detached_token(), move |token| async move {
                let inbound_block_height = match &msg {
                    CorechainMsg::VoteInbound(m) => m.inbound_block_height,
                    _ => 0,
                };
                let result = client
                    .monitor_vote_result(
                        token.clone(),
                        tx_hash.clone(),
                        retry_gas_limit,
                        msg,
                        monitor_errors.clone(),
                    )
                    .await;

                if let (Err(e), Some(errors)) = (&result, monitor_errors) {
                    let report = MonitorError {
                        error: e.to_string(),
                        inbound_block_height,
                        tx_hash,
                        ballot_index,
                    };
                    tokio::select! {
                        _ = errors.send(report) => {}
                        _ = token.cancelled() => warn!("dropped monitor error report on cancellation"),
                    }
                }
                result
            });
    }

    async fn monitor_vote_result(
        &self,
        token: CancellationToken,
        tx_hash: String,
        retry_gas_limit: u64,
        msg: CorechainMsg,
        monitor_errors: Option<mpsc::Sender<MonitorError>>,
    ) -> Result<(), ClientError> {
        let ballot = msg.digest()?;

        // The vote needs at least a block to be included.
        cancellable(&token, async {
            tokio::time::sleep(self.inner.config.monitor_interval()).await;
            Ok::<_, ClientError>(())
        })
        .await?;

        let result = retry_all_with_backoff(self.inner.config.monitor_backoff(), || {
            let rpc = Arc::clone(&self.inner.rpc);
            let tx_hash = tx_hash.clone();
            let token = token.clone();
            async move {
                cancellable(&token, async {
                    Ok::<_, ClientError>(rpc.tx_result(&tx_hash).await?)
                })
                .await
            }
        })
        .await
        .map_err(|e| {
            self.inner.metrics.monitor_failures.inc();
            ClientError::retry("unable to query vote result", e)
        })?;

        if result.raw_log.contains(FAILED_TO_EXECUTE) {
            error!(
                tx_hash = %tx_hash,
                ballot_index = %ballot,
                raw_log = %result.raw_log,
                "vote failed to execute"
            );
            return Ok(());
        }

        if result.raw_log.contains(OUT_OF_GAS) {
            let Ok(gas_wanted) = u64::try_from(result.gas_wanted) else {
                error!(
                    tx_hash = %tx_hash,
                    ballot_index = %ballot,
                    gas_wanted = result.gas_wanted,
                    "vote ran out of gas with negative gas wanted, not recording"
                );
                return Ok(());
            };
            self.record_out_of_gas(&ballot, gas_wanted);
            if retry_gas_limit == 0 {
                info!(tx_hash = %tx_hash, ballot_index = %ballot, "vote ran out of gas, not resending");
                return Ok(());
            }

            self.inner.metrics.out_of_gas_resubmissions.inc();
            let (new_hash, _) = self
                .resubmit(token, retry_gas_limit, msg, monitor_errors)
                .await?;
            info!(
                tx_hash = %tx_hash,
                new_tx_hash = %new_hash,
                retry_gas_limit,
                ballot_index = %ballot,
                "resent vote after running out of gas"
            );
            return Ok(());
        }

        debug!(tx_hash = %tx_hash, ballot_index = %ballot, "vote succeeded");
        self.clear_out_of_gas(&ballot);
        Ok(())
    }

    /// Resend a vote with `gas_limit` and no further escalation.
    fn resubmit(
        &self,
        token: CancellationToken,
        gas_limit: u64,
        msg: CorechainMsg,
        monitor_errors: Option<mpsc::Sender<MonitorError>>,
    ) -> BoxFuture<'static, Result<(String, BallotIndex), ClientError>> {
        let client = self.clone();
        Box::pin(async move {
            client
                .post_vote(&token, gas_limit, 0, msg, monitor_errors)
                .await
        })
    }
}
