//! Nullable corechain: an in-memory chain with scriptable responses.

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use corelink_client::{CorechainRpc, RpcError};
use corelink_types::{
    blake2b_256, AccountInfo, BallotIndex, BroadcastResponse, CorechainMsg, KeyType, Keygen,
    KeygenStatus, NewBlockEvent, OperationalFlags, OutboundTracker, SignedTx, TssInfo, TxResult,
    UnsignedTx,
};

use crate::NullKeyring;

const ACCOUNT_NUMBER: u64 = 42;
const BLOCK_SUBSCRIPTION_BUFFER: usize = 64;

/// A transaction the chain accepted.
#[derive(Clone, Debug)]
pub struct AcceptedTx {
    pub tx_hash: String,
    pub key_type: KeyType,
    pub tx: UnsignedTx,
}

struct State {
    height: i64,
    base_gas_price: u128,
    accounts: HashMap<String, AccountInfo>,
    account_queries: usize,
    voted: HashSet<(BallotIndex, String)>,
    has_voted_calls: usize,
    accepted: Vec<AcceptedTx>,
    rejected: usize,
    scripted_broadcasts: VecDeque<Result<BroadcastResponse, RpcError>>,
    queued_results: VecDeque<TxResult>,
    tx_results: HashMap<String, TxResult>,
    tx_result_queries: usize,
    tx_results_unavailable: bool,
    block_subscribers: Vec<mpsc::Sender<NewBlockEvent>>,
    subscriptions: usize,
    trackers: HashMap<(i64, u64), OutboundTracker>,
    flags: OperationalFlags,
    tss: TssInfo,
    keygen: Keygen,
}

/// An in-memory corechain.
///
/// Accepted transactions advance the sender's on-chain sequence; a stale
/// sequence is rejected with the chain's real mismatch code and message.
/// Each accepted transaction is assigned the next queued [`TxResult`] (a
/// successful one when the queue is empty). Inbound and outbound votes whose
/// result succeeded count as cast for [`has_voted`](CorechainRpc::has_voted).
pub struct NullCorechain {
    state: Mutex<State>,
}

impl NullCorechain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                height: 1,
                base_gas_price: 10_000,
                accounts: HashMap::new(),
                account_queries: 0,
                voted: HashSet::new(),
                has_voted_calls: 0,
                accepted: Vec::new(),
                rejected: 0,
                scripted_broadcasts: VecDeque::new(),
                queued_results: VecDeque::new(),
                tx_results: HashMap::new(),
                tx_result_queries: 0,
                tx_results_unavailable: false,
                block_subscribers: Vec::new(),
                subscriptions: 0,
                trackers: HashMap::new(),
                flags: OperationalFlags::default(),
                tss: TssInfo {
                    pubkey: "corepub1tss".to_string(),
                    finalized_height: 1,
                },
                keygen: Keygen {
                    status: KeygenStatus::Success,
                    block_number: 1,
                    pubkeys: Vec::new(),
                },
            }),
        }
    }

    // ── Scripting ───────────────────────────────────────────────────────

    /// Advance the chain to `height` and notify block subscribers.
    pub fn emit_block(&self, height: i64) {
        let mut state = self.state.lock();
        state.height = height;
        state
            .block_subscribers
            .retain(|tx| match tx.try_send(NewBlockEvent { height }) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => true,
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            });
    }

    /// Drop every upstream block subscription.
    pub fn close_block_subscriptions(&self) {
        self.state.lock().block_subscribers.clear();
    }

    pub fn set_height(&self, height: i64) {
        self.state.lock().height = height;
    }

    pub fn set_base_gas_price(&self, price: u128) {
        self.state.lock().base_gas_price = price;
    }

    /// Overwrite the on-chain sequence of `address`.
    pub fn set_sequence(&self, address: &str, sequence: u64) {
        let mut state = self.state.lock();
        state.accounts.entry(address.to_string()).or_default().sequence = sequence;
    }

    /// Answer the next broadcast with `response` instead of executing it.
    pub fn script_broadcast(&self, response: Result<BroadcastResponse, RpcError>) {
        self.state.lock().scripted_broadcasts.push_back(response);
    }

    /// Result assigned to the next accepted transaction.
    pub fn queue_tx_result(&self, result: TxResult) {
        self.state.lock().queued_results.push_back(result);
    }

    pub fn set_tx_results_unavailable(&self, unavailable: bool) {
        self.state.lock().tx_results_unavailable = unavailable;
    }

    pub fn mark_voted(&self, ballot: &BallotIndex, voter: &str) {
        self.state
            .lock()
            .voted
            .insert((ballot.clone(), voter.to_string()));
    }

    pub fn set_outbound_tracker(&self, tracker: OutboundTracker) {
        self.state
            .lock()
            .trackers
            .insert((tracker.chain_id, tracker.nonce), tracker);
    }

    pub fn set_operational_flags(&self, flags: OperationalFlags) {
        self.state.lock().flags = flags;
    }

    pub fn set_tss(&self, tss: TssInfo) {
        self.state.lock().tss = tss;
    }

    pub fn set_keygen(&self, keygen: Keygen) {
        self.state.lock().keygen = keygen;
    }

    // ── Inspection ──────────────────────────────────────────────────────

    pub fn accepted(&self) -> Vec<AcceptedTx> {
        self.state.lock().accepted.clone()
    }

    /// Messages of every accepted transaction, flattened in order.
    pub fn accepted_msgs(&self) -> Vec<CorechainMsg> {
        self.state
            .lock()
            .accepted
            .iter()
            .flat_map(|a| a.tx.body.msgs.clone())
            .collect()
    }

    pub fn rejected_count(&self) -> usize {
        self.state.lock().rejected
    }

    pub fn account_queries(&self) -> usize {
        self.state.lock().account_queries
    }

    pub fn has_voted_calls(&self) -> usize {
        self.state.lock().has_voted_calls
    }

    pub fn tx_result_queries(&self) -> usize {
        self.state.lock().tx_result_queries
    }

    pub fn subscriptions(&self) -> usize {
        self.state.lock().subscriptions
    }

    pub fn sequence_of(&self, address: &str) -> u64 {
        self.state
            .lock()
            .accounts
            .get(address)
            .map_or(0, |a| a.sequence)
    }

    fn execute(state: &mut State, key_type: KeyType, tx: UnsignedTx) -> BroadcastResponse {
        let account = state
            .accounts
            .entry(tx.body.grantee.clone())
            .or_insert(AccountInfo {
                account_number: ACCOUNT_NUMBER,
                sequence: 0,
            });
        if tx.sequence != account.sequence {
            state.rejected += 1;
            return BroadcastResponse {
                code: 32,
                tx_hash: String::new(),
                raw_log: format!(
                    "account sequence mismatch, expected {}, got {}: incorrect account sequence",
                    account.sequence, tx.sequence
                ),
            };
        }
        account.sequence += 1;

        let encoded = format!("{}:{}:{}", tx.body.grantee, tx.sequence, state.accepted.len());
        let tx_hash = hex::encode_upper(blake2b_256(encoded.as_bytes()));
        let result = state.queued_results.pop_front().unwrap_or_else(|| TxResult {
            code: 0,
            raw_log: "executed".to_string(),
            gas_wanted: i64::try_from(tx.gas_limit).unwrap_or(i64::MAX),
            gas_used: 0,
        });
        if result.code == 0 {
            for msg in &tx.body.msgs {
                if !matches!(msg, CorechainMsg::VoteInbound(_) | CorechainMsg::VoteOutbound(_)) {
                    continue;
                }
                if let Ok(ballot) = msg.digest() {
                    state.voted.insert((ballot, msg.creator().to_string()));
                }
            }
        }
        state.tx_results.insert(tx_hash.clone(), result);
        state.accepted.push(AcceptedTx {
            tx_hash: tx_hash.clone(),
            key_type,
            tx,
        });
        BroadcastResponse {
            code: 0,
            tx_hash,
            raw_log: String::new(),
        }
    }
}

impl Default for NullCorechain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CorechainRpc for NullCorechain {
    async fn has_voted(&self, ballot: &BallotIndex, voter: &str) -> Result<bool, RpcError> {
        let mut state = self.state.lock();
        state.has_voted_calls += 1;
        Ok(state.voted.contains(&(ballot.clone(), voter.to_string())))
    }

    async fn broadcast_tx_sync(&self, tx: SignedTx) -> Result<BroadcastResponse, RpcError> {
        let mut state = self.state.lock();
        if let Some(scripted) = state.scripted_broadcasts.pop_front() {
            if matches!(&scripted, Ok(r) if r.code != 0) {
                state.rejected += 1;
            }
            return scripted;
        }
        let (key_type, unsigned) = NullKeyring::decode(&tx)
            .ok_or_else(|| RpcError::InvalidResponse("undecodable transaction".into()))?;
        Ok(Self::execute(&mut state, key_type, unsigned))
    }

    async fn tx_result(&self, tx_hash: &str) -> Result<TxResult, RpcError> {
        let mut state = self.state.lock();
        state.tx_result_queries += 1;
        if state.tx_results_unavailable {
            return Err(RpcError::Unavailable("tx result".into()));
        }
        state
            .tx_results
            .get(tx_hash)
            .cloned()
            .ok_or_else(|| RpcError::NotFound(tx_hash.to_string()))
    }

    async fn account(&self, address: &str) -> Result<AccountInfo, RpcError> {
        let mut state = self.state.lock();
        state.account_queries += 1;
        Ok(*state
            .accounts
            .entry(address.to_string())
            .or_insert(AccountInfo {
                account_number: ACCOUNT_NUMBER,
                sequence: 0,
            }))
    }

    async fn block_height(&self) -> Result<i64, RpcError> {
        Ok(self.state.lock().height)
    }

    async fn base_gas_price(&self) -> Result<u128, RpcError> {
        Ok(self.state.lock().base_gas_price)
    }

    async fn subscribe_new_blocks(&self) -> Result<mpsc::Receiver<NewBlockEvent>, RpcError> {
        let (tx, rx) = mpsc::channel(BLOCK_SUBSCRIPTION_BUFFER);
        let mut state = self.state.lock();
        state.subscriptions += 1;
        state.block_subscribers.push(tx);
        Ok(rx)
    }

    async fn outbound_tracker(
        &self,
        chain_id: i64,
        nonce: u64,
    ) -> Result<Option<OutboundTracker>, RpcError> {
        Ok(self.state.lock().trackers.get(&(chain_id, nonce)).cloned())
    }

    async fn operational_flags(&self) -> Result<OperationalFlags, RpcError> {
        Ok(self.state.lock().flags.clone())
    }

    async fn tss(&self) -> Result<TssInfo, RpcError> {
        Ok(self.state.lock().tss.clone())
    }

    async fn keygen(&self) -> Result<Keygen, RpcError> {
        Ok(self.state.lock().keygen.clone())
    }
}
