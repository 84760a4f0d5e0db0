//! Plain data returned by corechain queries.

use serde::{Deserialize, Serialize};

/// Result of a synchronous ("sync" mode) broadcast: the transaction passed or
/// failed the mempool check, execution has not happened yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResponse {
    pub code: u32,
    pub tx_hash: String,
    pub raw_log: String,
}

/// Execution result of an included transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResult {
    pub code: u32,
    pub raw_log: String,
    pub gas_wanted: i64,
    pub gas_used: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_number: u64,
    pub sequence: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBlockEvent {
    pub height: i64,
}

/// Operator-wide flags set by chain governance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationalFlags {
    /// Height at which every observer must restart; `0` means unset.
    pub restart_height: i64,
    /// Lowest client version allowed to keep running, if any.
    pub minimum_version: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TssInfo {
    pub pubkey: String,
    pub finalized_height: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeygenStatus {
    Pending,
    Success,
    Failed,
}

/// A scheduled (or completed) TSS key generation ceremony.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keygen {
    pub status: KeygenStatus,
    pub block_number: i64,
    pub pubkeys: Vec<String>,
}

/// Outbound hashes already reported for one `(chain, nonce)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundTracker {
    pub chain_id: i64,
    pub nonce: u64,
    pub hashes: Vec<String>,
}

impl OutboundTracker {
    pub fn contains(&self, tx_hash: &str) -> bool {
        self.hashes.iter().any(|h| h.eq_ignore_ascii_case(tx_hash))
    }
}
