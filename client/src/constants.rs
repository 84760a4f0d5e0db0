//! Gas limits and monitoring parameters.

use std::time::Duration;

use corelink_types::ChainFamily;

pub const DEFAULT_GAS_LIMIT: u64 = 200_000;
pub const POST_GAS_PRICE_GAS_LIMIT: u64 = 1_500_000;
pub const ADD_OUTBOUND_TRACKER_GAS_LIMIT: u64 = 200_000;
pub const POST_BLAME_DATA_GAS_LIMIT: u64 = 200_000;
pub const POST_TSS_GAS_LIMIT: u64 = 500_000;
pub const POST_BLOCK_HEADER_GAS_LIMIT: u64 = 200_000;
pub const POST_VOTE_INBOUND_EXECUTION_GAS_LIMIT: u64 = 500_000;
pub const POST_VOTE_OUTBOUND_GAS_LIMIT: u64 = 400_000;
pub const POST_VOTE_OUTBOUND_REVERT_GAS_LIMIT: u64 = 1_500_000;

pub const MONITOR_INTERVAL: Duration = Duration::from_secs(5);
pub const MONITOR_MAX_RETRIES: u32 = 20;

/// Broadcast result code for a stale account sequence.
pub const CODE_SEQUENCE_MISMATCH: u32 = 32;

pub const SEQUENCE_MISMATCH_PATTERN: &str =
    r"account sequence mismatch, expected ([0-9]*), got ([0-9]*)";

/// Raw-log marker of a vote that executed but failed.
pub const FAILED_TO_EXECUTE: &str = "failed to execute message";
/// Raw-log marker of a vote that ran out of gas.
pub const OUT_OF_GAS: &str = "out of gas";

/// Fees are paid at the discounted base price times this factor.
pub const FEE_MARGIN_NUMERATOR: u128 = 3;
pub const FEE_MARGIN_DENOMINATOR: u128 = 2;

/// Multiplier, in percent, applied to an observed gas price before voting.
pub fn gas_price_multiplier_percent(chain_id: i64) -> u64 {
    match ChainFamily::of(chain_id) {
        ChainFamily::Evm => 120,
        ChainFamily::Bitcoin => 200,
        ChainFamily::Other => 100,
    }
}
