#![allow(dead_code)]

use std::time::Duration;

use corelink_nullables::keyring::OPERATOR_ADDRESS;
use corelink_nullables::{fast_config, NullHarness};
use corelink_types::{
    CoinType, ConfirmationMode, MsgVoteInbound, MsgVoteOutbound, ReceiveStatus, TxResult,
};

pub fn harness() -> NullHarness {
    NullHarness::new(fast_config()).expect("fast config is valid")
}

pub fn inbound(event_index: u64) -> MsgVoteInbound {
    MsgVoteInbound {
        creator: OPERATOR_ADDRESS.to_string(),
        sender: "0x70e967acfcc17c3941e87562161406d41676fd83".to_string(),
        sender_chain_id: 1,
        tx_origin: "0x70e967acfcc17c3941e87562161406d41676fd83".to_string(),
        receiver: "0x8531a5ab847ff5b22d855633c25ed1da3255247e".to_string(),
        receiver_chain: 7000,
        amount: 1_000_000,
        message: String::new(),
        inbound_hash: "0xfa51db4412144f1130669f2bae8cb44aadbd8d85958dbffcb0fe236878097e1a"
            .to_string(),
        inbound_block_height: 18_495_266,
        call_gas_limit: 90_000,
        coin_type: CoinType::Gas,
        asset: String::new(),
        event_index,
        confirmation_mode: ConfirmationMode::Fast,
    }
}

pub fn outbound(nonce: u64) -> MsgVoteOutbound {
    MsgVoteOutbound {
        creator: OPERATOR_ADDRESS.to_string(),
        cctx_hash: "0x1a17bcc359e84ba8ae03b17ec425f97022cd11c3e279f6bdf7a96fcffa12b366"
            .to_string(),
        observed_outbound_hash: "0x6b5e1a3c1f2d4c8b9a7e6f5d4c3b2a1908f7e6d5c4b3a29180f7e6d5c4b3a291"
            .to_string(),
        observed_outbound_block_height: 42,
        observed_outbound_gas_used: 21_000,
        observed_outbound_effective_gas_price: 30_000_000_000,
        observed_outbound_effective_gas_limit: 100_000,
        value_received: 5_000,
        status: ReceiveStatus::Success,
        outbound_chain: 1,
        outbound_tss_nonce: nonce,
        coin_type: CoinType::Gas,
    }
}

pub fn out_of_gas(gas_wanted: i64) -> TxResult {
    TxResult {
        code: 11,
        raw_log: format!("out of gas in location: WriteFlat; gasWanted: {gas_wanted}, gasUsed: {gas_wanted}: out of gas"),
        gas_wanted,
        gas_used: gas_wanted,
    }
}

/// Poll `cond` until it holds or two seconds pass.
pub async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}

/// Give detached monitors time to finish their polling.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}
