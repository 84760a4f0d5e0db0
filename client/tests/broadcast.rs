mod common;

use tokio_util::sync::CancellationToken;

use corelink_client::{ClientError, RpcError};
use corelink_nullables::keyring::{OBSERVER_GRANTEE_ADDRESS, TSS_SIGNER_ADDRESS};
use corelink_types::{wrap_with_authz, BroadcastResponse, CorechainMsg, KeyType, MsgVoteGasPrice};

use common::harness;

fn gas_price_msg(chain_id: i64) -> CorechainMsg {
    CorechainMsg::VoteGasPrice(MsgVoteGasPrice {
        creator: corelink_nullables::keyring::OPERATOR_ADDRESS.to_string(),
        chain_id,
        price: 100,
        priority_fee: 0,
        block_number: 10,
    })
}

#[tokio::test]
async fn consecutive_broadcasts_in_one_block_use_local_sequence() {
    let h = harness();
    let token = CancellationToken::new();
    let signer = h.client.authz_signer(KeyType::ObserverGrantee).unwrap();

    for chain_id in 1..=3 {
        let envelope = wrap_with_authz(gas_price_msg(chain_id), &signer).unwrap();
        h.client.broadcast(&token, 200_000, &envelope, &signer).await.unwrap();
    }

    let sequences: Vec<u64> = h.chain.accepted().iter().map(|a| a.tx.sequence).collect();
    assert_eq!(sequences, [0, 1, 2]);
    assert_eq!(h.chain.account_queries(), 1);
    assert_eq!(h.client.metrics().broadcasts_submitted.get(), 3);
}

#[tokio::test]
async fn new_block_refresh_keeps_the_larger_sequence() {
    let h = harness();
    let token = CancellationToken::new();
    let signer = h.client.authz_signer(KeyType::ObserverGrantee).unwrap();
    let envelope = wrap_with_authz(gas_price_msg(1), &signer).unwrap();

    h.client.broadcast(&token, 200_000, &envelope, &signer).await.unwrap();
    h.chain.set_sequence(OBSERVER_GRANTEE_ADDRESS, 9);
    h.chain.set_height(2);
    h.client.broadcast(&token, 200_000, &envelope, &signer).await.unwrap();

    let last = h.chain.accepted().last().unwrap().tx.sequence;
    assert_eq!(last, 9);
    assert_eq!(h.chain.account_queries(), 2);
}

#[tokio::test]
async fn sequence_mismatch_resets_cache_and_next_attempt_succeeds() {
    let h = harness();
    let token = CancellationToken::new();
    let signer = h.client.authz_signer(KeyType::ObserverGrantee).unwrap();
    let envelope = wrap_with_authz(gas_price_msg(1), &signer).unwrap();

    h.client.broadcast(&token, 200_000, &envelope, &signer).await.unwrap();
    h.chain.set_sequence(OBSERVER_GRANTEE_ADDRESS, 5);

    let err = h
        .client
        .broadcast(&token, 200_000, &envelope, &signer)
        .await
        .unwrap_err();
    match err {
        ClientError::BroadcastRejected { code, raw_log } => {
            assert_eq!(code, 32);
            assert!(raw_log.contains("expected 5, got 1"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.client.metrics().sequence_resets.get(), 1);

    h.client.broadcast(&token, 200_000, &envelope, &signer).await.unwrap();
    assert_eq!(h.chain.accepted().last().unwrap().tx.sequence, 5);
    assert_eq!(h.chain.account_queries(), 1);
}

#[tokio::test]
async fn other_rejections_do_not_advance_sequence() {
    let h = harness();
    let token = CancellationToken::new();
    let signer = h.client.authz_signer(KeyType::ObserverGrantee).unwrap();
    let envelope = wrap_with_authz(gas_price_msg(1), &signer).unwrap();

    h.chain.script_broadcast(Ok(BroadcastResponse {
        code: 13,
        tx_hash: String::new(),
        raw_log: "insufficient fee".into(),
    }));
    let err = h
        .client
        .broadcast(&token, 200_000, &envelope, &signer)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::BroadcastRejected { code: 13, .. }));

    h.client.broadcast(&token, 200_000, &envelope, &signer).await.unwrap();
    assert_eq!(h.chain.accepted()[0].tx.sequence, 0);
}

#[tokio::test]
async fn fee_is_discounted_base_price_with_margin() {
    let h = harness();
    let token = CancellationToken::new();
    h.chain.set_base_gas_price(10_000);
    let signer = h.client.authz_signer(KeyType::ObserverGrantee).unwrap();
    let envelope = wrap_with_authz(gas_price_msg(1), &signer).unwrap();

    h.client.broadcast(&token, 200_000, &envelope, &signer).await.unwrap();

    let tx = &h.chain.accepted()[0].tx;
    assert_eq!(tx.fee.amount, 30_000_000);
    assert_eq!(tx.fee.denom, h.client.config().fee_denom);
    assert_eq!(tx.gas_limit, 200_000);
    assert_eq!(tx.chain_id, h.client.config().chain_id);
}

#[tokio::test]
async fn each_key_type_keeps_its_own_sequence() {
    let h = harness();
    let token = CancellationToken::new();

    h.client
        .post_vote_gas_price(&token, 1, 100, 0, 10)
        .await
        .unwrap();
    h.client
        .post_vote_tss(&token, "corepub1new".into(), 50, corelink_types::ReceiveStatus::Success)
        .await
        .unwrap();
    h.client
        .post_vote_gas_price(&token, 1, 100, 0, 11)
        .await
        .unwrap();

    assert_eq!(h.chain.sequence_of(OBSERVER_GRANTEE_ADDRESS), 2);
    assert_eq!(h.chain.sequence_of(TSS_SIGNER_ADDRESS), 1);
    let tss = h
        .chain
        .accepted()
        .into_iter()
        .find(|a| a.key_type == KeyType::TssSigner)
        .unwrap();
    assert_eq!(tss.tx.body.grantee, TSS_SIGNER_ADDRESS);
    assert_eq!(tss.tx.gas_limit, corelink_client::constants::POST_TSS_GAS_LIMIT);
}

#[tokio::test]
async fn transient_rpc_failures_are_retried() {
    let h = harness();
    let token = CancellationToken::new();
    h.chain
        .script_broadcast(Err(RpcError::Unavailable("connection reset".into())));

    let hash = h
        .client
        .post_vote_gas_price(&token, 1, 100, 0, 10)
        .await
        .unwrap();
    assert!(!hash.is_empty());
    assert_eq!(h.client.metrics().broadcasts_failed.get(), 1);
}

#[tokio::test]
async fn persistent_failures_exceed_retry_limit() {
    let h = harness();
    let token = CancellationToken::new();
    for _ in 0..3 {
        h.chain
            .script_broadcast(Err(RpcError::Unavailable("connection reset".into())));
    }

    let err = h
        .client
        .post_vote_gas_price(&token, 1, 100, 0, 10)
        .await
        .unwrap_err();
    assert!(err.is_limit_exceeded());
    assert!(err.to_string().contains("retry limit exceeded"));
    assert!(h.chain.accepted().is_empty());
}

#[tokio::test]
async fn cancelled_token_stops_before_broadcast() {
    let h = harness();
    let token = CancellationToken::new();
    token.cancel();

    let err = h
        .client
        .post_vote_gas_price(&token, 1, 100, 0, 10)
        .await
        .unwrap_err();
    assert!(matches!(err.root(), ClientError::Context(_)));
    assert!(h.chain.accepted().is_empty());
}

#[tokio::test]
async fn missing_key_fails_without_broadcast() {
    let h = harness();
    let token = CancellationToken::new();
    h.keys.remove_key(KeyType::TssSigner);

    let err = h
        .client
        .post_vote_tss(&token, "corepub1new".into(), 50, corelink_types::ReceiveStatus::Success)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Key(_)));
    assert!(h.chain.accepted().is_empty());
}
