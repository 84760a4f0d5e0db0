use proptest::prelude::*;

use corelink_types::{CoinType, ConfirmationMode, CorechainMsg, MsgVoteInbound};

fn arb_inbound() -> impl Strategy<Value = MsgVoteInbound> {
    (
        "[a-z0-9]{1,20}",
        any::<u128>(),
        any::<u64>(),
        "0x[0-9a-f]{64}",
        0i64..100_000,
    )
        .prop_map(|(creator, amount, height, hash, chain)| MsgVoteInbound {
            creator,
            sender: "sender".into(),
            sender_chain_id: chain,
            tx_origin: "origin".into(),
            receiver: "receiver".into(),
            receiver_chain: 7000,
            amount,
            message: String::new(),
            inbound_hash: hash,
            inbound_block_height: height,
            call_gas_limit: 0,
            coin_type: CoinType::Gas,
            asset: String::new(),
            event_index: 0,
            confirmation_mode: ConfirmationMode::Safe,
        })
}

proptest! {
    /// Two observers voting on the same claim always land in the same ballot.
    #[test]
    fn ballot_index_independent_of_creator(msg in arb_inbound(), other in "[a-z0-9]{1,20}") {
        let mut theirs = msg.clone();
        theirs.creator = other;
        prop_assert_eq!(msg.digest().unwrap(), theirs.digest().unwrap());
    }

    /// Ballot indexes are 64 lowercase hex characters.
    #[test]
    fn ballot_index_is_hex(msg in arb_inbound()) {
        let index = CorechainMsg::from(msg).digest().unwrap();
        prop_assert_eq!(index.as_str().len(), 64);
        prop_assert!(index.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    /// Any differing amount yields a different ballot.
    #[test]
    fn ballot_index_sensitive_to_amount(msg in arb_inbound()) {
        let mut bumped = msg.clone();
        bumped.amount = msg.amount.wrapping_add(1);
        prop_assert_ne!(msg.digest().unwrap(), bumped.digest().unwrap());
    }
}
