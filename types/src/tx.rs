//! Transactions as handed to the signer and the broadcast endpoint.

use serde::{Deserialize, Serialize};

use crate::authz::AuthzEnvelope;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: u128,
}

/// A fully parameterised transaction awaiting a signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTx {
    pub chain_id: String,
    pub account_number: u64,
    pub sequence: u64,
    pub gas_limit: u64,
    pub fee: Coin,
    pub memo: String,
    pub body: AuthzEnvelope,
}

/// Encoded, signed transaction bytes ready for broadcast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTx {
    pub bytes: Vec<u8>,
}
