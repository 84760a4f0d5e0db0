//! Fundamental types for the corechain observer client.
//!
//! This crate defines the data shared across every other crate in the workspace:
//! the vote/report messages observers submit, ballot digests, the authorization
//! envelope used to broadcast on behalf of an operator, and the plain data the
//! corechain RPC hands back.

pub mod authz;
pub mod chain;
pub mod error;
pub mod hash;
pub mod keys;
pub mod msg;
pub mod rpc;
pub mod tx;

pub use authz::{wrap_batch_with_authz, wrap_with_authz, AuthzEnvelope, AuthzSigner};
pub use chain::ChainFamily;
pub use error::MsgError;
pub use hash::{blake2b_256, BallotIndex};
pub use keys::KeyType;
pub use msg::{
    Blame, CoinType, ConfirmationMode, CorechainMsg, MsgAddOutboundTracker, MsgVoteBlame,
    MsgVoteBlockHeader, MsgVoteGasPrice, MsgVoteInbound, MsgVoteOutbound, MsgVoteTss,
    ReceiveStatus,
};
pub use rpc::{
    AccountInfo, BroadcastResponse, Keygen, KeygenStatus, NewBlockEvent, OperationalFlags,
    OutboundTracker, TssInfo, TxResult,
};
pub use tx::{Coin, SignedTx, UnsignedTx};
