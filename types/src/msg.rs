//! Vote and report messages observers submit to the corechain.
//!
//! Every message carries a `creator` (the operator address the vote is cast
//! for). Ballot digests are computed with the creator cleared so that all
//! observers voting on the same claim land in the same ballot.

use serde::{Deserialize, Serialize};

use crate::error::MsgError;
use crate::hash::{blake2b_256, BallotIndex};
use crate::keys::KeyType;

/// Maximum length of the arbitrary payload carried by an inbound vote.
pub const MAX_MESSAGE_LENGTH: usize = 10_240;

/// Outcome reported for an observed cross-chain transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceiveStatus {
    Created,
    Success,
    Failed,
}

/// Asset class moved by a cross-chain transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoinType {
    Zeta,
    Gas,
    Erc20,
    Cmd,
    NoAssetCall,
}

/// How many confirmations an inbound observation waited for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfirmationMode {
    Safe,
    Fast,
}

/// Vote on an inbound transaction observed on an external chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVoteInbound {
    pub creator: String,
    pub sender: String,
    pub sender_chain_id: i64,
    pub tx_origin: String,
    pub receiver: String,
    pub receiver_chain: i64,
    pub amount: u128,
    pub message: String,
    pub inbound_hash: String,
    pub inbound_block_height: u64,
    pub call_gas_limit: u64,
    pub coin_type: CoinType,
    pub asset: String,
    pub event_index: u64,
    pub confirmation_mode: ConfirmationMode,
}

impl MsgVoteInbound {
    pub const TYPE_URL: &'static str = "/corechain.crosschain.MsgVoteInbound";

    pub fn validate_basic(&self) -> Result<(), MsgError> {
        require_creator(Self::TYPE_URL, &self.creator)?;
        if self.inbound_hash.is_empty() {
            return Err(MsgError::invalid(Self::TYPE_URL, "inbound hash is empty"));
        }
        if self.message.len() > MAX_MESSAGE_LENGTH {
            return Err(MsgError::invalid(
                Self::TYPE_URL,
                format!(
                    "message length {} exceeds {MAX_MESSAGE_LENGTH}",
                    self.message.len()
                ),
            ));
        }
        Ok(())
    }

    /// Ballot index: creator and the observed block height are excluded,
    /// observers may see the same event at different local heights.
    pub fn digest(&self) -> Result<BallotIndex, MsgError> {
        let mut m = self.clone();
        m.creator.clear();
        m.inbound_block_height = 0;
        digest_of(&m)
    }
}

/// Vote on the outcome of an outbound transaction signed by the TSS.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVoteOutbound {
    pub creator: String,
    pub cctx_hash: String,
    pub observed_outbound_hash: String,
    pub observed_outbound_block_height: u64,
    pub observed_outbound_gas_used: u64,
    pub observed_outbound_effective_gas_price: u128,
    pub observed_outbound_effective_gas_limit: u64,
    pub value_received: u128,
    pub status: ReceiveStatus,
    pub outbound_chain: i64,
    pub outbound_tss_nonce: u64,
    pub coin_type: CoinType,
}

impl MsgVoteOutbound {
    pub const TYPE_URL: &'static str = "/corechain.crosschain.MsgVoteOutbound";

    pub fn validate_basic(&self) -> Result<(), MsgError> {
        require_creator(Self::TYPE_URL, &self.creator)?;
        if self.cctx_hash.is_empty() {
            return Err(MsgError::invalid(Self::TYPE_URL, "cctx hash is empty"));
        }
        if self.observed_outbound_hash.is_empty() {
            return Err(MsgError::invalid(Self::TYPE_URL, "outbound hash is empty"));
        }
        Ok(())
    }

    pub fn digest(&self) -> Result<BallotIndex, MsgError> {
        let mut m = self.clone();
        m.creator.clear();
        m.observed_outbound_block_height = 0;
        digest_of(&m)
    }
}

/// Vote on the current gas price of an external chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVoteGasPrice {
    pub creator: String,
    pub chain_id: i64,
    pub price: u64,
    pub priority_fee: u64,
    pub block_number: u64,
}

impl MsgVoteGasPrice {
    pub const TYPE_URL: &'static str = "/corechain.crosschain.MsgVoteGasPrice";
}

/// Nodes blamed for a failed TSS ceremony.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blame {
    pub index: String,
    pub failure_reason: String,
    pub nodes: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVoteBlame {
    pub creator: String,
    pub chain_id: i64,
    pub blame: Blame,
}

impl MsgVoteBlame {
    pub const TYPE_URL: &'static str = "/corechain.observer.MsgVoteBlame";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVoteBlockHeader {
    pub creator: String,
    pub chain_id: i64,
    pub block_hash: Vec<u8>,
    pub height: i64,
    pub header: Vec<u8>,
}

impl MsgVoteBlockHeader {
    pub const TYPE_URL: &'static str = "/corechain.observer.MsgVoteBlockHeader";
}

/// Vote on the result of a TSS key generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVoteTss {
    pub creator: String,
    pub tss_pubkey: String,
    pub keygen_height: i64,
    pub status: ReceiveStatus,
}

impl MsgVoteTss {
    pub const TYPE_URL: &'static str = "/corechain.observer.MsgVoteTSS";
}

/// Report an outbound hash so the corechain can track a pending nonce.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgAddOutboundTracker {
    pub creator: String,
    pub chain_id: i64,
    pub nonce: u64,
    pub tx_hash: String,
}

impl MsgAddOutboundTracker {
    pub const TYPE_URL: &'static str = "/corechain.crosschain.MsgAddOutboundTracker";
}

/// Any message this client broadcasts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorechainMsg {
    VoteInbound(MsgVoteInbound),
    VoteOutbound(MsgVoteOutbound),
    VoteGasPrice(MsgVoteGasPrice),
    VoteBlame(MsgVoteBlame),
    VoteBlockHeader(MsgVoteBlockHeader),
    VoteTss(MsgVoteTss),
    AddOutboundTracker(MsgAddOutboundTracker),
}

impl CorechainMsg {
    pub fn type_url(&self) -> &'static str {
        match self {
            Self::VoteInbound(_) => MsgVoteInbound::TYPE_URL,
            Self::VoteOutbound(_) => MsgVoteOutbound::TYPE_URL,
            Self::VoteGasPrice(_) => MsgVoteGasPrice::TYPE_URL,
            Self::VoteBlame(_) => MsgVoteBlame::TYPE_URL,
            Self::VoteBlockHeader(_) => MsgVoteBlockHeader::TYPE_URL,
            Self::VoteTss(_) => MsgVoteTss::TYPE_URL,
            Self::AddOutboundTracker(_) => MsgAddOutboundTracker::TYPE_URL,
        }
    }

    pub fn creator(&self) -> &str {
        match self {
            Self::VoteInbound(m) => &m.creator,
            Self::VoteOutbound(m) => &m.creator,
            Self::VoteGasPrice(m) => &m.creator,
            Self::VoteBlame(m) => &m.creator,
            Self::VoteBlockHeader(m) => &m.creator,
            Self::VoteTss(m) => &m.creator,
            Self::AddOutboundTracker(m) => &m.creator,
        }
    }

    /// The hot key authorized to broadcast this message type.
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::VoteTss(_) => KeyType::TssSigner,
            _ => KeyType::ObserverGrantee,
        }
    }

    pub fn validate_basic(&self) -> Result<(), MsgError> {
        let type_url = self.type_url();
        require_creator(type_url, self.creator())?;
        match self {
            Self::VoteInbound(m) => m.validate_basic(),
            Self::VoteOutbound(m) => m.validate_basic(),
            Self::VoteGasPrice(m) => {
                if m.chain_id == 0 {
                    return Err(MsgError::invalid(type_url, "chain id is zero"));
                }
                Ok(())
            }
            Self::VoteBlame(m) => {
                if m.blame.index.is_empty() {
                    return Err(MsgError::invalid(type_url, "blame index is empty"));
                }
                Ok(())
            }
            Self::VoteBlockHeader(m) => {
                if m.block_hash.len() != 32 {
                    return Err(MsgError::invalid(
                        type_url,
                        format!("block hash must be 32 bytes, got {}", m.block_hash.len()),
                    ));
                }
                if m.height < 0 {
                    return Err(MsgError::invalid(type_url, "negative block height"));
                }
                Ok(())
            }
            Self::VoteTss(m) => {
                if m.tss_pubkey.is_empty() {
                    return Err(MsgError::invalid(type_url, "tss pubkey is empty"));
                }
                if m.keygen_height <= 0 {
                    return Err(MsgError::invalid(type_url, "keygen height must be positive"));
                }
                Ok(())
            }
            Self::AddOutboundTracker(m) => {
                if m.tx_hash.is_empty() {
                    return Err(MsgError::invalid(type_url, "tx hash is empty"));
                }
                Ok(())
            }
        }
    }

    /// Digest identifying this message independently of who sent it.
    pub fn digest(&self) -> Result<BallotIndex, MsgError> {
        match self {
            Self::VoteInbound(m) => m.digest(),
            Self::VoteOutbound(m) => m.digest(),
            other => {
                let mut m = other.clone();
                m.clear_creator();
                digest_of(&m)
            }
        }
    }

    fn clear_creator(&mut self) {
        match self {
            Self::VoteInbound(m) => m.creator.clear(),
            Self::VoteOutbound(m) => m.creator.clear(),
            Self::VoteGasPrice(m) => m.creator.clear(),
            Self::VoteBlame(m) => m.creator.clear(),
            Self::VoteBlockHeader(m) => m.creator.clear(),
            Self::VoteTss(m) => m.creator.clear(),
            Self::AddOutboundTracker(m) => m.creator.clear(),
        }
    }
}

impl From<MsgVoteInbound> for CorechainMsg {
    fn from(m: MsgVoteInbound) -> Self {
        Self::VoteInbound(m)
    }
}

impl From<MsgVoteOutbound> for CorechainMsg {
    fn from(m: MsgVoteOutbound) -> Self {
        Self::VoteOutbound(m)
    }
}

fn require_creator(type_url: &'static str, creator: &str) -> Result<(), MsgError> {
    if creator.trim().is_empty() {
        return Err(MsgError::invalid(type_url, "creator is empty"));
    }
    Ok(())
}

fn digest_of<T: Serialize>(value: &T) -> Result<BallotIndex, MsgError> {
    let bytes = bincode::serialize(value).map_err(|e| MsgError::Serialization(e.to_string()))?;
    Ok(BallotIndex::from_digest(blake2b_256(&bytes)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_inbound(creator: &str) -> MsgVoteInbound {
        MsgVoteInbound {
            creator: creator.to_string(),
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
            event_index: 0,
            confirmation_mode: ConfirmationMode::Safe,
        }
    }

    fn sample_outbound(creator: &str) -> MsgVoteOutbound {
        MsgVoteOutbound {
            creator: creator.to_string(),
            cctx_hash: "0x1a17bcc359e84ba8ae03b17ec425f97022cd11c3e279f6bdf7a96fcffa12b366"
                .to_string(),
            observed_outbound_hash: "0xabc".to_string(),
            observed_outbound_block_height: 42,
            observed_outbound_gas_used: 21_000,
            observed_outbound_effective_gas_price: 30_000_000_000,
            observed_outbound_effective_gas_limit: 100_000,
            value_received: 1_000,
            status: ReceiveStatus::Success,
            outbound_chain: 1,
            outbound_tss_nonce: 7,
            coin_type: CoinType::Gas,
        }
    }

    #[test]
    fn inbound_digest_ignores_creator() {
        let a = sample_inbound("observer_a");
        let b = sample_inbound("observer_b");
        assert_eq!(a.digest().unwrap(), b.digest().unwrap());
    }

    #[test]
    fn inbound_digest_ignores_observed_height() {
        let a = sample_inbound("observer_a");
        let mut b = a.clone();
        b.inbound_block_height += 3;
        assert_eq!(a.digest().unwrap(), b.digest().unwrap());
    }

    #[test]
    fn inbound_digest_changes_with_amount() {
        let a = sample_inbound("observer_a");
        let mut b = a.clone();
        b.amount += 1;
        assert_ne!(a.digest().unwrap(), b.digest().unwrap());
    }

    #[test]
    fn outbound_digest_ignores_creator() {
        assert_eq!(
            sample_outbound("observer_a").digest().unwrap(),
            sample_outbound("observer_b").digest().unwrap()
        );
    }

    #[test]
    fn enum_digest_matches_inner_digest() {
        let inbound = sample_inbound("observer_a");
        let wrapped = CorechainMsg::from(inbound.clone());
        assert_eq!(wrapped.digest().unwrap(), inbound.digest().unwrap());
    }

    #[test]
    fn gas_price_digest_is_creator_independent() {
        let vote = |creator: &str| {
            CorechainMsg::VoteGasPrice(MsgVoteGasPrice {
                creator: creator.to_string(),
                chain_id: 1,
                price: 42,
                priority_fee: 2,
                block_number: 100,
            })
        };
        let a = vote("observer_a").digest();
        assert!(a.is_ok());
        assert_eq!(a, vote("observer_b").digest());
    }

    #[test]
    fn empty_creator_is_rejected() {
        let msg = CorechainMsg::from(sample_inbound(""));
        let err = msg.validate_basic().unwrap_err();
        assert!(err.to_string().contains("creator is empty"));
    }

    #[test]
    fn oversized_inbound_message_is_rejected() {
        let mut inbound = sample_inbound("observer_a");
        inbound.message = "x".repeat(MAX_MESSAGE_LENGTH + 1);
        assert!(inbound.validate_basic().is_err());
    }

    #[test]
    fn block_header_requires_32_byte_hash() {
        let msg = CorechainMsg::VoteBlockHeader(MsgVoteBlockHeader {
            creator: "observer_a".into(),
            chain_id: 1,
            block_hash: vec![0u8; 20],
            height: 10,
            header: vec![1, 2, 3],
        });
        assert!(msg.validate_basic().is_err());
    }

    #[test]
    fn tss_vote_uses_tss_signer_key() {
        let msg = CorechainMsg::VoteTss(MsgVoteTss {
            creator: "observer_a".into(),
            tss_pubkey: "pubkey".into(),
            keygen_height: 100,
            status: ReceiveStatus::Success,
        });
        assert_eq!(msg.key_type(), KeyType::TssSigner);
        assert!(msg.validate_basic().is_ok());
    }

    #[test]
    fn votes_use_observer_grantee_key() {
        let msg = CorechainMsg::from(sample_outbound("observer_a"));
        assert_eq!(msg.key_type(), KeyType::ObserverGrantee);
    }
}
