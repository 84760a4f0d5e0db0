//! External chain classification.

/// Broad family of an external chain, keyed by its chain id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainFamily {
    Evm,
    Bitcoin,
    Other,
}

const EVM_CHAIN_IDS: &[i64] = &[1, 5, 56, 97, 137, 1337, 8453, 11155111, 80001, 80002, 84532];
const BITCOIN_CHAIN_IDS: &[i64] = &[8332, 18332, 18333, 18444];

impl ChainFamily {
    pub fn of(chain_id: i64) -> Self {
        if EVM_CHAIN_IDS.contains(&chain_id) {
            Self::Evm
        } else if BITCOIN_CHAIN_IDS.contains(&chain_id) {
            Self::Bitcoin
        } else {
            Self::Other
        }
    }
}
