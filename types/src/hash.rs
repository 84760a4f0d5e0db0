//! Blake2b digests for ballot identification.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;

type Blake2b256 = Blake2b<U32>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Deterministic identifier of one cross-chain claim being voted on.
///
/// Every observer voting on the same claim derives the same index, which is
/// what lets the corechain tally votes into a single ballot.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BallotIndex(String);

impl BallotIndex {
    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self(hex::encode(digest))
    }

    /// Wrap an already hex-encoded index (e.g. read back from a query).
    pub fn from_hex(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BallotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.0.get(..8).unwrap_or(&self.0);
        write!(f, "BallotIndex({short})")
    }
}

impl fmt::Display for BallotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake2b_deterministic() {
        assert_eq!(blake2b_256(b"ballot"), blake2b_256(b"ballot"));
    }

    #[test]
    fn blake2b_different_inputs() {
        assert_ne!(blake2b_256(b"inbound"), blake2b_256(b"outbound"));
    }

    #[test]
    fn ballot_index_is_lowercase_hex() {
        let index = BallotIndex::from_digest([0xab; 32]);
        assert_eq!(index.as_str().len(), 64);
        assert!(index.as_str().starts_with("abab"));
    }

    #[test]
    fn debug_is_abbreviated() {
        let index = BallotIndex::from_digest([0x01; 32]);
        assert_eq!(format!("{index:?}"), "BallotIndex(01010101)");
    }
}
