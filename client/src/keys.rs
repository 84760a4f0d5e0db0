//! Hot keys used to sign on behalf of the operator.

use thiserror::Error;

use corelink_types::{KeyType, SignedTx, UnsignedTx};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("no key loaded for {0}")]
    Missing(KeyType),

    #[error("signing failed: {0}")]
    Signing(String),
}

pub trait Keyring: Send + Sync {
    /// Address of the operator that every vote is cast for.
    fn operator_address(&self) -> String;

    /// Address of the grantee key authorized for `key_type`.
    fn grantee_address(&self, key_type: KeyType) -> Result<String, KeyError>;

    fn sign(&self, tx: &UnsignedTx, key_type: KeyType) -> Result<SignedTx, KeyError>;
}
