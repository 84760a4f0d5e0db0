//! Nullable keyring: signs by serializing.

use std::collections::HashMap;

use parking_lot::Mutex;

use corelink_client::{KeyError, Keyring};
use corelink_types::{KeyType, SignedTx, UnsignedTx};

pub const OPERATOR_ADDRESS: &str = "core1operator";
pub const OBSERVER_GRANTEE_ADDRESS: &str = "core1observergrantee";
pub const TSS_SIGNER_ADDRESS: &str = "core1tsssigner";

/// A keyring whose "signature" is the bincode encoding of `(key_type, tx)`,
/// which [`NullCorechain`](crate::NullCorechain) decodes on broadcast.
pub struct NullKeyring {
    operator: String,
    grantees: Mutex<HashMap<KeyType, String>>,
    signed: Mutex<Vec<(KeyType, UnsignedTx)>>,
}

impl NullKeyring {
    pub fn new() -> Self {
        let grantees = HashMap::from([
            (KeyType::ObserverGrantee, OBSERVER_GRANTEE_ADDRESS.to_string()),
            (KeyType::TssSigner, TSS_SIGNER_ADDRESS.to_string()),
        ]);
        Self {
            operator: OPERATOR_ADDRESS.to_string(),
            grantees: Mutex::new(grantees),
            signed: Mutex::new(Vec::new()),
        }
    }

    /// Forget the key for `key_type`; signing with it then fails.
    pub fn remove_key(&self, key_type: KeyType) {
        self.grantees.lock().remove(&key_type);
    }

    /// Every transaction signed so far, in order.
    pub fn signed(&self) -> Vec<(KeyType, UnsignedTx)> {
        self.signed.lock().clone()
    }

    pub fn decode(tx: &SignedTx) -> Option<(KeyType, UnsignedTx)> {
        bincode::deserialize(&tx.bytes).ok()
    }
}

impl Default for NullKeyring {
    fn default() -> Self {
        Self::new()
    }
}

impl Keyring for NullKeyring {
    fn operator_address(&self) -> String {
        self.operator.clone()
    }

    fn grantee_address(&self, key_type: KeyType) -> Result<String, KeyError> {
        self.grantees
            .lock()
            .get(&key_type)
            .cloned()
            .ok_or(KeyError::Missing(key_type))
    }

    fn sign(&self, tx: &UnsignedTx, key_type: KeyType) -> Result<SignedTx, KeyError> {
        if !self.grantees.lock().contains_key(&key_type) {
            return Err(KeyError::Missing(key_type));
        }
        let bytes =
            bincode::serialize(&(key_type, tx)).map_err(|e| KeyError::Signing(e.to_string()))?;
        self.signed.lock().push((key_type, tx.clone()));
        Ok(SignedTx { bytes })
    }
}
