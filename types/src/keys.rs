//! Signing identities used for authorized broadcasts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which hot key signs a given message on behalf of the operator.
///
/// Each key type owns its own account on the corechain and therefore its own
/// sequence counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyType {
    /// Grantee key used for observation votes and reports.
    ObserverGrantee,
    /// Key held by the TSS signer process; votes on key generation results.
    TssSigner,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ObserverGrantee => "observer_grantee",
            Self::TssSigner => "tss_signer",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
