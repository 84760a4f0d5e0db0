//! Authorization envelope for broadcasting on behalf of the operator.
//!
//! Observers never hold the operator's cold key. Instead a hot grantee key is
//! authorized on-chain to execute messages for the operator, and every message
//! is wrapped in an [`AuthzEnvelope`] naming that grantee.

use serde::{Deserialize, Serialize};

use crate::error::MsgError;
use crate::keys::KeyType;
use crate::msg::CorechainMsg;

/// The delegated identity that signs a wrapped message.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthzSigner {
    pub key_type: KeyType,
    pub grantee_address: String,
}

/// Executes the inner messages with the authority granted to `grantee`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthzEnvelope {
    pub grantee: String,
    pub msgs: Vec<CorechainMsg>,
}

impl AuthzEnvelope {
    pub const TYPE_URL: &'static str = "/cosmos.authz.v1beta1.MsgExec";
}

/// Validate `msg` and wrap it for execution by `signer`.
pub fn wrap_with_authz(msg: CorechainMsg, signer: &AuthzSigner) -> Result<AuthzEnvelope, MsgError> {
    wrap_batch_with_authz(vec![msg], signer)
}

/// Validate every message and wrap them into a single envelope.
///
/// All messages must be authorized for the signer's key type.
pub fn wrap_batch_with_authz(
    msgs: Vec<CorechainMsg>,
    signer: &AuthzSigner,
) -> Result<AuthzEnvelope, MsgError> {
    if msgs.is_empty() {
        return Err(MsgError::EmptyBatch);
    }
    for msg in &msgs {
        msg.validate_basic()?;
        if msg.key_type() != signer.key_type {
            return Err(MsgError::MixedKeyTypes {
                expected: signer.key_type.to_string(),
                found: msg.key_type().to_string(),
            });
        }
    }
    Ok(AuthzEnvelope {
        grantee: signer.grantee_address.clone(),
        msgs,
    })
}
