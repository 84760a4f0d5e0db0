//! Message validation errors.

use thiserror::Error;

/// Raised when a message fails basic validation or cannot be wrapped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MsgError {
    #[error("{type_url} invalid msg: {reason}")]
    Invalid { type_url: &'static str, reason: String },

    #[error("empty message batch")]
    EmptyBatch,

    #[error("batch mixes key types: expected {expected}, found {found}")]
    MixedKeyTypes { expected: String, found: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl MsgError {
    pub fn invalid(type_url: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            type_url,
            reason: reason.into(),
        }
    }
}
