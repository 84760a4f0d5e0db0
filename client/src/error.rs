use thiserror::Error;

use corelink_retry::{ContextError, RetryError};
use corelink_types::MsgError;

use crate::keys::KeyError;
use crate::rpc::RpcError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("config error: {0}")]
    Config(String),

    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),

    #[error("key error: {0}")]
    Key(#[from] KeyError),

    #[error("invalid message: {0}")]
    Msg(#[from] MsgError),

    #[error("broadcast rejected with code {code}: {raw_log}")]
    BroadcastRejected { code: u32, raw_log: String },

    #[error("{0}")]
    Context(#[source] ContextError),

    #[error("{context}: {source}")]
    Retry {
        context: &'static str,
        #[source]
        source: RetryError<Box<ClientError>>,
    },
}

impl From<ContextError> for ClientError {
    fn from(e: ContextError) -> Self {
        Self::Context(e)
    }
}

impl ClientError {
    pub(crate) fn retry(context: &'static str, source: RetryError<ClientError>) -> Self {
        let source = match source {
            RetryError::Fatal(e) => RetryError::Fatal(Box::new(e)),
            RetryError::LimitExceeded { attempts, last } => RetryError::LimitExceeded {
                attempts,
                last: Box::new(last),
            },
        };
        Self::Retry { context, source }
    }

    /// The innermost error, looking through retry wrappers.
    pub fn root(&self) -> &ClientError {
        match self {
            Self::Retry { source, .. } => source.inner().root(),
            other => other,
        }
    }

    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, Self::Retry { source, .. } if source.is_limit_exceeded())
    }
}
