use thiserror::Error;

use corelink_client::ClientError;
use corelink_retry::ContextError;

#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid version {version}: {reason}")]
    Version { version: String, reason: String },

    #[error("new block stream closed before height {0}")]
    StreamClosed(i64),

    #[error("{0}")]
    Context(#[source] ContextError),

    #[error("signal handler error: {0}")]
    Signal(#[from] std::io::Error),
}

impl From<ContextError> for MaintenanceError {
    fn from(e: ContextError) -> Self {
        Self::Context(e)
    }
}
