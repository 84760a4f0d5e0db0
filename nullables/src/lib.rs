//! Nullable infrastructure for deterministic testing.
//!
//! [`NullCorechain`] and [`NullKeyring`] stand in for the consensus chain and
//! the hot-key store. Both record what they were asked to do and can be
//! scripted to fail, so client behaviour is tested without a network.

pub mod corechain;
pub mod keyring;

use std::sync::Arc;

use corelink_client::{ClientConfig, ClientError, CorechainClient};

pub use corechain::NullCorechain;
pub use keyring::NullKeyring;

/// A client wired to fresh nullables.
pub struct NullHarness {
    pub client: CorechainClient,
    pub chain: Arc<NullCorechain>,
    pub keys: Arc<NullKeyring>,
}

impl NullHarness {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let chain = Arc::new(NullCorechain::new());
        let keys = Arc::new(NullKeyring::new());
        let client = CorechainClient::new(config, chain.clone(), keys.clone())?;
        Ok(Self {
            client,
            chain,
            keys,
        })
    }
}

/// Config with millisecond-scale retry and monitor intervals.
pub fn fast_config() -> ClientConfig {
    ClientConfig {
        broadcast_max_retries: 2,
        broadcast_initial_backoff_ms: 1,
        broadcast_max_backoff_ms: 2,
        monitor_interval_ms: 5,
        monitor_max_retries: 3,
        ..ClientConfig::default()
    }
}
