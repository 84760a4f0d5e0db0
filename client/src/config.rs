//! Client configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use backoff::backoff::Constant;
use backoff::ExponentialBackoff;
use corelink_retry::{constant_backoff, exponential_backoff, MaxRetries};
use corelink_utils::LogFormat;

use crate::ClientError;

/// Configuration for a [`CorechainClient`](crate::CorechainClient).
///
/// Loaded from a TOML file via [`ClientConfig::from_toml_file`] or built
/// programmatically.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Corechain chain id embedded in every transaction.
    #[serde(default = "default_chain_id")]
    pub chain_id: String,

    /// Denomination fees are paid in.
    #[serde(default = "default_fee_denom")]
    pub fee_denom: String,

    /// Discount on the base gas price, in basis points (100 = 0.01).
    #[serde(default = "default_gas_price_reduction_rate_bps")]
    pub gas_price_reduction_rate_bps: u32,

    /// Retries after the first broadcast attempt.
    #[serde(default = "default_broadcast_max_retries")]
    pub broadcast_max_retries: u32,

    #[serde(default = "default_broadcast_initial_backoff_ms")]
    pub broadcast_initial_backoff_ms: u64,

    #[serde(default = "default_broadcast_max_backoff_ms")]
    pub broadcast_max_backoff_ms: u64,

    /// Interval between vote-result polls.
    #[serde(default = "default_monitor_interval_ms")]
    pub monitor_interval_ms: u64,

    #[serde(default = "default_monitor_max_retries")]
    pub monitor_max_retries: u32,

    /// Channel capacity of each new-block subscriber.
    #[serde(default = "default_block_subscriber_buffer")]
    pub block_subscriber_buffer: usize,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_chain_id() -> String {
    "corechain_7000-1".to_string()
}

fn default_fee_denom() -> String {
    "acore".to_string()
}

fn default_gas_price_reduction_rate_bps() -> u32 {
    100
}

fn default_broadcast_max_retries() -> u32 {
    5
}

fn default_broadcast_initial_backoff_ms() -> u64 {
    250
}

fn default_broadcast_max_backoff_ms() -> u64 {
    3_000
}

fn default_monitor_interval_ms() -> u64 {
    5_000
}

fn default_monitor_max_retries() -> u32 {
    20
}

fn default_block_subscriber_buffer() -> usize {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, ClientError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ClientError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ClientError> {
        let config: Self = toml::from_str(s).map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ClientError> {
        toml::to_string_pretty(self).map_err(|e| ClientError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.chain_id.is_empty() {
            return Err(ClientError::Config("chain_id must not be empty".into()));
        }
        if self.fee_denom.is_empty() {
            return Err(ClientError::Config("fee_denom must not be empty".into()));
        }
        if self.gas_price_reduction_rate_bps == 0 || self.gas_price_reduction_rate_bps > 10_000 {
            return Err(ClientError::Config(format!(
                "gas_price_reduction_rate_bps must be in 1..=10000, got {}",
                self.gas_price_reduction_rate_bps
            )));
        }
        if self.block_subscriber_buffer == 0 {
            return Err(ClientError::Config(
                "block_subscriber_buffer must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Install the global tracing subscriber described by `log_format` and
    /// `log_level`.
    pub fn init_logging(&self) -> Result<(), ClientError> {
        corelink_utils::init_logging(self.log_format, &self.log_level)
            .map_err(|e| ClientError::Config(e.to_string()))
    }

    pub(crate) fn broadcast_backoff(&self) -> MaxRetries<ExponentialBackoff> {
        exponential_backoff(
            Duration::from_millis(self.broadcast_initial_backoff_ms),
            Duration::from_millis(self.broadcast_max_backoff_ms),
            self.broadcast_max_retries,
        )
    }

    pub(crate) fn monitor_backoff(&self) -> MaxRetries<Constant> {
        constant_backoff(
            Duration::from_millis(self.monitor_interval_ms),
            self.monitor_max_retries,
        )
    }

    pub(crate) fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            fee_denom: default_fee_denom(),
            gas_price_reduction_rate_bps: default_gas_price_reduction_rate_bps(),
            broadcast_max_retries: default_broadcast_max_retries(),
            broadcast_initial_backoff_ms: default_broadcast_initial_backoff_ms(),
            broadcast_max_backoff_ms: default_broadcast_max_backoff_ms(),
            monitor_interval_ms: default_monitor_interval_ms(),
            monitor_max_retries: default_monitor_max_retries(),
            block_subscriber_buffer: default_block_subscriber_buffer(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}
