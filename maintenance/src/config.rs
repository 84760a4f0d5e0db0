//! Maintenance listener configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::MaintenanceError;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// Interval between corechain polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_poll_interval_ms() -> u64 {
    10_000
}

// ── Impl ───────────────────────────────────────────────────────────────

impl MaintenanceConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, MaintenanceError> {
        let config: Self =
            toml::from_str(s).map_err(|e| MaintenanceError::Config(e.to_string()))?;
        if config.poll_interval_ms == 0 {
            return Err(MaintenanceError::Config(
                "poll_interval_ms must be positive".into(),
            ));
        }
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}
