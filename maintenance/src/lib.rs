//! Listeners that stop the observer when the corechain asks it to.
//!
//! Each listener polls the corechain in a named background task. When it
//! decides the observer must restart it triggers the shared
//! [`ShutdownController`]; a listener that fails or panics triggers it too,
//! since the observer can no longer tell whether it should be running.

pub mod config;
mod error;
mod height;
pub mod shutdown;
mod shutdown_listener;
mod tss_listener;

pub use config::MaintenanceConfig;
pub use error::MaintenanceError;
pub use height::wait_for_height;
pub use shutdown::ShutdownController;
pub use shutdown_listener::{FlagDecision, ShutdownListener};
pub use tss_listener::TssListener;
