//! Client for submitting observer votes to the corechain.
//!
//! [`CorechainClient`] wraps every message in an authorization envelope for
//! the right grantee key, keeps per-key account sequences in step with the
//! chain, skips ballots the observer has already voted on, and watches each
//! vote until its result is known.

mod broadcast;
mod client;
pub mod config;
pub mod constants;
mod error;
pub mod keys;
pub mod metrics;
mod outbound;
mod pool;
mod query;
pub mod rpc;
mod subscribe;
mod vote;

pub use client::CorechainClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use keys::{KeyError, Keyring};
pub use metrics::ClientMetrics;
pub use outbound::{classify_outbound_broadcast_error, BroadcastErrorAction};
pub use rpc::{CorechainRpc, RpcError};
pub use vote::MonitorError;
