//! # fastworker-client
//!
//! Discovers control planes via the gossip bus, submits tasks
//! non-blocking, retries with backoff, and queries results.

pub mod client;
pub mod discovery;
pub mod drainer;
pub mod query;
pub mod state;
pub mod submission;

pub use client::Client;
pub use state::ClientState;
