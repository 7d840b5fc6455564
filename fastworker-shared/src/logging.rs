//! # Logging
//!
//! `tracing-subscriber` init shared by every binary: env-filter driven,
//! defaulting to `info`, writing to stderr.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. Call once, at process start.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}
