//! # Discovery Announcer
//!
//! Emits `WORKER_ANNOUNCE:<worker_id>:<base_address>` on the discovery bus
//! at startup and every 2 seconds thereafter.

use std::time::Duration;

use tracing::error;

use fastworker_shared::discovery::format_announcement;
use fastworker_transport::bus::BusListener;

const ANNOUNCE_INTERVAL: Duration = Duration::from_secs(2);

pub async fn run_announcer(
    bus: std::sync::Arc<BusListener>,
    worker_id: String,
    base_address: String,
) {
    let message = format_announcement(&worker_id, &base_address);
    let mut interval = tokio::time::interval(ANNOUNCE_INTERVAL);
    loop {
        interval.tick().await;
        if let Err(e) = bus.send(message.as_bytes()) {
            error!(error = %e, "failed to emit discovery announcement");
        }
    }
}

/// Accept loop for the discovery bus listener; must run alongside the
/// announcer so dialing clients and subworkers can connect.
pub async fn run_bus_accept_loop(bus: std::sync::Arc<BusListener>) {
    loop {
        if let Err(e) = bus.accept().await {
            error!(error = %e, "discovery bus accept failed");
        }
    }
}
