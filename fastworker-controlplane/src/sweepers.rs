//! # Background Sweepers
//!
//! Liveness sweep (subworker registry, every 5s) and cache sweep (result
//! cache, every 60s). Both are purely for reclaiming state; correctness of
//! `select`/`get` does not depend on them running promptly.

use std::time::Duration;

use tracing::debug;

use crate::state::ControlPlaneState;

const LIVENESS_SWEEP_INTERVAL: Duration = Duration::from_secs(5);
const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub async fn run_liveness_sweeper(state: ControlPlaneState) {
    let mut interval = tokio::time::interval(LIVENESS_SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        let marked = state.subworkers.lock().await.sweep_stale();
        if marked > 0 {
            debug!(marked, "liveness sweep marked subworkers inactive");
        }
    }
}

pub async fn run_cache_sweeper(state: ControlPlaneState) {
    let mut interval = tokio::time::interval(CACHE_SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        let removed = state.cache.lock().await.sweep_expired();
        if removed > 0 {
            debug!(removed, "cache sweep removed expired entries");
        }
    }
}
