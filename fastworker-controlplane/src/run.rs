//! # Control Plane Lifecycle
//!
//! Opens the six listening endpoints, starts every background loop, and
//! runs until a shutdown signal fires.

use std::sync::Arc;

use tracing::info;

use fastworker_exec::TaskRegistry;
use fastworker_shared::addr::BaseAddress;
use fastworker_shared::config::ControlPlaneConfig;
use fastworker_shared::error::{FastworkerError, FastworkerResult};
use fastworker_shared::models::TaskPriority;
use fastworker_transport::bus::BusListener;
use fastworker_transport::reqrep::ReqRepListener;

use crate::discovery::{run_announcer, run_bus_accept_loop};
use crate::query::run_query_loop;
use crate::registration::run_registration_loop;
use crate::state::ControlPlaneState;
use crate::submission::run_submission_loop;
use crate::sweepers::{run_cache_sweeper, run_liveness_sweeper};

/// Bind every endpoint and run the control plane until `shutdown` resolves.
pub async fn run(
    config: ControlPlaneConfig,
    registry: TaskRegistry,
    shutdown: impl std::future::Future<Output = ()>,
) -> FastworkerResult<()> {
    let base = BaseAddress::parse(&config.base_address)?;
    let format = config.common.format();

    let state = ControlPlaneState::new(
        config.worker_id.clone(),
        registry,
        config.cache_max_size,
        config.cache_ttl_seconds,
    );

    let mut submission_listeners = Vec::new();
    for priority in TaskPriority::ALL {
        let addr = base.priority_socket_addr(priority);
        let listener = ReqRepListener::bind(&addr)
            .await
            .map_err(|e| FastworkerError::Other(format!("bind {addr} failed: {e}")))?;
        submission_listeners.push((priority, listener));
    }

    let query_addr = base.socket_addr_with_offset(4);
    let query_listener = ReqRepListener::bind(&query_addr)
        .await
        .map_err(|e| FastworkerError::Other(format!("bind {query_addr} failed: {e}")))?;

    let registration_addr = base.socket_addr_with_offset(5);
    let registration_listener = ReqRepListener::bind(&registration_addr)
        .await
        .map_err(|e| FastworkerError::Other(format!("bind {registration_addr} failed: {e}")))?;

    let discovery_base = BaseAddress::parse(&config.common.discovery_address)?;
    let bus = Arc::new(
        BusListener::bind(&discovery_base.socket_addr())
            .await
            .map_err(|e| FastworkerError::Other(format!("bind discovery bus failed: {e}")))?,
    );

    info!(
        worker_id = %config.worker_id,
        base_address = %config.base_address,
        "control plane listening"
    );

    let mut handles = Vec::new();
    for (priority, listener) in submission_listeners {
        let state = state.clone();
        handles.push(tokio::spawn(run_submission_loop(
            state, listener, priority, format,
        )));
    }
    handles.push(tokio::spawn(run_query_loop(
        state.clone(),
        query_listener,
        format,
    )));
    handles.push(tokio::spawn(run_registration_loop(
        state.clone(),
        registration_listener,
        format,
    )));
    handles.push(tokio::spawn(run_bus_accept_loop(bus.clone())));
    handles.push(tokio::spawn(run_announcer(
        bus,
        config.worker_id.clone(),
        config.base_address.clone(),
    )));
    handles.push(tokio::spawn(run_liveness_sweeper(state.clone())));
    handles.push(tokio::spawn(run_cache_sweeper(state)));

    shutdown.await;
    info!("control plane shutdown signal received");
    for handle in handles {
        handle.abort();
    }
    Ok(())
}
