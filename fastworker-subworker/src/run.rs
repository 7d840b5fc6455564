//! # Subworker Lifecycle
//!
//! Opens four priority listeners, dials the control plane's management
//! port for registration/heartbeats, dials the discovery bus
//! (informational only), and runs until a shutdown signal fires.

use std::sync::Arc;

use tracing::info;

use fastworker_exec::TaskRegistry;
use fastworker_shared::addr::BaseAddress;
use fastworker_shared::config::SubworkerConfig;
use fastworker_shared::error::{FastworkerError, FastworkerResult};
use fastworker_shared::models::TaskPriority;
use fastworker_transport::bus::BusDialer;
use fastworker_transport::reqrep::ReqRepListener;

use crate::heartbeat::{run_heartbeat_loop, RegistrationFlag};
use crate::processing::run_processing_loop;

pub async fn run(
    config: SubworkerConfig,
    registry: TaskRegistry,
    shutdown: impl std::future::Future<Output = ()>,
) -> FastworkerResult<()> {
    let base = BaseAddress::parse(&config.base_address)?;
    let control_plane_base = BaseAddress::parse(&config.control_plane_address)?;
    let format = config.common.format();
    let registry = Arc::new(registry);

    let mut processing_listeners = Vec::new();
    for priority in TaskPriority::ALL {
        let addr = base.priority_socket_addr(priority);
        let listener = ReqRepListener::bind(&addr)
            .await
            .map_err(|e| FastworkerError::Other(format!("bind {addr} failed: {e}")))?;
        processing_listeners.push((priority, listener));
    }

    info!(
        worker_id = %config.worker_id,
        base_address = %config.base_address,
        "subworker listening"
    );

    let mut handles = Vec::new();
    for (_priority, listener) in processing_listeners {
        handles.push(tokio::spawn(run_processing_loop(
            registry.clone(),
            listener,
            format,
        )));
    }

    let management_addr =
        control_plane_base.socket_addr_with_offset(config.management_port_offset);
    let flag = RegistrationFlag::default();
    handles.push(tokio::spawn(run_heartbeat_loop(
        flag,
        management_addr,
        config.worker_id.clone(),
        config.base_address.clone(),
        format,
    )));

    if let Ok(discovery_base) = BaseAddress::parse(&config.common.discovery_address) {
        let discovery_addr = discovery_base.socket_addr();
        handles.push(tokio::spawn(async move {
            match BusDialer::dial(&discovery_addr).await {
                Ok(mut dialer) => loop {
                    if dialer.recv().await.is_err() {
                        break;
                    }
                },
                Err(e) => {
                    tracing::warn!(error = %e, "discovery bus dial failed");
                }
            }
        }));
    }

    shutdown.await;
    info!("subworker shutdown signal received");
    for handle in handles {
        handle.abort();
    }
    Ok(())
}
