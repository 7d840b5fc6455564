//! Thin wrapper binary for running a control plane as a standalone process.

use tokio::signal;
use tracing::{error, info};

use fastworker_exec::TaskRegistry;
use fastworker_shared::{config::ControlPlaneConfig, logging};

fn demo_registry() -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    registry.register_sync("add", |args, _kwargs| {
        let a = args.first().and_then(|v| v.as_i64()).unwrap_or(0);
        let b = args.get(1).and_then(|v| v.as_i64()).unwrap_or(0);
        Ok(serde_json::Value::from(a + b))
    });
    registry
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let config = ControlPlaneConfig::from_env();
    info!(worker_id = %config.worker_id, base_address = %config.base_address, "starting control plane");

    if let Err(e) = fastworker_controlplane::run(config, demo_registry(), shutdown_signal()).await
    {
        error!(error = %e, "control plane exited with error");
        std::process::exit(1);
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C"),
        _ = terminate => info!("received SIGTERM"),
    }
}
