//! # Registration / Heartbeat
//!
//! At start, register with the control plane and await an ack with a 5s
//! timeout. Every 10s thereafter, if registered, send a heartbeat and wait
//! up to 1s for an ack; a missing ack does not unregister, only an
//! explicit non-"registered" status does. If not registered, a full
//! registration attempt runs on the next tick instead.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use fastworker_shared::models::{RegistrationRequest, RegistrationResponse};
use fastworker_shared::serialization::{decode, encode, SerializationFormat};
use fastworker_transport::reqrep::ReqRepDialer;

const REGISTRATION_TIMEOUT: Duration = Duration::from_secs(5);
const HEARTBEAT_ACK_TIMEOUT: Duration = Duration::from_secs(1);
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Shared registered/unregistered flag, read by the task processing loops
/// only for diagnostics (processing does not require registration).
#[derive(Clone, Default)]
pub struct RegistrationFlag(Arc<AtomicBool>);

impl RegistrationFlag {
    pub fn is_registered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn set(&self, value: bool) {
        self.0.store(value, Ordering::SeqCst);
    }
}

/// Outcome of one registration/heartbeat attempt. `Unreachable` covers
/// every failure short of an explicit non-"registered" reply: dial
/// failure, send failure, ack timeout, or a malformed ack.
enum AckOutcome {
    Registered,
    Rejected,
    Unreachable,
}

async fn send_registration(
    control_plane_management_addr: &str,
    subworker_id: &str,
    address: &str,
    heartbeat: bool,
    timeout: Duration,
    format: SerializationFormat,
) -> AckOutcome {
    let request = RegistrationRequest {
        subworker_id: subworker_id.to_string(),
        address: address.to_string(),
        status: "active".to_string(),
        heartbeat,
    };

    let mut conn = match ReqRepDialer::dial_timeout(control_plane_management_addr, timeout).await
    {
        Ok(conn) => conn,
        Err(e) => {
            warn!(error = %e, "registration dial failed");
            return AckOutcome::Unreachable;
        }
    };

    let bytes = match encode(&request, format) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "failed to encode registration request");
            return AckOutcome::Unreachable;
        }
    };

    if let Err(e) = conn.send(&bytes).await {
        warn!(error = %e, "failed to send registration request");
        return AckOutcome::Unreachable;
    }

    let reply = match tokio::time::timeout(timeout, conn.recv()).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => {
            warn!(error = %e, "failed to receive registration ack");
            return AckOutcome::Unreachable;
        }
        Err(_) => {
            warn!("registration ack timed out");
            return AckOutcome::Unreachable;
        }
    };

    let _ = conn.close().await;

    match decode::<RegistrationResponse>(&reply, format) {
        Ok(resp) if resp.status == "registered" => AckOutcome::Registered,
        Ok(resp) => {
            warn!(status = %resp.status, "control plane rejected registration");
            AckOutcome::Rejected
        }
        Err(e) => {
            warn!(error = %e, "malformed registration ack");
            AckOutcome::Unreachable
        }
    }
}

/// Run the registration/heartbeat loop until the process shuts down.
pub async fn run_heartbeat_loop(
    flag: RegistrationFlag,
    control_plane_management_addr: String,
    subworker_id: String,
    address: String,
    format: SerializationFormat,
) {
    let outcome = send_registration(
        &control_plane_management_addr,
        &subworker_id,
        &address,
        false,
        REGISTRATION_TIMEOUT,
        format,
    )
    .await;
    let registered = matches!(outcome, AckOutcome::Registered);
    flag.set(registered);
    if registered {
        info!(subworker_id = %subworker_id, "registered with control plane");
    }

    let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
    interval.tick().await; // consume the immediate first tick

    loop {
        interval.tick().await;

        if flag.is_registered() {
            let outcome = send_registration(
                &control_plane_management_addr,
                &subworker_id,
                &address,
                true,
                HEARTBEAT_ACK_TIMEOUT,
                format,
            )
            .await;
            // missing ack is tolerated; only an explicit rejection unregisters.
            match outcome {
                AckOutcome::Registered => flag.set(true),
                AckOutcome::Rejected => flag.set(false),
                AckOutcome::Unreachable => {}
            }
        } else {
            let outcome = send_registration(
                &control_plane_management_addr,
                &subworker_id,
                &address,
                false,
                REGISTRATION_TIMEOUT,
                format,
            )
            .await;
            let registered = matches!(outcome, AckOutcome::Registered);
            flag.set(registered);
            if registered {
                info!(subworker_id = %subworker_id, "re-registered with control plane");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastworker_transport::reqrep::ReqRepListener;

    #[tokio::test]
    async fn test_registration_sets_flag() {
        let listener = ReqRepListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let mut conn = listener.accept().await.unwrap();
            let _ = conn.recv().await.unwrap();
            let resp = RegistrationResponse::registered("w1");
            conn.send(&encode(&resp, SerializationFormat::Json).unwrap())
                .await
                .unwrap();
        });

        let outcome = send_registration(
            &addr,
            "w1",
            "tcp://127.0.0.1:5655",
            false,
            REGISTRATION_TIMEOUT,
            SerializationFormat::Json,
        )
        .await;
        assert!(matches!(outcome, AckOutcome::Registered));
    }

    #[tokio::test]
    async fn test_registration_dial_failure_is_unreachable() {
        let outcome = send_registration(
            "127.0.0.1:1",
            "w1",
            "tcp://127.0.0.1:5655",
            false,
            Duration::from_millis(50),
            SerializationFormat::Json,
        )
        .await;
        assert!(matches!(outcome, AckOutcome::Unreachable));
    }
}
