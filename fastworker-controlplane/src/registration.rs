//! # Subworker Registration / Heartbeat Loop
//!
//! Reads on the management port (base + 5). Accepts
//! `{subworker_id, address, status, heartbeat?}` and always replies
//! `{status: "registered", subworker_id}`.

use tracing::warn;

use fastworker_shared::models::{RegistrationRequest, RegistrationResponse};
use fastworker_shared::serialization::{decode, encode, SerializationFormat};
use fastworker_transport::reqrep::ReqRepListener;

use crate::state::ControlPlaneState;

pub async fn run_registration_loop(
    state: ControlPlaneState,
    listener: ReqRepListener,
    format: SerializationFormat,
) {
    loop {
        let mut conn = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "registration listener accept failed");
                continue;
            }
        };

        let state = state.clone();
        tokio::spawn(async move {
            let bytes = match conn.recv().await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(error = %e, "failed to receive registration message");
                    return;
                }
            };

            let request: RegistrationRequest = match decode(&bytes, format) {
                Ok(req) => req,
                Err(e) => {
                    warn!(error = %e, "malformed registration message, dropping");
                    return;
                }
            };

            let active = request.status == "active";
            state
                .subworkers
                .lock()
                .await
                .upsert(&request.subworker_id, &request.address, active);

            let response = RegistrationResponse::registered(&request.subworker_id);
            match encode(&response, format) {
                Ok(bytes) => {
                    if let Err(e) = conn.send(&bytes).await {
                        warn!(error = %e, "failed to send registration ack");
                    }
                }
                Err(e) => warn!(error = %e, "failed to encode registration ack"),
            }
            let _ = conn.close().await;
        });
    }
}
