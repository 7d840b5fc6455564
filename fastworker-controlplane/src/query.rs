//! # Result Query Loop
//!
//! Reads on P+4. Accepts `{task_id}`, replies `{found, result}` or
//! `{found: false, error}`.

use tracing::warn;

use fastworker_shared::models::{ResultQueryRequest, ResultQueryResponse};
use fastworker_shared::serialization::{decode, encode, SerializationFormat};
use fastworker_transport::reqrep::ReqRepListener;

use crate::state::ControlPlaneState;

pub async fn run_query_loop(
    state: ControlPlaneState,
    listener: ReqRepListener,
    format: SerializationFormat,
) {
    loop {
        let mut conn = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "query listener accept failed");
                continue;
            }
        };

        let state = state.clone();
        tokio::spawn(async move {
            let response = match conn.recv().await {
                Ok(bytes) => match decode::<ResultQueryRequest>(&bytes, format) {
                    Ok(req) if !req.task_id.is_empty() => {
                        match state.cache.lock().await.get(&req.task_id) {
                            Some(result) => ResultQueryResponse::found(result),
                            None => ResultQueryResponse::not_found("Task not found"),
                        }
                    }
                    Ok(_) | Err(_) => ResultQueryResponse::not_found("Missing task_id"),
                },
                Err(e) => {
                    warn!(error = %e, "failed to receive query request");
                    return;
                }
            };

            match encode(&response, format) {
                Ok(bytes) => {
                    if let Err(e) = conn.send(&bytes).await {
                        warn!(error = %e, "failed to send query reply");
                    }
                }
                Err(e) => warn!(error = %e, "failed to encode query reply"),
            }
            let _ = conn.close().await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastworker_exec::TaskRegistry;
    use fastworker_shared::models::TaskResult;
    use fastworker_transport::reqrep::ReqRepDialer;

    #[tokio::test]
    async fn test_query_found_and_not_found() {
        let state = ControlPlaneState::new("cp-1", TaskRegistry::new(), 10, 60);
        state
            .cache
            .lock()
            .await
            .store(TaskResult::pending("t1"));

        let listener = ReqRepListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(run_query_loop(state, listener, SerializationFormat::Json));

        let mut conn = ReqRepDialer::dial(&addr).await.unwrap();
        conn.send(
            &encode(
                &ResultQueryRequest {
                    task_id: "t1".to_string(),
                },
                SerializationFormat::Json,
            )
            .unwrap(),
        )
        .await
        .unwrap();
        let reply_bytes = conn.recv().await.unwrap();
        let reply: ResultQueryResponse = decode(&reply_bytes, SerializationFormat::Json).unwrap();
        match reply {
            ResultQueryResponse::Found { found, .. } => assert!(found),
            ResultQueryResponse::NotFound { .. } => panic!("expected found"),
        }
        conn.close().await.unwrap();

        let mut conn2 = ReqRepDialer::dial(&addr).await.unwrap();
        conn2
            .send(
                &encode(
                    &ResultQueryRequest {
                        task_id: "missing".to_string(),
                    },
                    SerializationFormat::Json,
                )
                .unwrap(),
            )
            .await
            .unwrap();
        let reply_bytes = conn2.recv().await.unwrap();
        let reply: ResultQueryResponse = decode(&reply_bytes, SerializationFormat::Json).unwrap();
        match reply {
            ResultQueryResponse::Found { .. } => panic!("expected not found"),
            ResultQueryResponse::NotFound { found, .. } => assert!(!found),
        }
    }
}
