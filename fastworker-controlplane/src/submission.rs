//! # Submission Handling Loop
//!
//! One loop per priority endpoint. Deserializes a Task, selects a
//! subworker, forwards and relays the reply, falling back to local
//! execution when no subworker is available or forwarding fails.

use tracing::{error, warn};

use fastworker_exec::execute;
use fastworker_shared::models::{Task, TaskPriority, TaskResult};
use fastworker_shared::serialization::{decode, encode, SerializationFormat};
use fastworker_transport::reqrep::{ReqRepDialer, ReqRepListener};
use fastworker_shared::addr::BaseAddress;

use crate::state::ControlPlaneState;

pub async fn run_submission_loop(
    state: ControlPlaneState,
    listener: ReqRepListener,
    priority: TaskPriority,
    format: SerializationFormat,
) {
    loop {
        let mut conn = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                error!(?priority, error = %e, "submission listener accept failed");
                continue;
            }
        };

        let state = state.clone();
        tokio::spawn(async move {
            let request_bytes = match conn.recv().await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(error = %e, "failed to receive submission");
                    return;
                }
            };

            let mut task: Task = match decode(&request_bytes, format) {
                Ok(task) => task,
                Err(e) => {
                    warn!(error = %e, "malformed submission, dropping");
                    return;
                }
            };

            let result = handle_submission(&state, &mut task, format).await;

            match encode(&result, format) {
                Ok(bytes) => {
                    if let Err(e) = conn.send(&bytes).await {
                        warn!(error = %e, "failed to send submission reply");
                    }
                }
                Err(e) => error!(error = %e, "failed to encode submission reply"),
            }
            let _ = conn.close().await;
        });
    }
}

async fn handle_submission(
    state: &ControlPlaneState,
    task: &mut Task,
    format: SerializationFormat,
) -> TaskResult {
    let selected = state.subworkers.lock().await.select().cloned();

    if let Some(subworker) = selected {
        state.subworkers.lock().await.increment_load(&subworker.id);

        let forwarded = forward_to_subworker(&subworker.address, task, format).await;
        state.subworkers.lock().await.decrement_load(&subworker.id);

        match forwarded {
            Ok(result) => {
                state.cache.lock().await.store(result.clone());
                return result;
            }
            Err(e) => {
                warn!(subworker_id = %subworker.id, error = %e, "forwarding failed, requeueing and executing locally");
                state.requeue.lock().await.push_front(task.clone());
            }
        }
    }

    let result = execute(&state.registry, task).await;
    state.cache.lock().await.store(result.clone());
    result
}

async fn forward_to_subworker(
    subworker_base_address: &str,
    task: &Task,
    format: SerializationFormat,
) -> Result<TaskResult, fastworker_transport::TransportError> {
    let base = BaseAddress::parse(subworker_base_address)
        .map_err(|_| fastworker_transport::TransportError::NotConnected)?;
    let endpoint = base.priority_socket_addr(task.priority);

    let mut conn = ReqRepDialer::dial(&endpoint).await?;
    let bytes = encode(task, format).map_err(|_| fastworker_transport::TransportError::NotConnected)?;
    conn.send(&bytes).await?;
    let reply = conn.recv().await?;
    conn.close().await?;

    decode(&reply, format).map_err(|_| fastworker_transport::TransportError::NotConnected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastworker_exec::TaskRegistry;
    use serde_json::Value;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_local_execution_fallback_when_no_subworker() {
        let mut registry = TaskRegistry::new();
        registry.register_sync("add", |args, _| {
            Ok(Value::from(args[0].as_i64().unwrap() + args[1].as_i64().unwrap()))
        });
        let state = ControlPlaneState::new("cp-1", registry, 10, 60);
        let mut task = Task::new(
            "add",
            vec![Value::from(2), Value::from(3)],
            HashMap::new(),
            TaskPriority::Normal,
            None,
        );

        let result = handle_submission(&state, &mut task, SerializationFormat::Json).await;
        assert_eq!(result.result, Some(Value::from(5)));
        assert!(state.cache.lock().await.get(&task.id).is_some());
    }
}
