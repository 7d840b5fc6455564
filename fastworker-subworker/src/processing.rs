//! # Task Processing Loop
//!
//! One per priority endpoint. Identical in shape to the control plane's
//! local-execution path, without cache writes or subworker selection:
//! receive bytes, deserialize, execute, reply.

use std::sync::Arc;

use tracing::{error, warn};

use fastworker_exec::{execute, TaskRegistry};
use fastworker_shared::models::Task;
use fastworker_shared::serialization::{decode, encode, SerializationFormat};
use fastworker_transport::reqrep::ReqRepListener;

pub async fn run_processing_loop(
    registry: Arc<TaskRegistry>,
    listener: ReqRepListener,
    format: SerializationFormat,
) {
    loop {
        let mut conn = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                error!(error = %e, "processing listener accept failed");
                continue;
            }
        };

        let registry = registry.clone();
        tokio::spawn(async move {
            let bytes = match conn.recv().await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(error = %e, "failed to receive task");
                    return;
                }
            };

            let mut task: Task = match decode(&bytes, format) {
                Ok(task) => task,
                Err(e) => {
                    warn!(error = %e, "malformed task, dropping");
                    return;
                }
            };

            let result = execute(&registry, &mut task).await;

            match encode(&result, format) {
                Ok(bytes) => {
                    if let Err(e) = conn.send(&bytes).await {
                        warn!(error = %e, "failed to send task reply");
                    }
                }
                Err(e) => error!(error = %e, "failed to encode task reply"),
            }
            let _ = conn.close().await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastworker_shared::models::{TaskPriority, TaskResult};
    use fastworker_transport::reqrep::ReqRepDialer;
    use serde_json::Value;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_processing_loop_executes_and_replies() {
        let mut registry = TaskRegistry::new();
        registry.register_sync("add", |args, _| {
            Ok(Value::from(args[0].as_i64().unwrap() + args[1].as_i64().unwrap()))
        });
        let registry = Arc::new(registry);

        let listener = ReqRepListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(run_processing_loop(
            registry,
            listener,
            SerializationFormat::Json,
        ));

        let task = Task::new(
            "add",
            vec![Value::from(4), Value::from(5)],
            HashMap::new(),
            TaskPriority::Critical,
            None,
        );
        let mut conn = ReqRepDialer::dial(&addr).await.unwrap();
        conn.send(&encode(&task, SerializationFormat::Json).unwrap())
            .await
            .unwrap();
        let reply_bytes = conn.recv().await.unwrap();
        let result: TaskResult = decode(&reply_bytes, SerializationFormat::Json).unwrap();
        assert_eq!(result.result, Some(Value::from(9)));
    }
}
