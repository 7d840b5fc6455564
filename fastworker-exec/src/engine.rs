//! # Execution Engine
//!
//! Shared by the control plane's local-execution fallback and the
//! subworker's task processing loops: look the task name up in the
//! registry, dispatch sync or async, stamp lifecycle timestamps, and fire
//! the optional one-shot completion callback.

use chrono::Utc;
use tracing::warn;

use fastworker_shared::models::{CallbackPayload, Task, TaskResult};
use fastworker_transport::pair::PairDialer;

use crate::registry::{TaskFn, TaskRegistry};

/// Execute `task` against `registry`, returning the resulting `TaskResult`.
/// Mutates `task`'s lifecycle fields in place so callers that hold onto the
/// `Task` observe the same status history.
pub async fn execute(registry: &TaskRegistry, task: &mut Task) -> TaskResult {
    task.mark_started();

    match registry.get(&task.name).cloned() {
        None => {
            task.mark_failure(format!("Task {} not found", task.name));
        }
        Some(TaskFn::Sync(f)) => {
            let args = task.args.clone();
            let kwargs = task.kwargs.clone();
            let outcome = tokio::task::spawn_blocking(move || f(args, kwargs))
                .await
                .unwrap_or_else(|e| Err(format!("task panicked: {e}")));
            apply_outcome(task, outcome);
        }
        Some(TaskFn::Async(f)) => {
            let outcome = f(task.args.clone(), task.kwargs.clone()).await;
            apply_outcome(task, outcome);
        }
    }

    let result = TaskResult::from_task(task);
    fire_callback(task, &result).await;
    result
}

fn apply_outcome(task: &mut Task, outcome: Result<serde_json::Value, String>) {
    match outcome {
        Ok(value) => task.mark_success(value),
        Err(error) => task.mark_failure(error),
    }
}

async fn fire_callback(task: &Task, result: &TaskResult) {
    let Some(callback) = &task.callback else {
        return;
    };

    let payload = CallbackPayload {
        task_id: result.task_id.clone(),
        status: result.status,
        result: result.result.clone(),
        error: result.error.clone(),
        started_at: result.started_at,
        completed_at: result.completed_at.or(Some(Utc::now())),
        callback_data: callback.data.clone(),
    };

    let bytes = match serde_json::to_vec(&payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(task_id = %task.id, error = %e, "failed to encode callback payload");
            return;
        }
    };

    match PairDialer::dial(&callback.address).await {
        Ok(mut conn) => {
            if let Err(e) = conn.send(&bytes).await {
                warn!(task_id = %task.id, address = %callback.address, error = %e, "callback send failed");
            }
            let _ = conn.close().await;
        }
        Err(e) => {
            warn!(task_id = %task.id, address = %callback.address, error = %e, "callback dial failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastworker_shared::models::{CallbackInfo, TaskPriority, TaskStatus};
    use fastworker_transport::pair::PairListener;
    use std::collections::HashMap;
    use serde_json::Value;

    fn registry_with_add() -> TaskRegistry {
        let mut registry = TaskRegistry::new();
        registry.register_sync("add", |args, _kwargs| {
            let a = args[0].as_i64().unwrap_or(0);
            let b = args[1].as_i64().unwrap_or(0);
            Ok(Value::from(a + b))
        });
        registry
    }

    #[tokio::test]
    async fn test_execute_success() {
        let registry = registry_with_add();
        let mut task = Task::new(
            "add",
            vec![Value::from(2), Value::from(3)],
            HashMap::new(),
            TaskPriority::Normal,
            None,
        );
        let result = execute(&registry, &mut task).await;
        assert_eq!(result.status, TaskStatus::Success);
        assert_eq!(result.result, Some(Value::from(5)));
        assert_eq!(task.status, TaskStatus::Success);
    }

    #[tokio::test]
    async fn test_execute_unknown_task() {
        let registry = TaskRegistry::new();
        let mut task = Task::new("missing", vec![], HashMap::new(), TaskPriority::Normal, None);
        let result = execute(&registry, &mut task).await;
        assert_eq!(result.status, TaskStatus::Failure);
        assert_eq!(result.error.as_deref(), Some("Task missing not found"));
    }

    #[tokio::test]
    async fn test_execute_function_error_becomes_failure() {
        let mut registry = TaskRegistry::new();
        registry.register_sync("boom", |_, _| Err("kaboom".to_string()));
        let mut task = Task::new("boom", vec![], HashMap::new(), TaskPriority::Normal, None);
        let result = execute(&registry, &mut task).await;
        assert_eq!(result.status, TaskStatus::Failure);
        assert_eq!(result.error.as_deref(), Some("kaboom"));
    }

    #[tokio::test]
    async fn test_execute_async_task() {
        let mut registry = TaskRegistry::new();
        registry.register_async("double", |args, _kwargs| {
            Box::pin(async move {
                let n = args[0].as_i64().unwrap_or(0);
                Ok(Value::from(n * 2))
            })
        });
        let mut task = Task::new(
            "double",
            vec![Value::from(21)],
            HashMap::new(),
            TaskPriority::Normal,
            None,
        );
        let result = execute(&registry, &mut task).await;
        assert_eq!(result.result, Some(Value::from(42)));
    }

    #[tokio::test]
    async fn test_execute_fires_callback() {
        let listener = PairListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let mut conn = listener.accept().await.unwrap();
            conn.recv().await.unwrap()
        });

        let registry = registry_with_add();
        let mut task = Task::new(
            "add",
            vec![Value::from(1), Value::from(1)],
            HashMap::new(),
            TaskPriority::Normal,
            Some(CallbackInfo {
                address: addr,
                data: HashMap::new(),
            }),
        );
        execute(&registry, &mut task).await;

        let received = server.await.unwrap();
        assert!(received.is_some());
        let payload: CallbackPayload = serde_json::from_slice(&received.unwrap()).unwrap();
        assert_eq!(payload.result, Some(Value::from(2)));
    }
}
