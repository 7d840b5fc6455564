//! # Submission
//!
//! Non-blocking submission API plus the retrying background activity that
//! actually delivers a task to a worker.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use fastworker_shared::addr::BaseAddress;
use fastworker_shared::models::{CallbackInfo, Task, TaskPriority, TaskResult};
use fastworker_shared::serialization::{decode, encode, SerializationFormat};
use fastworker_transport::reqrep::ReqRepDialer;

use crate::state::ClientState;

#[derive(Debug, Clone)]
pub struct SubmissionOptions {
    pub retries: u32,
    pub timeout: Duration,
}

impl Default for SubmissionOptions {
    fn default() -> Self {
        Self {
            retries: 3,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Build a task, record it as `PENDING` locally, and return its
/// identifier immediately. The caller must separately hand the task to
/// `submit_or_enqueue` (directly, or via the pending drainer) to actually
/// deliver it. `options` carries the caller's configured retry/timeout
/// settings so they apply on this path too, not just the pending drainer.
pub async fn delay(
    state: &ClientState,
    name: impl Into<String>,
    args: Vec<Value>,
    kwargs: HashMap<String, Value>,
    priority: TaskPriority,
    callback: Option<CallbackInfo>,
    options: SubmissionOptions,
) -> String {
    let task = Task::new(name, args, kwargs, priority, callback);
    let task_id = task.id.clone();
    state
        .results
        .lock()
        .await
        .insert(task_id.clone(), TaskResult::pending(&task_id));

    submit_or_enqueue(state, task, options).await;
    task_id
}

/// If a worker is known, spawn the submission activity now; otherwise
/// enqueue for the pending drainer.
pub async fn submit_or_enqueue(state: &ClientState, task: Task, options: SubmissionOptions) {
    if !state.has_known_workers().await {
        state.pending.lock().await.push_back(task);
        return;
    }

    let state = state.clone();
    tokio::spawn(async move {
        submission_activity(&state, task, options).await;
    });
}

/// Retry loop: pick a worker, dial its priority endpoint, send, await a
/// reply with a per-attempt timeout, retrying with exponential backoff
/// (`0.1 * 2^attempt` seconds) up to `retries + 1` attempts.
pub async fn submission_activity(state: &ClientState, task: Task, options: SubmissionOptions) {
    let Some((worker_id, address)) = state.pick_worker().await else {
        state.pending.lock().await.push_back(task);
        return;
    };

    let base = match BaseAddress::parse(&address) {
        Ok(base) => base,
        Err(e) => {
            write_failure(state, &task.id, format!("invalid worker address: {e}")).await;
            return;
        }
    };
    let endpoint = base.priority_socket_addr(task.priority);

    let total_attempts = options.retries + 1;
    for attempt in 0..total_attempts {
        match attempt_once(&endpoint, &task, options.timeout).await {
            Ok(result) => {
                state.results.lock().await.insert(task.id.clone(), result);
                return;
            }
            Err(e) => {
                warn!(
                    worker_id = %worker_id,
                    attempt,
                    error = %e,
                    "submission attempt failed"
                );
                if attempt + 1 < total_attempts {
                    let backoff = Duration::from_secs_f64(0.1 * 2f64.powi(attempt as i32));
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    write_failure(
        state,
        &task.id,
        format!("submission timed out after {total_attempts} attempts"),
    )
    .await;
}

async fn attempt_once(
    endpoint: &str,
    task: &Task,
    timeout: Duration,
) -> Result<TaskResult, fastworker_transport::TransportError> {
    let mut conn = ReqRepDialer::dial_timeout(endpoint, timeout).await?;
    let bytes = encode(task, SerializationFormat::Json)
        .map_err(|_| fastworker_transport::TransportError::NotConnected)?;
    conn.send(&bytes).await?;

    let reply = match tokio::time::timeout(timeout, conn.recv()).await {
        Ok(result) => result?,
        Err(_) => return Err(fastworker_transport::TransportError::Timeout(timeout)),
    };
    conn.close().await?;

    decode(&reply, SerializationFormat::Json)
        .map_err(|_| fastworker_transport::TransportError::NotConnected)
}

async fn write_failure(state: &ClientState, task_id: &str, error: String) {
    state
        .results
        .lock()
        .await
        .insert(task_id.to_string(), TaskResult::failure(task_id, error));
}
