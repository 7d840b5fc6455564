//! # Result Query API
//!
//! Pick a known worker, dial its result-query endpoint (P+4), and return
//! the `TaskResult` if found.

use fastworker_shared::addr::BaseAddress;
use fastworker_shared::models::{ResultQueryRequest, ResultQueryResponse, TaskResult};
use fastworker_shared::serialization::{decode, encode, SerializationFormat};
use fastworker_transport::reqrep::ReqRepDialer;

use crate::state::ClientState;

const RESULT_QUERY_PORT_OFFSET: u16 = 4;

/// Look up a task's result, first locally, then remotely if it isn't
/// known locally yet. Returns `None` if no worker is known or the
/// control plane reports the task as not found.
pub async fn get_task_result(state: &ClientState, task_id: &str) -> Option<TaskResult> {
    if let Some(result) = state.results.lock().await.get(task_id).cloned() {
        return Some(result);
    }

    let (_, address) = state.pick_worker().await?;
    let base = BaseAddress::parse(&address).ok()?;
    let endpoint = base.socket_addr_with_offset(RESULT_QUERY_PORT_OFFSET);

    let mut conn = ReqRepDialer::dial(&endpoint).await.ok()?;
    let request_bytes = encode(
        &ResultQueryRequest {
            task_id: task_id.to_string(),
        },
        SerializationFormat::Json,
    )
    .ok()?;
    conn.send(&request_bytes).await.ok()?;
    let reply_bytes = conn.recv().await.ok()?;
    let _ = conn.close().await;

    match decode::<ResultQueryResponse>(&reply_bytes, SerializationFormat::Json).ok()? {
        ResultQueryResponse::Found { result, .. } => Some(result),
        ResultQueryResponse::NotFound { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastworker_shared::models::TaskStatus;

    #[tokio::test]
    async fn test_local_result_hit_skips_network() {
        let state = ClientState::new();
        state
            .results
            .lock()
            .await
            .insert("t1".to_string(), TaskResult::pending("t1"));

        let result = get_task_result(&state, "t1").await.unwrap();
        assert_eq!(result.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_no_known_worker_returns_none() {
        let state = ClientState::new();
        assert!(get_task_result(&state, "missing").await.is_none());
    }
}
