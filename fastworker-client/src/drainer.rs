//! # Pending Drainer
//!
//! Every 100ms, while known-workers is non-empty and pending is
//! non-empty, pop one Task and spawn a submission activity for it.

use std::time::Duration;

use crate::state::ClientState;
use crate::submission::{submission_activity, SubmissionOptions};

const DRAIN_INTERVAL: Duration = Duration::from_millis(100);

pub async fn run_pending_drainer(state: ClientState, options: SubmissionOptions) {
    let mut interval = tokio::time::interval(DRAIN_INTERVAL);
    loop {
        interval.tick().await;

        if !state.has_known_workers().await {
            continue;
        }

        let task = state.pending.lock().await.pop_front();
        if let Some(task) = task {
            let state = state.clone();
            let options = options.clone();
            tokio::spawn(async move {
                submission_activity(&state, task, options).await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastworker_shared::models::{Task, TaskPriority};
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_drainer_waits_for_known_workers() {
        let state = ClientState::new();
        state
            .pending
            .lock()
            .await
            .push_back(Task::new("add", vec![], HashMap::new(), TaskPriority::Normal, None));

        tokio::spawn(run_pending_drainer(
            state.clone(),
            SubmissionOptions::default(),
        ));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(state.pending.lock().await.len(), 1);

        state
            .known_workers
            .lock()
            .await
            .insert(("w1".to_string(), "tcp://127.0.0.1:1".to_string()));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(state.pending.lock().await.len(), 0);
    }
}
