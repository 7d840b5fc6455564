//! # Client State
//!
//! The known-workers set, pending-submission deque and local result map
//! are owned by the client process with the same single-lock-per-structure
//! discipline as the control plane.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tokio::sync::Mutex;

use fastworker_shared::models::{Task, TaskResult};

/// `(worker_id, base_address)`, set semantics so duplicate discovery
/// announcements are idempotent.
pub type KnownWorkers = HashSet<(String, String)>;

#[derive(Clone)]
pub struct ClientState {
    pub known_workers: Arc<Mutex<KnownWorkers>>,
    pub pending: Arc<Mutex<VecDeque<Task>>>,
    pub results: Arc<Mutex<HashMap<String, TaskResult>>>,
}

impl ClientState {
    pub fn new() -> Self {
        Self {
            known_workers: Arc::new(Mutex::new(HashSet::new())),
            pending: Arc::new(Mutex::new(VecDeque::new())),
            results: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Pick a known worker. Non-deterministic worker selection is
    /// permitted by the task's observable contract; this picks the
    /// lexicographically least identifier so the choice is reproducible.
    pub async fn pick_worker(&self) -> Option<(String, String)> {
        self.known_workers
            .lock()
            .await
            .iter()
            .min_by(|a, b| a.0.cmp(&b.0))
            .cloned()
    }

    pub async fn has_known_workers(&self) -> bool {
        !self.known_workers.lock().await.is_empty()
    }
}

impl Default for ClientState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pick_worker_is_deterministic() {
        let state = ClientState::new();
        state
            .known_workers
            .lock()
            .await
            .insert(("w2".to_string(), "tcp://a:1".to_string()));
        state
            .known_workers
            .lock()
            .await
            .insert(("w1".to_string(), "tcp://b:2".to_string()));

        let picked = state.pick_worker().await.unwrap();
        assert_eq!(picked.0, "w1");
    }

    #[tokio::test]
    async fn test_empty_known_workers() {
        let state = ClientState::new();
        assert!(!state.has_known_workers().await);
        assert!(state.pick_worker().await.is_none());
    }
}
