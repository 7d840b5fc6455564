//! # Control Plane State
//!
//! The subworker registry, priority deques, result cache and task registry
//! are each owned by the control plane process and mutated only through a
//! single lock per structure, per the single-writer discipline the core
//! requires on a truly parallel runtime.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::Mutex;

use fastworker_exec::TaskRegistry;
use fastworker_shared::models::{Task, TaskPriority};

use crate::cache::{CacheStats, ResultCache};
use crate::registry::SubworkerRegistry;

/// Four FIFO deques, one per priority level, for tasks re-queued after a
/// forwarding failure.
#[derive(Debug, Default)]
pub struct PriorityQueues {
    critical: VecDeque<Task>,
    high: VecDeque<Task>,
    normal: VecDeque<Task>,
    low: VecDeque<Task>,
}

impl PriorityQueues {
    fn deque_mut(&mut self, priority: TaskPriority) -> &mut VecDeque<Task> {
        match priority {
            TaskPriority::Critical => &mut self.critical,
            TaskPriority::High => &mut self.high,
            TaskPriority::Normal => &mut self.normal,
            TaskPriority::Low => &mut self.low,
        }
    }

    pub fn push_front(&mut self, task: Task) {
        let priority = task.priority;
        self.deque_mut(priority).push_front(task);
    }

    pub fn pop_front(&mut self, priority: TaskPriority) -> Option<Task> {
        self.deque_mut(priority).pop_front()
    }
}

/// Shared, cloneable handle to the control plane's mutable state.
#[derive(Clone)]
pub struct ControlPlaneState {
    pub worker_id: Arc<str>,
    pub registry: Arc<TaskRegistry>,
    pub subworkers: Arc<Mutex<SubworkerRegistry>>,
    pub cache: Arc<Mutex<ResultCache>>,
    pub requeue: Arc<Mutex<PriorityQueues>>,
}

impl ControlPlaneState {
    pub fn new(
        worker_id: impl Into<Arc<str>>,
        registry: TaskRegistry,
        cache_max_size: usize,
        cache_ttl_seconds: u64,
    ) -> Self {
        Self {
            worker_id: worker_id.into(),
            registry: Arc::new(registry),
            subworkers: Arc::new(Mutex::new(SubworkerRegistry::new())),
            cache: Arc::new(Mutex::new(ResultCache::new(cache_max_size, cache_ttl_seconds))),
            requeue: Arc::new(Mutex::new(PriorityQueues::default())),
        }
    }

    /// A point-in-time copy of every known subworker record, for a
    /// collaborator observability surface to read.
    pub async fn subworker_snapshot(&self) -> Vec<fastworker_shared::models::SubworkerRecord> {
        self.subworkers.lock().await.snapshot()
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.lock().await.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastworker_shared::models::{TaskPriority, TaskStatus};
    use std::collections::HashMap;

    #[test]
    fn test_priority_queues_route_by_priority() {
        let mut queues = PriorityQueues::default();
        let task = Task::new("t", vec![], HashMap::new(), TaskPriority::High, None);
        queues.push_front(task.clone());
        assert!(queues.pop_front(TaskPriority::Normal).is_none());
        let popped = queues.pop_front(TaskPriority::High).unwrap();
        assert_eq!(popped.id, task.id);
    }

    #[tokio::test]
    async fn test_state_snapshot_reflects_registry() {
        let state = ControlPlaneState::new("cp-1", TaskRegistry::new(), 10, 60);
        state
            .subworkers
            .lock()
            .await
            .upsert("w1", "tcp://127.0.0.1:5655", true);
        let snapshot = state.subworker_snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "w1");
    }

    #[tokio::test]
    async fn test_cache_stats_reports_configured_bounds() {
        let state = ControlPlaneState::new("cp-1", TaskRegistry::new(), 42, 99);
        let stats = state.cache_stats().await;
        assert_eq!(stats.max_size, 42);
        assert_eq!(stats.ttl_seconds, 99);
        assert_eq!(stats.size, 0);
    }
}
