//! # Domain Model
//!
//! Task, TaskResult and the records the control plane and result cache hold.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Priority levels, ordered by their port offset from a role's base address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskPriority {
    Critical,
    High,
    Normal,
    Low,
}

impl TaskPriority {
    /// Port offset from a role's configured base port.
    pub fn port_offset(self) -> u16 {
        match self {
            Self::Critical => 0,
            Self::High => 1,
            Self::Normal => 2,
            Self::Low => 3,
        }
    }

    pub const ALL: [TaskPriority; 4] = [
        TaskPriority::Critical,
        TaskPriority::High,
        TaskPriority::Normal,
        TaskPriority::Low,
    ];
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Normal
    }
}

/// Lifecycle status of a task. Transitions are monotonic: `Pending` ->
/// `Started` -> {`Success`, `Failure`}, never backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Pending,
    Started,
    Success,
    Failure,
}

/// Target and opaque payload for a one-shot completion callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackInfo {
    pub address: String,
    #[serde(default)]
    pub data: HashMap<String, Value>,
}

/// A submitted unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: HashMap<String, Value>,
    #[serde(default)]
    pub priority: TaskPriority,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub callback: Option<CallbackInfo>,
}

impl Task {
    /// Build a fresh task with a generated identifier, status `Pending`.
    pub fn new(
        name: impl Into<String>,
        args: Vec<Value>,
        kwargs: HashMap<String, Value>,
        priority: TaskPriority,
        callback: Option<CallbackInfo>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            args,
            kwargs,
            priority,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            callback,
        }
    }

    /// Advance to `Started`, stamping `started_at`.
    pub fn mark_started(&mut self) {
        self.status = TaskStatus::Started;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_success(&mut self, result: Value) {
        self.status = TaskStatus::Success;
        self.result = Some(result);
        self.completed_at = Some(Utc::now());
    }

    pub fn mark_failure(&mut self, error: impl Into<String>) {
        self.status = TaskStatus::Failure;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
    }
}

/// The reply carried back to the client, and the cache payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: String,
    pub status: TaskStatus,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub callback: Option<CallbackInfo>,
}

impl TaskResult {
    pub fn pending(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Pending,
            result: None,
            error: None,
            started_at: None,
            completed_at: None,
            callback: None,
        }
    }

    pub fn failure(task_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Failure,
            result: None,
            error: Some(error.into()),
            started_at: None,
            completed_at: Some(Utc::now()),
            callback: None,
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            status: task.status,
            result: task.result.clone(),
            error: task.error.clone(),
            started_at: task.started_at,
            completed_at: task.completed_at,
            callback: task.callback.clone(),
        }
    }
}

/// Status of a subworker as tracked by the control plane's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubworkerStatus {
    Active,
    Inactive,
}

/// A subworker's registry entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubworkerRecord {
    pub id: String,
    pub address: String,
    pub status: SubworkerStatus,
    pub last_seen: DateTime<Utc>,
    pub load: u32,
    pub registered_at: DateTime<Utc>,
}

impl SubworkerRecord {
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            address: address.into(),
            status: SubworkerStatus::Active,
            last_seen: now,
            load: 0,
            registered_at: now,
        }
    }

    pub fn increment_load(&mut self) {
        self.load += 1;
    }

    pub fn decrement_load(&mut self) {
        self.load = self.load.saturating_sub(1);
    }
}

/// An entry in the control plane's result cache.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub result: TaskResult,
    pub stored_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(result: TaskResult) -> Self {
        let now = Utc::now();
        Self {
            result,
            stored_at: now,
            last_accessed: now,
        }
    }
}

/// Wire shape for registration and heartbeat requests (subworker -> control
/// plane, management endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub subworker_id: String,
    pub address: String,
    pub status: String,
    #[serde(default)]
    pub heartbeat: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub status: String,
    pub subworker_id: String,
}

impl RegistrationResponse {
    pub fn registered(subworker_id: impl Into<String>) -> Self {
        Self {
            status: "registered".to_string(),
            subworker_id: subworker_id.into(),
        }
    }
}

/// Wire shape for a result query (client -> control plane, P+4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultQueryRequest {
    pub task_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultQueryResponse {
    Found { found: bool, result: TaskResult },
    NotFound { found: bool, error: String },
}

impl ResultQueryResponse {
    pub fn found(result: TaskResult) -> Self {
        Self::Found {
            found: true,
            result,
        }
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self::NotFound {
            found: false,
            error: error.into(),
        }
    }
}

/// One-shot callback payload sent over a Pair socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackPayload {
    pub task_id: String,
    pub status: TaskStatus,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub callback_data: HashMap<String, Value>,
}
