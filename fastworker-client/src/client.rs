//! # Client Facade
//!
//! Wires together the discovery listener, the pending drainer, and the
//! submission/query APIs behind one handle.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

use fastworker_shared::config::ClientConfig;
use fastworker_shared::models::{CallbackInfo, TaskPriority, TaskResult};

use crate::discovery::run_discovery_listener;
use crate::drainer::run_pending_drainer;
use crate::query::get_task_result;
use crate::state::ClientState;
use crate::submission::{delay, SubmissionOptions};

#[derive(Clone)]
pub struct Client {
    state: ClientState,
    options: SubmissionOptions,
}

impl Client {
    /// Construct a client and spawn its background discovery listener and
    /// pending drainer. These run for the lifetime of the process; there
    /// is no explicit stop handle because the non-goals exclude graceful
    /// per-client teardown.
    pub fn start(config: ClientConfig) -> Self {
        let state = ClientState::new();
        let options = SubmissionOptions {
            retries: config.retries,
            timeout: Duration::from_secs_f64(config.submission_timeout_seconds),
        };

        tokio::spawn(run_discovery_listener(
            state.clone(),
            config.common.discovery_address.clone(),
        ));
        tokio::spawn(run_pending_drainer(state.clone(), options.clone()));

        Self { state, options }
    }

    pub fn options(&self) -> &SubmissionOptions {
        &self.options
    }

    /// Submit a task non-blocking; returns the task identifier immediately.
    pub async fn delay(
        &self,
        name: impl Into<String>,
        args: Vec<Value>,
        kwargs: HashMap<String, Value>,
        priority: TaskPriority,
        callback: Option<CallbackInfo>,
    ) -> String {
        delay(
            &self.state,
            name,
            args,
            kwargs,
            priority,
            callback,
            self.options.clone(),
        )
        .await
    }

    pub async fn get_result(&self, task_id: &str) -> Option<TaskResult> {
        get_task_result(&self.state, task_id).await
    }

    pub async fn known_worker_count(&self) -> usize {
        self.state.known_workers.lock().await.len()
    }
}
