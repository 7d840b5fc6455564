//! # Task Registry
//!
//! A process-wide name -> callable mapping, populated explicitly by
//! `register_sync`/`register_async` calls before a control plane or
//! subworker is constructed. There is no dynamic module loading; callers
//! register the task functions their binary links in.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use tracing::warn;

/// A registered task implementation, synchronous or asynchronous.
#[derive(Clone)]
pub enum TaskFn {
    Sync(Arc<dyn Fn(Vec<Value>, HashMap<String, Value>) -> Result<Value, String> + Send + Sync>),
    Async(
        Arc<
            dyn Fn(Vec<Value>, HashMap<String, Value>) -> BoxFuture<'static, Result<Value, String>>
                + Send
                + Sync,
        >,
    ),
}

impl std::fmt::Debug for TaskFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync(_) => write!(f, "TaskFn::Sync(..)"),
            Self::Async(_) => write!(f, "TaskFn::Async(..)"),
        }
    }
}

/// Name -> callable mapping. Initialized empty, mutated only by
/// registration, never cleared at runtime. Last registration wins on a
/// name collision, with a warning.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: HashMap<String, TaskFn>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_sync<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Vec<Value>, HashMap<String, Value>) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.insert(name.into(), TaskFn::Sync(Arc::new(f)));
    }

    pub fn register_async<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Vec<Value>, HashMap<String, Value>) -> BoxFuture<'static, Result<Value, String>>
            + Send
            + Sync
            + 'static,
    {
        self.insert(name.into(), TaskFn::Async(Arc::new(f)));
    }

    fn insert(&mut self, name: String, task_fn: TaskFn) {
        if self.tasks.contains_key(&name) {
            warn!(task_name = %name, "overwriting existing task registration");
        }
        self.tasks.insert(name, task_fn);
    }

    pub fn get(&self, name: &str) -> Option<&TaskFn> {
        self.tasks.get(name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get_sync() {
        let mut registry = TaskRegistry::new();
        registry.register_sync("add", |args, _kwargs| {
            let a = args[0].as_i64().unwrap_or(0);
            let b = args[1].as_i64().unwrap_or(0);
            Ok(Value::from(a + b))
        });
        assert!(registry.get("add").is_some());
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = TaskRegistry::new();
        registry.register_sync("noop", |_, _| Ok(Value::from(1)));
        registry.register_sync("noop", |_, _| Ok(Value::from(2)));
        assert_eq!(registry.len(), 1);
        match registry.get("noop").unwrap() {
            TaskFn::Sync(f) => assert_eq!(f(vec![], HashMap::new()), Ok(Value::from(2))),
            TaskFn::Async(_) => panic!("expected sync"),
        }
    }

    #[test]
    fn test_empty_registry_has_no_tasks() {
        let registry = TaskRegistry::new();
        assert!(registry.is_empty());
    }
}
