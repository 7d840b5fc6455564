//! # Result Cache
//!
//! A bounded, TTL-expiring, access-ordered map from task identifier to
//! `CacheEntry`. Iteration order tracks least-recently-accessed ->
//! most-recently-accessed, which is also the eviction order.
//!
//! `moka` (already in the workspace dependency table) would give us TTL
//! expiry for free, but its eviction and access-order semantics are not
//! specified closely enough to guarantee the exact touch-on-`get` and
//! touch-on-`store` behavior the scenarios in the task's result cache
//! properties require, so this is a small hand-rolled ordered map instead.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;

use fastworker_shared::models::{CacheEntry, TaskResult};

/// Stats snapshot for the observability accessor (`cache_stats`).
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub ttl_seconds: u64,
}

/// LRU + TTL result cache. Not internally synchronized; the owning
/// `ControlPlaneState` serializes access with its own lock.
pub struct ResultCache {
    entries: HashMap<String, CacheEntry>,
    /// Access order, oldest (least-recently-used) first.
    order: Vec<String>,
    max_size: usize,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(max_size: usize, ttl_seconds: u64) -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
            max_size,
            ttl: Duration::from_secs(ttl_seconds),
        }
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.order.push(key.to_string());
    }

    fn evict_front(&mut self) {
        if !self.order.is_empty() {
            let key = self.order.remove(0);
            self.entries.remove(&key);
        }
    }

    /// Store `result`, evicting least-recently-accessed entries while at
    /// capacity. An existing key is removed first so the new entry lands at
    /// the most-recent end.
    pub fn store(&mut self, result: TaskResult) {
        let key = result.task_id.clone();
        if self.entries.contains_key(&key) {
            self.entries.remove(&key);
            if let Some(pos) = self.order.iter().position(|k| k == &key) {
                self.order.remove(pos);
            }
        }
        while self.entries.len() >= self.max_size && self.max_size > 0 {
            self.evict_front();
        }
        self.entries.insert(key.clone(), CacheEntry::new(result));
        self.order.push(key);
    }

    /// Fetch `task_id`, expiring it first if its TTL has elapsed. A hit
    /// moves the key to the most-recently-used end.
    pub fn get(&mut self, task_id: &str) -> Option<TaskResult> {
        let expired = match self.entries.get(task_id) {
            None => return None,
            Some(entry) => {
                let age = Utc::now().signed_duration_since(entry.stored_at);
                age.to_std().unwrap_or_default() > self.ttl
            }
        };

        if expired {
            self.entries.remove(task_id);
            if let Some(pos) = self.order.iter().position(|k| k == task_id) {
                self.order.remove(pos);
            }
            return None;
        }

        self.touch(task_id);
        let entry = self.entries.get_mut(task_id)?;
        entry.last_accessed = Utc::now();
        Some(entry.result.clone())
    }

    /// Drop every entry whose TTL has elapsed. Purely for reclaiming memory
    /// of entries nobody will ever `get` again; correctness of `get` does
    /// not depend on this running.
    pub fn sweep_expired(&mut self) -> usize {
        let now = Utc::now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| {
                now.signed_duration_since(entry.stored_at)
                    .to_std()
                    .unwrap_or_default()
                    > self.ttl
            })
            .map(|(k, _)| k.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
            if let Some(pos) = self.order.iter().position(|k| k == key) {
                self.order.remove(pos);
            }
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            max_size: self.max_size,
            ttl_seconds: self.ttl.as_secs(),
        }
    }
}
