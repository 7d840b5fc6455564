//! # Subworker Registry
//!
//! Tracks every subworker that has ever registered with this control
//! plane, keyed by subworker identifier. Records are never deleted, only
//! marked `inactive` by the liveness sweeper so a late heartbeat can
//! revive them.

use std::collections::HashMap;

use chrono::Utc;

use fastworker_shared::models::{SubworkerRecord, SubworkerStatus};

const STALENESS_THRESHOLD_SECS: i64 = 30;

#[derive(Debug, Default)]
pub struct SubworkerRegistry {
    records: HashMap<String, SubworkerRecord>,
}

impl SubworkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or update a record on registration/heartbeat. First message
    /// with an identifier creates a fresh record at load zero; subsequent
    /// messages update status and `last_seen`, preserving load and
    /// `registered_at`.
    pub fn upsert(&mut self, subworker_id: &str, address: &str, active: bool) {
        match self.records.get_mut(subworker_id) {
            Some(record) => {
                record.address = address.to_string();
                record.status = if active {
                    SubworkerStatus::Active
                } else {
                    SubworkerStatus::Inactive
                };
                record.last_seen = Utc::now();
            }
            None => {
                let mut record = SubworkerRecord::new(subworker_id, address);
                if !active {
                    record.status = SubworkerStatus::Inactive;
                }
                self.records.insert(subworker_id.to_string(), record);
            }
        }
    }

    /// Select the active subworker with the minimum load. Ties are broken
    /// by the lexicographically least identifier, a deterministic choice
    /// where only the minimum-load invariant is otherwise observable.
    pub fn select(&self) -> Option<&SubworkerRecord> {
        self.records
            .values()
            .filter(|r| r.status == SubworkerStatus::Active)
            .min_by(|a, b| a.load.cmp(&b.load).then_with(|| a.id.cmp(&b.id)))
    }

    pub fn increment_load(&mut self, subworker_id: &str) {
        if let Some(record) = self.records.get_mut(subworker_id) {
            record.increment_load();
        }
    }

    pub fn decrement_load(&mut self, subworker_id: &str) {
        if let Some(record) = self.records.get_mut(subworker_id) {
            record.decrement_load();
        }
    }

    /// Mark every record whose `last_seen` predates the staleness threshold
    /// as `inactive`. Returns how many records were newly marked.
    pub fn sweep_stale(&mut self) -> usize {
        let now = Utc::now();
        let mut marked = 0;
        for record in self.records.values_mut() {
            if record.status == SubworkerStatus::Active
                && now.signed_duration_since(record.last_seen).num_seconds()
                    > STALENESS_THRESHOLD_SECS
            {
                record.status = SubworkerStatus::Inactive;
                marked += 1;
            }
        }
        marked
    }

    pub fn snapshot(&self) -> Vec<SubworkerRecord> {
        self.records.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_registration_starts_at_zero_load() {
        let mut registry = SubworkerRegistry::new();
        registry.upsert("w1", "tcp://127.0.0.1:5655", true);
        let selected = registry.select().unwrap();
        assert_eq!(selected.id, "w1");
        assert_eq!(selected.load, 0);
    }

    #[test]
    fn test_selection_prefers_minimum_load() {
        let mut registry = SubworkerRegistry::new();
        registry.upsert("w1", "tcp://127.0.0.1:5655", true);
        registry.upsert("w2", "tcp://127.0.0.1:5656", true);
        registry.increment_load("w1");
        let selected = registry.select().unwrap();
        assert_eq!(selected.id, "w2");
    }

    #[test]
    fn test_inactive_subworkers_not_selected() {
        let mut registry = SubworkerRegistry::new();
        registry.upsert("w1", "tcp://127.0.0.1:5655", false);
        assert!(registry.select().is_none());
    }

    #[test]
    fn test_reregistration_preserves_load_and_registered_at() {
        let mut registry = SubworkerRegistry::new();
        registry.upsert("w1", "tcp://127.0.0.1:5655", true);
        registry.increment_load("w1");
        let registered_at = registry.select().unwrap().registered_at;
        registry.upsert("w1", "tcp://127.0.0.1:5655", true);
        let record = registry.select().unwrap();
        assert_eq!(record.load, 1);
        assert_eq!(record.registered_at, registered_at);
    }

    #[test]
    fn test_load_floor_at_zero() {
        let mut registry = SubworkerRegistry::new();
        registry.upsert("w1", "tcp://127.0.0.1:5655", true);
        registry.decrement_load("w1");
        assert_eq!(registry.select().unwrap().load, 0);
    }
}
