//! In-process backend for [`DataStore`](super::DataStore).
//!
//! Collections keep insertion order so "first N" reads are deterministic.
//! Individual collections can be marked unavailable, or slowed down, to
//! exercise the services' fallback and locking paths.

use super::{Filter, StoreError};
use dashmap::{DashMap, DashSet};
use serde_json::Value;
use std::time::Duration;

#[derive(Default)]
pub struct MemoryStore {
    collections: DashMap<String, Vec<Value>>,
    unavailable: DashSet<String>,
    latency: DashMap<String, Duration>,
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

impl MemoryStore {
    /// Make every operation on `collection` fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, collection: &str, unavailable: bool) {
        if unavailable {
            self.unavailable.insert(collection.to_string());
        } else {
            self.unavailable.remove(collection);
        }
    }

    /// Delay every read and write on `collection` by `delay`.
    pub fn set_latency(&self, collection: &str, delay: Duration) {
        if delay.is_zero() {
            self.latency.remove(collection);
        } else {
            self.latency.insert(collection.to_string(), delay);
        }
    }

    pub(super) fn latency(&self, collection: &str) -> Option<Duration> {
        self.latency.get(collection).map(|d| *d)
    }

    fn check_available(&self, collection: &str) -> Result<(), StoreError> {
        if self.unavailable.contains(collection) {
            return Err(StoreError::Unavailable(format!(
                "{} is unavailable (injected)",
                collection
            )));
        }
        Ok(())
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, |c| c.len())
    }

    pub fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        self.check_available(collection)?;

        let Some(records) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };

        let matching = records.iter().filter(|r| filter.matches(r)).cloned();
        Ok(match filter.max_results() {
            Some(n) => matching.take(n).collect(),
            None => matching.collect(),
        })
    }

    pub fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        self.check_available(collection)?;

        Ok(self.collections.get(collection).and_then(|records| {
            records
                .iter()
                .find(|r| record_id(r) == Some(id))
                .cloned()
        }))
    }

    /// Create or replace a document, keeping its position on replace.
    pub fn set(&self, collection: &str, id: &str, record: Value) -> Result<(), StoreError> {
        self.check_available(collection)?;

        let mut records = self.collections.entry(collection.to_string()).or_default();
        match records.iter_mut().find(|r| record_id(r) == Some(id)) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(())
    }

    pub fn delete_by_id(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.check_available(collection)?;

        if let Some(mut records) = self.collections.get_mut(collection) {
            records.retain(|r| record_id(r) != Some(id));
        }
        Ok(())
    }
}
