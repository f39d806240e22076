//! Data store layer.
//!
//! The services only see [`DataStore`], a small filter/insert/update
//! capability over JSON documents. Production runs against Firestore;
//! local development and the test suite use the in-process memory backend.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    pub const PREFERENCES: &str = "preferences";
    pub const ROUTES: &str = "routes";
    pub const TRACKING_SESSIONS: &str = "tracking_sessions";
    /// Per-sample writes, only when point persistence is enabled
    pub const TRACK_POINTS: &str = "track_points";
    pub const USER_FAVORITES: &str = "user_favorites";
    pub const COMPLETED_ROUTES: &str = "user_completed_routes";
    pub const POINTS_OF_INTEREST: &str = "points_of_interest";
}

/// Errors from the data store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Data store unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed record in {collection}: {message}")]
    Serialization { collection: String, message: String },

    #[error("Record not found: {collection}/{id}")]
    NotFound { collection: String, id: String },
}

impl StoreError {
    fn serialization(collection: &str, err: impl std::fmt::Display) -> Self {
        StoreError::Serialization {
            collection: collection.to_string(),
            message: err.to_string(),
        }
    }
}

/// Equality filter over top-level document fields, with an optional limit.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
    limit: Option<usize>,
}

impl Filter {
    /// Match every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// Require `field == value`.
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push((field.to_string(), value.into()));
        self
    }

    /// Return at most `n` documents.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn max_results(&self) -> Option<usize> {
        self.limit
    }

    /// Whether a document satisfies every condition.
    pub fn matches(&self, record: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| record.get(field) == Some(expected))
    }
}

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreStore),
    Memory(Arc<MemoryStore>),
}

/// Handle to the configured data store. Cheap to clone.
#[derive(Clone)]
pub struct DataStore {
    backend: Backend,
}

impl DataStore {
    /// Connect to Firestore.
    pub async fn firestore(project_id: &str) -> Result<Self, StoreError> {
        Ok(Self {
            backend: Backend::Firestore(FirestoreStore::new(project_id).await?),
        })
    }

    /// Create an empty in-process store.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::default())),
        }
    }

    /// Access the memory backend (for seeding and failure injection in tests).
    pub fn memory(&self) -> Option<&MemoryStore> {
        match &self.backend {
            Backend::Memory(m) => Some(m),
            Backend::Firestore(_) => None,
        }
    }

    async fn injected_latency(&self, collection: &str) {
        if let Some(delay) = self.memory().and_then(|m| m.latency(collection)) {
            tokio::time::sleep(delay).await;
        }
    }

    /// Fetch documents matching `filter`.
    pub async fn get(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        self.injected_latency(collection).await;
        match &self.backend {
            Backend::Firestore(fs) => fs.query(collection, filter).await,
            Backend::Memory(m) => m.query(collection, filter),
        }
    }

    /// Fetch and decode documents matching `filter`.
    ///
    /// Documents that fail to decode are logged and skipped, so one bad
    /// record never hides the rest of the collection.
    pub async fn get_as<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Vec<T>, StoreError> {
        let records = self.get(collection, filter).await?;
        let mut decoded = Vec::with_capacity(records.len());
        for record in records {
            let id = record
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            match serde_json::from_value(record) {
                Ok(value) => decoded.push(value),
                Err(e) => {
                    tracing::warn!(collection, id = %id, error = %e, "Skipping malformed record");
                }
            }
        }
        Ok(decoded)
    }

    /// Fetch the first document matching `filter` that decodes.
    pub async fn find_one<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<T>, StoreError> {
        Ok(self.get_as(collection, filter).await?.into_iter().next())
    }

    /// Insert a document. An `id` is generated when the record has none.
    ///
    /// Returns the stored record.
    pub async fn insert(&self, collection: &str, record: Value) -> Result<Value, StoreError> {
        let Value::Object(mut fields) = record else {
            return Err(StoreError::serialization(collection, "record must be an object"));
        };

        let id = match fields.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => uuid::Uuid::new_v4().to_string(),
        };
        fields.insert("id".to_string(), Value::String(id.clone()));
        let record = Value::Object(fields);

        self.injected_latency(collection).await;
        match &self.backend {
            Backend::Firestore(fs) => fs.set(collection, &id, &record).await?,
            Backend::Memory(m) => m.set(collection, &id, record.clone())?,
        }

        tracing::debug!(collection, id = %id, "Inserted record");
        Ok(record)
    }

    /// Insert a typed record, returning it with its assigned `id`.
    pub async fn insert_as<T: Serialize + DeserializeOwned>(
        &self,
        collection: &str,
        record: &T,
    ) -> Result<T, StoreError> {
        let value = serde_json::to_value(record).map_err(|e| StoreError::serialization(collection, e))?;
        let stored = self.insert(collection, value).await?;
        serde_json::from_value(stored).map_err(|e| StoreError::serialization(collection, e))
    }

    /// Merge the top-level fields of `patch` into document `id`.
    pub async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
    ) -> Result<Value, StoreError> {
        let Value::Object(patch) = patch else {
            return Err(StoreError::serialization(collection, "patch must be an object"));
        };

        let existing = match &self.backend {
            Backend::Firestore(fs) => fs.get_by_id(collection, id).await?,
            Backend::Memory(m) => m.get_by_id(collection, id)?,
        };
        let Some(Value::Object(mut fields)) = existing else {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        };

        merge_fields(&mut fields, patch);
        fields.insert("id".to_string(), Value::String(id.to_string()));
        let record = Value::Object(fields);

        match &self.backend {
            Backend::Firestore(fs) => fs.set(collection, id, &record).await?,
            Backend::Memory(m) => m.set(collection, id, record.clone())?,
        }

        Ok(record)
    }

    /// Delete every document matching `filter`. Returns the number deleted.
    pub async fn delete(&self, collection: &str, filter: &Filter) -> Result<usize, StoreError> {
        let matching = self.get(collection, filter).await?;
        let ids: Vec<String> = matching
            .iter()
            .filter_map(|v| v.get("id").and_then(Value::as_str).map(str::to_string))
            .collect();

        for id in &ids {
            match &self.backend {
                Backend::Firestore(fs) => fs.delete_by_id(collection, id).await?,
                Backend::Memory(m) => m.delete_by_id(collection, id)?,
            }
        }

        Ok(ids.len())
    }
}

fn merge_fields(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}
