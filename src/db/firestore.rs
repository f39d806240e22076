// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore backend for [`DataStore`](super::DataStore).
//!
//! Documents are stored as plain JSON objects keyed by their `id` field, so
//! the same records round-trip through either backend.

use super::{Filter, StoreError};
use serde_json::Value;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreStore {
    client: firestore::FirestoreDb,
}

fn unavailable(context: &str, e: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(format!("{}: {}", context, e))
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, StoreError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| unavailable("Failed to connect to Firestore", e))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, StoreError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| unavailable("Failed to connect to Firestore Emulator", e))?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    /// Run an equality query.
    pub async fn query(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        let query = self.client.fluent().select().from(collection);

        let conditions = filter.conditions().to_vec();
        let query = if conditions.is_empty() {
            query
        } else {
            query.filter(move |q| {
                let exprs: Vec<_> = conditions
                    .iter()
                    .map(|(field, value)| q.field(field.as_str()).eq(value.clone()))
                    .collect();
                q.for_all(exprs)
            })
        };

        let query = match filter.max_results() {
            Some(n) => query.limit(n as u32),
            None => query,
        };

        query
            .obj::<Value>()
            .query()
            .await
            .map_err(|e| unavailable(collection, e))
    }

    /// Get a single document by ID.
    pub async fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| unavailable(collection, e))
    }

    /// Create or replace a document.
    pub async fn set(&self, collection: &str, id: &str, record: &Value) -> Result<(), StoreError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(record)
            .execute()
            .await
            .map_err(|e| unavailable(collection, e))?;
        Ok(())
    }

    /// Delete a document by ID.
    pub async fn delete_by_id(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.client
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| unavailable(collection, e))?;
        Ok(())
    }
}
