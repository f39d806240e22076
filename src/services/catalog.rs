// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route and point-of-interest catalogs: lookup and startup seeding.

use crate::db::{collections, DataStore, Filter, StoreError};
use crate::models::{PointOfInterest, RouteCandidate};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid catalog file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Read access to the `routes` collection.
#[derive(Clone)]
pub struct RouteCatalog {
    store: DataStore,
}

impl RouteCatalog {
    pub fn new(store: DataStore) -> Self {
        Self { store }
    }

    /// One route by ID, unannotated.
    pub async fn get_route(&self, route_id: &str) -> Result<Option<RouteCandidate>, StoreError> {
        self.store
            .find_one(collections::ROUTES, &Filter::all().eq("id", route_id))
            .await
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Load a JSON array of routes from disk.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Vec<RouteCandidate>, CatalogError> {
    load_json(path.as_ref())
}

/// Load a JSON array of points of interest from disk.
pub fn load_pois_from_file(path: impl AsRef<Path>) -> Result<Vec<PointOfInterest>, CatalogError> {
    load_json(path.as_ref())
}

/// Insert `routes` when the catalog is empty. Returns how many were written.
pub async fn seed_if_empty(
    store: &DataStore,
    routes: &[RouteCandidate],
) -> Result<usize, CatalogError> {
    seed_collection(store, collections::ROUTES, routes).await
}

/// Insert `pois` when no point of interest is stored yet.
pub async fn seed_pois_if_empty(
    store: &DataStore,
    pois: &[PointOfInterest],
) -> Result<usize, CatalogError> {
    seed_collection(store, collections::POINTS_OF_INTEREST, pois).await
}

async fn seed_collection<T: Serialize + DeserializeOwned>(
    store: &DataStore,
    collection: &str,
    items: &[T],
) -> Result<usize, CatalogError> {
    let existing = store.get(collection, &Filter::all().limit(1)).await?;
    if !existing.is_empty() {
        tracing::debug!(collection, "Collection already populated, skipping seed");
        return Ok(0);
    }

    for item in items {
        store.insert_as(collection, item).await?;
    }

    tracing::info!(collection, count = items.len(), "Seeded collection");
    Ok(items.len())
}
