// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Favorite routes per user.

use crate::db::{collections, DataStore, Filter, StoreError};
use crate::models::{FavoriteRoute, RouteCandidate};
use crate::time_utils::format_utc_rfc3339;
use std::collections::HashSet;

#[derive(Clone)]
pub struct FavoritesService {
    store: DataStore,
}

impl FavoritesService {
    pub fn new(store: DataStore) -> Self {
        Self { store }
    }

    fn filter(user_id: &str, route_id: &str) -> Filter {
        Filter::all().eq("user_id", user_id).eq("route_id", route_id)
    }

    pub async fn is_favorite(&self, user_id: &str, route_id: &str) -> Result<bool, StoreError> {
        let found = self
            .store
            .get(collections::USER_FAVORITES, &Self::filter(user_id, route_id).limit(1))
            .await?;
        Ok(!found.is_empty())
    }

    /// Mark a route as favorite. Adding twice is a no-op.
    pub async fn add(&self, user_id: &str, route_id: &str) -> Result<(), StoreError> {
        if self.is_favorite(user_id, route_id).await? {
            return Ok(());
        }

        let favorite = FavoriteRoute {
            id: String::new(),
            user_id: user_id.to_string(),
            route_id: route_id.to_string(),
            created_at: format_utc_rfc3339(chrono::Utc::now()),
        };
        self.store
            .insert_as(collections::USER_FAVORITES, &favorite)
            .await?;
        tracing::info!(user_id, route_id, "Favorite added");
        Ok(())
    }

    pub async fn remove(&self, user_id: &str, route_id: &str) -> Result<(), StoreError> {
        let removed = self
            .store
            .delete(collections::USER_FAVORITES, &Self::filter(user_id, route_id))
            .await?;
        tracing::info!(user_id, route_id, removed, "Favorite removed");
        Ok(())
    }

    /// Favorite route IDs in the order they were added.
    pub async fn list_ids(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let favorites: Vec<FavoriteRoute> = self
            .store
            .get_as(
                collections::USER_FAVORITES,
                &Filter::all().eq("user_id", user_id),
            )
            .await?;
        Ok(favorites.into_iter().map(|f| f.route_id).collect())
    }

    /// Favorite routes resolved against the catalog, in catalog order.
    ///
    /// Favorites pointing at routes that no longer exist are skipped.
    pub async fn list_routes(&self, user_id: &str) -> Result<Vec<RouteCandidate>, StoreError> {
        let ids: HashSet<String> = self.list_ids(user_id).await?.into_iter().collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let routes: Vec<RouteCandidate> = self
            .store
            .get_as(collections::ROUTES, &Filter::all())
            .await?;
        Ok(routes.into_iter().filter(|r| ids.contains(&r.id)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn store_with_routes() -> DataStore {
        let store = DataStore::in_memory();
        for (id, name) in [("1", "Buttes-Chaumont"), ("2", "Louvre"), ("3", "Tour Eiffel")] {
            store
                .insert(
                    collections::ROUTES,
                    json!({
                        "id": id,
                        "name": name,
                        "activity_type": "culture",
                        "start_point": { "lat": 48.86, "lng": 2.35 }
                    }),
                )
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let store = store_with_routes().await;
        let favorites = FavoritesService::new(store.clone());

        favorites.add("u1", "2").await.unwrap();
        favorites.add("u1", "2").await.unwrap();

        assert!(favorites.is_favorite("u1", "2").await.unwrap());
        assert!(!favorites.is_favorite("u2", "2").await.unwrap());
        assert_eq!(store.memory().unwrap().len(collections::USER_FAVORITES), 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let favorites = FavoritesService::new(store_with_routes().await);
        favorites.add("u1", "1").await.unwrap();
        favorites.add("u1", "3").await.unwrap();

        favorites.remove("u1", "1").await.unwrap();
        // Removing something that isn't there is fine
        favorites.remove("u1", "1").await.unwrap();

        assert_eq!(favorites.list_ids("u1").await.unwrap(), vec!["3"]);
    }

    #[tokio::test]
    async fn test_list_routes_in_catalog_order() {
        let favorites = FavoritesService::new(store_with_routes().await);
        favorites.add("u1", "3").await.unwrap();
        favorites.add("u1", "1").await.unwrap();
        favorites.add("u1", "deleted-route").await.unwrap();

        let routes = favorites.list_routes("u1").await.unwrap();
        let names: Vec<&str> = routes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Buttes-Chaumont", "Tour Eiffel"]);

        assert!(favorites.list_routes("nobody").await.unwrap().is_empty());
    }
}
