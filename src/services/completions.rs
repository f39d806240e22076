// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Completed catalog routes and the profile counters built on them.

use crate::db::{collections, DataStore, Filter, StoreError};
use crate::models::{CompletedRoute, CompletedRouteEntry, RouteCandidate, UserStats};
use crate::services::catalog::RouteCatalog;
use crate::time_utils::format_utc_rfc3339;
use std::collections::HashMap;

#[derive(Clone)]
pub struct CompletionService {
    store: DataStore,
    catalog: RouteCatalog,
}

impl CompletionService {
    pub fn new(store: DataStore, catalog: RouteCatalog) -> Self {
        Self { store, catalog }
    }

    /// Record that the user walked `route_id`.
    ///
    /// `Ok(None)` if the route is not in the catalog.
    pub async fn mark_completed(
        &self,
        user_id: &str,
        route_id: &str,
        duration_minutes: u32,
        rating: Option<u8>,
    ) -> Result<Option<CompletedRoute>, StoreError> {
        if self.catalog.get_route(route_id).await?.is_none() {
            return Ok(None);
        }

        let completion = CompletedRoute {
            id: String::new(),
            user_id: user_id.to_string(),
            route_id: route_id.to_string(),
            completed_at: format_utc_rfc3339(chrono::Utc::now()),
            duration_minutes,
            rating,
        };
        let stored = self
            .store
            .insert_as(collections::COMPLETED_ROUTES, &completion)
            .await?;
        tracing::info!(user_id, route_id, duration_minutes, "Route completed");
        Ok(Some(stored))
    }

    /// The user's completions, most recent first, each with its route.
    pub async fn list(&self, user_id: &str) -> Result<Vec<CompletedRouteEntry>, StoreError> {
        let mut completions: Vec<CompletedRoute> = self
            .store
            .get_as(
                collections::COMPLETED_ROUTES,
                &Filter::all().eq("user_id", user_id),
            )
            .await?;
        if completions.is_empty() {
            return Ok(Vec::new());
        }
        // RFC 3339 UTC strings sort chronologically
        completions.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

        let routes: HashMap<String, RouteCandidate> = self
            .store
            .get_as::<RouteCandidate>(collections::ROUTES, &Filter::all())
            .await?
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();

        Ok(completions
            .into_iter()
            .map(|completion| CompletedRouteEntry {
                route: routes.get(&completion.route_id).cloned(),
                completion,
            })
            .collect())
    }

    /// Favorite, completed-route and finished-walk counts.
    ///
    /// A counter that cannot be read is reported as zero.
    pub async fn stats(&self, user_id: &str) -> UserStats {
        let favorites = self
            .count(collections::USER_FAVORITES, Filter::all().eq("user_id", user_id))
            .await;
        let completed_routes = self
            .count(collections::COMPLETED_ROUTES, Filter::all().eq("user_id", user_id))
            .await;
        let walks = self
            .count(
                collections::TRACKING_SESSIONS,
                Filter::all().eq("user_id", user_id).eq("is_active", false),
            )
            .await;

        UserStats {
            favorites,
            completed_routes,
            walks,
        }
    }

    async fn count(&self, collection: &str, filter: Filter) -> usize {
        match self.store.get(collection, &filter).await {
            Ok(records) => records.len(),
            Err(e) => {
                tracing::warn!(collection, error = %e, "Failed to count records");
                0
            }
        }
    }
}
