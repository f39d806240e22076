// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route recommendations.
//!
//! None of these operations fail: a store error degrades to the general
//! list (personalized) or to an empty list (nearby, general) and is logged.

use crate::db::{collections, DataStore, Filter, StoreError};
use crate::geo_math::Coordinate;
use crate::models::RouteCandidate;
use crate::services::preference_filter;
use crate::services::preferences::PreferenceService;

#[derive(Clone)]
pub struct RecommendationService {
    store: DataStore,
    preferences: PreferenceService,
    speed_kmh: f64,
}

impl RecommendationService {
    pub fn new(store: DataStore, preferences: PreferenceService, speed_kmh: f64) -> Self {
        Self {
            store,
            preferences,
            speed_kmh,
        }
    }

    /// Routes matching the user's saved preferences, nearest first.
    ///
    /// Users without preferences, or whose preferences or catalog cannot be
    /// read, get [`get_general`](Self::get_general) instead.
    pub async fn get_personalized(
        &self,
        user_id: &str,
        origin: Coordinate,
        limit: usize,
    ) -> Vec<RouteCandidate> {
        let prefs = match self.preferences.get(user_id).await {
            Ok(Some(prefs)) => prefs,
            Ok(None) => {
                tracing::debug!(user_id, "No preferences saved, using general recommendations");
                return self.get_general(limit).await;
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to load preferences, using general recommendations");
                return self.get_general(limit).await;
            }
        };

        let candidates = match self.fetch_catalog().await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to load routes, using general recommendations");
                return self.get_general(limit).await;
            }
        };

        let total = candidates.len();
        let routes = preference_filter::filter(candidates, &prefs, origin, limit, self.speed_kmh);
        tracing::debug!(
            user_id,
            candidates = total,
            matched = routes.len(),
            "Personalized recommendations"
        );
        routes
    }

    /// Every route within `radius_km` of `origin`, nearest first.
    pub async fn get_nearby(
        &self,
        origin: Coordinate,
        radius_km: f64,
        limit: usize,
    ) -> Vec<RouteCandidate> {
        match self.fetch_catalog().await {
            Ok(candidates) => preference_filter::within_radius(
                candidates,
                origin,
                radius_km,
                limit,
                self.speed_kmh,
            ),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load routes for nearby search");
                Vec::new()
            }
        }
    }

    /// The first `limit` routes of the catalog, unannotated.
    pub async fn get_general(&self, limit: usize) -> Vec<RouteCandidate> {
        if limit == 0 {
            return Vec::new();
        }

        match self
            .store
            .get_as(collections::ROUTES, &Filter::all().limit(limit))
            .await
        {
            Ok(routes) => routes,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load general recommendations");
                Vec::new()
            }
        }
    }

    async fn fetch_catalog(&self) -> Result<Vec<RouteCandidate>, StoreError> {
        self.store.get_as(collections::ROUTES, &Filter::all()).await
    }
}
