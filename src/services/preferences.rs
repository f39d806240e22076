// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stored user preferences: lookup and upsert.

use crate::db::{collections, DataStore, Filter, StoreError};
use crate::models::{ActivityType, AgeGroup, RoutePreferences, UserRole};
use crate::time_utils::format_utc_rfc3339;
use serde::Deserialize;
use std::collections::BTreeSet;

/// Fields a user submits from the preferences form.
#[derive(Debug, Clone, Deserialize, validator::Validate)]
pub struct PreferencesInput {
    #[serde(default)]
    pub role: UserRole,
    #[serde(default, alias = "activities")]
    pub activity_types: BTreeSet<ActivityType>,
    #[serde(default)]
    pub age_groups: BTreeSet<AgeGroup>,
    #[validate(range(min = 0.0, max = 500.0))]
    #[serde(default, alias = "max_distance")]
    pub max_distance_km: Option<f64>,
    #[serde(default, alias = "accessibility_needs")]
    pub requires_accessibility: bool,
    #[validate(range(max = 1440))]
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

/// Preferences persistence.
#[derive(Clone)]
pub struct PreferenceService {
    store: DataStore,
}

impl PreferenceService {
    pub fn new(store: DataStore) -> Self {
        Self { store }
    }

    /// Load a user's preferences. `Ok(None)` if they never saved any.
    pub async fn get(&self, user_id: &str) -> Result<Option<RoutePreferences>, StoreError> {
        self.store
            .find_one(
                collections::PREFERENCES,
                &Filter::all().eq("user_id", user_id),
            )
            .await
    }

    /// Whether the user has saved preferences. Lookup failures count as "no".
    pub async fn has_completed(&self, user_id: &str) -> bool {
        match self.get(user_id).await {
            Ok(prefs) => prefs.is_some(),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to check preferences");
                false
            }
        }
    }

    /// Create the user's preferences on first save, update them in place after.
    pub async fn save(
        &self,
        user_id: &str,
        input: PreferencesInput,
    ) -> Result<RoutePreferences, StoreError> {
        let now = format_utc_rfc3339(chrono::Utc::now());
        let existing = self.get(user_id).await?;

        let prefs = RoutePreferences {
            id: existing.as_ref().map(|p| p.id.clone()).unwrap_or_default(),
            user_id: user_id.to_string(),
            role: input.role,
            activity_types: input.activity_types,
            age_groups: input.age_groups,
            max_distance_km: input.max_distance_km,
            requires_accessibility: input.requires_accessibility,
            duration_minutes: input.duration_minutes,
            created_at: existing
                .as_ref()
                .map(|p| p.created_at.clone())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| now.clone()),
            updated_at: now,
        };

        match existing {
            Some(current) => {
                let patch = serde_json::to_value(&prefs).map_err(|e| StoreError::Serialization {
                    collection: collections::PREFERENCES.to_string(),
                    message: e.to_string(),
                })?;
                let stored = self
                    .store
                    .update(collections::PREFERENCES, &current.id, patch)
                    .await?;
                tracing::info!(user_id, "Preferences updated");
                serde_json::from_value(stored).map_err(|e| StoreError::Serialization {
                    collection: collections::PREFERENCES.to_string(),
                    message: e.to_string(),
                })
            }
            None => {
                let stored = self
                    .store
                    .insert_as(collections::PREFERENCES, &prefs)
                    .await?;
                tracing::info!(user_id, "Preferences created");
                Ok(stored)
            }
        }
    }
}
