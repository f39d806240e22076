// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Walking route / point-of-interest catalog entry.

use crate::geo_math::{self, Coordinate};
use crate::models::preferences::{ActivityType, AgeGroup, RoutePreferences};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A route as stored in the `routes` collection.
///
/// `distance_km_from_user` and `estimated_duration_minutes` are derived per
/// query and never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RouteCandidate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub activity_type: ActivityType,
    #[serde(default)]
    pub suitable_ages: BTreeSet<AgeGroup>,
    /// Wheelchair / stroller accessible
    #[serde(default, rename = "accessibility", alias = "accessible")]
    pub accessible: bool,
    pub start_point: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_point: Option<Coordinate>,
    /// Length of the route itself, when known.
    #[serde(default, rename = "distance_km", skip_serializing_if = "Option::is_none")]
    pub static_distance_km: Option<f64>,
    /// Catalog duration of the route itself, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km_from_user: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration_minutes: Option<u32>,
}

impl RouteCandidate {
    /// Return a copy annotated with the distance from `origin` and the
    /// walking time to cover it.
    pub fn annotated(mut self, origin: Coordinate, speed_kmh: f64) -> Self {
        let distance = geo_math::distance_km(origin, self.start_point);
        self.distance_km_from_user = Some(distance);
        self.estimated_duration_minutes = Some(geo_math::duration_minutes(distance, speed_kmh));
        self
    }

    /// Whether this route passes every preference clause.
    ///
    /// Distance is only checked once the route has been annotated.
    pub fn matches(&self, prefs: &RoutePreferences) -> bool {
        if !prefs.activity_types.is_empty()
            && (self.activity_type == ActivityType::Other
                || !prefs.activity_types.contains(&self.activity_type))
        {
            return false;
        }

        // At least one shared, known age group
        if !prefs.age_groups.is_empty()
            && !self
                .suitable_ages
                .intersection(&prefs.age_groups)
                .any(|age| *age != AgeGroup::Other)
        {
            return false;
        }

        if prefs.requires_accessibility && !self.accessible {
            return false;
        }

        match (prefs.distance_limit_km(), self.distance_km_from_user) {
            (Some(limit), Some(distance)) => distance <= limit,
            _ => true,
        }
    }
}
