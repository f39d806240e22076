// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User route preferences.
//!
//! Older front-end builds wrote the same document under different key
//! names (`activities`, `activity_preferences`, `max_distance`,
//! `accessibility_needs`). Those are accepted on read and every write uses
//! the canonical names below.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Kind of outing a route offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Nature,
    #[serde(rename = "histoire")]
    History,
    Culture,
    Sport,
    #[serde(rename = "aventure")]
    Adventure,
    /// Any value this build does not know about.
    #[serde(other)]
    Other,
}

/// Age bracket a route is suitable for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum AgeGroup {
    #[serde(rename = "tout-petit")]
    Toddler,
    #[serde(rename = "enfant")]
    Child,
    #[serde(rename = "adolescent")]
    Teen,
    #[serde(rename = "adulte")]
    Adult,
    /// Any value this build does not know about.
    #[serde(other)]
    Other,
}

/// Who filled in the preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum UserRole {
    #[default]
    #[serde(rename = "parent")]
    Parent,
    #[serde(rename = "enfant")]
    Child,
}

/// Stored preferences document (`preferences` collection, one per user).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RoutePreferences {
    /// Document ID
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub role: UserRole,
    /// Empty means "any activity".
    #[serde(default, alias = "activities", alias = "activity_preferences")]
    pub activity_types: BTreeSet<ActivityType>,
    /// Empty means "any age".
    #[serde(default)]
    pub age_groups: BTreeSet<AgeGroup>,
    /// Maximum distance from the user to a route start. `None` or 0 disables the cut.
    #[serde(default, alias = "max_distance")]
    pub max_distance_km: Option<f64>,
    #[serde(default, alias = "accessibility_needs")]
    pub requires_accessibility: bool,
    /// Preferred outing length, informational only.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl RoutePreferences {
    /// Effective distance cut, treating 0 and negatives as unset.
    pub fn distance_limit_km(&self) -> Option<f64> {
        self.max_distance_km.filter(|d| *d > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_document() {
        let prefs: RoutePreferences = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "user_id": "u1",
            "role": "parent",
            "activity_types": ["nature", "histoire"],
            "age_groups": ["tout-petit", "adulte"],
            "max_distance_km": 12.5,
            "requires_accessibility": true
        }))
        .unwrap();

        assert!(prefs.activity_types.contains(&ActivityType::History));
        assert!(prefs.age_groups.contains(&AgeGroup::Toddler));
        assert_eq!(prefs.distance_limit_km(), Some(12.5));
        assert!(prefs.requires_accessibility);
    }

    #[test]
    fn test_legacy_aliases() {
        let prefs: RoutePreferences = serde_json::from_value(serde_json::json!({
            "user_id": "u1",
            "activities": ["culture"],
            "max_distance": 5,
            "accessibility_needs": true
        }))
        .unwrap();

        assert_eq!(
            prefs.activity_types,
            BTreeSet::from([ActivityType::Culture])
        );
        assert_eq!(prefs.max_distance_km, Some(5.0));
        assert!(prefs.requires_accessibility);

        let prefs: RoutePreferences = serde_json::from_value(serde_json::json!({
            "user_id": "u2",
            "activity_preferences": ["aventure", "sport"]
        }))
        .unwrap();
        assert_eq!(prefs.activity_types.len(), 2);
        assert_eq!(prefs.role, UserRole::Parent);
    }

    #[test]
    fn test_zero_distance_means_unset() {
        let prefs: RoutePreferences = serde_json::from_value(serde_json::json!({
            "user_id": "u1",
            "max_distance_km": 0
        }))
        .unwrap();
        assert_eq!(prefs.distance_limit_km(), None);
    }

    #[test]
    fn test_unknown_activity_decodes_as_other() {
        let a: ActivityType = serde_json::from_str("\"plage\"").unwrap();
        assert_eq!(a, ActivityType::Other);
    }

    #[test]
    fn test_writes_canonical_names() {
        let prefs: RoutePreferences = serde_json::from_value(serde_json::json!({
            "user_id": "u1",
            "activities": ["nature"]
        }))
        .unwrap();
        let json = serde_json::to_value(&prefs).unwrap();
        assert!(json.get("activity_types").is_some());
        assert!(json.get("activities").is_none());
    }
}
