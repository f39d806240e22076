// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user activity records and counters.

use crate::models::RouteCandidate;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A catalog route the user reports having walked
/// (`user_completed_routes` collection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompletedRoute {
    /// Document ID
    pub id: String,
    pub user_id: String,
    pub route_id: String,
    /// When the route was completed (ISO 8601)
    pub completed_at: String,
    pub duration_minutes: u32,
    /// 1 to 5 stars
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

/// A completion together with the catalog route it refers to.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompletedRouteEntry {
    #[serde(flatten)]
    pub completion: CompletedRoute,
    /// `None` when the route has since left the catalog
    pub route: Option<RouteCandidate>,
}

/// Profile counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserStats {
    pub favorites: usize,
    pub completed_routes: usize,
    /// Finished tracking sessions
    pub walks: usize,
}
