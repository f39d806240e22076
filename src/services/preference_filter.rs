// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Preference-based filtering and ranking of route candidates.

use crate::geo_math::Coordinate;
use crate::models::{RouteCandidate, RoutePreferences};

/// Annotate every candidate with its distance from `origin`, keep those
/// matching `prefs`, sort nearest first and keep at most `limit`.
///
/// Ties keep their input order.
pub fn filter(
    candidates: Vec<RouteCandidate>,
    prefs: &RoutePreferences,
    origin: Coordinate,
    limit: usize,
    speed_kmh: f64,
) -> Vec<RouteCandidate> {
    let matching: Vec<RouteCandidate> = candidates
        .into_iter()
        .map(|c| c.annotated(origin, speed_kmh))
        .filter(|c| c.matches(prefs))
        .collect();

    nearest_first(matching, limit)
}

/// Annotate, keep candidates within `radius_km` of `origin`, sort nearest
/// first and keep at most `limit`. No preference matching.
pub fn within_radius(
    candidates: Vec<RouteCandidate>,
    origin: Coordinate,
    radius_km: f64,
    limit: usize,
    speed_kmh: f64,
) -> Vec<RouteCandidate> {
    let nearby: Vec<RouteCandidate> = candidates
        .into_iter()
        .map(|c| c.annotated(origin, speed_kmh))
        .filter(|c| c.distance_km_from_user.is_some_and(|d| d <= radius_km))
        .collect();

    nearest_first(nearby, limit)
}

fn nearest_first(mut routes: Vec<RouteCandidate>, limit: usize) -> Vec<RouteCandidate> {
    // sort_by is stable, so equal distances keep input order
    routes.sort_by(|a, b| {
        let da = a.distance_km_from_user.unwrap_or(f64::INFINITY);
        let db = b.distance_km_from_user.unwrap_or(f64::INFINITY);
        da.total_cmp(&db)
    });
    routes.truncate(limit);
    routes
}
