// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod favorite;
pub mod poi;
pub mod preferences;
pub mod route;
pub mod stats;
pub mod tracking;

pub use favorite::FavoriteRoute;
pub use poi::PointOfInterest;
pub use preferences::{ActivityType, AgeGroup, RoutePreferences, UserRole};
pub use route::RouteCandidate;
pub use stats::{CompletedRoute, CompletedRouteEntry, UserStats};
pub use tracking::{PointOutcome, RunningStats, TrackPoint, TrackingSession};
