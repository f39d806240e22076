// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod catalog;
pub mod completions;
pub mod favorites;
pub mod location;
pub mod poi;
pub mod preference_filter;
pub mod preferences;
pub mod recommendation;
pub mod tracking;

pub use catalog::RouteCatalog;
pub use completions::CompletionService;
pub use favorites::FavoritesService;
pub use location::{DeviceFeed, LocationProvider, StepCounter, WatchOptions};
pub use poi::PoiService;
pub use preferences::PreferenceService;
pub use recommendation::RecommendationService;
pub use tracking::{StoppedSession, TrackingError, TrackingService};
