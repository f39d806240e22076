// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Walkroute: walking route recommendations and live walk tracking
//!
//! This crate provides the backend API that recommends family walks
//! matching a user's preferences and records walks as they happen.

pub mod config;
pub mod db;
pub mod error;
pub mod geo_math;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::DataStore;
use services::{
    CompletionService, DeviceFeed, FavoritesService, PoiService, PreferenceService,
    RecommendationService, RouteCatalog, TrackingService,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: DataStore,
    pub catalog: RouteCatalog,
    pub pois: PoiService,
    pub completions: CompletionService,
    pub preferences: PreferenceService,
    pub recommendations: RecommendationService,
    pub favorites: FavoritesService,
    pub tracking: TrackingService,
    /// Where uploaded device positions and step counts are published
    pub device_feed: Arc<DeviceFeed>,
}

impl AppState {
    /// Wire up every service on top of `store`.
    pub fn new(config: Config, store: DataStore) -> Self {
        let device_feed = Arc::new(DeviceFeed::new());
        let catalog = RouteCatalog::new(store.clone());
        let pois = PoiService::new(store.clone());
        let completions = CompletionService::new(store.clone(), catalog.clone());
        let preferences = PreferenceService::new(store.clone());
        let recommendations = RecommendationService::new(
            store.clone(),
            preferences.clone(),
            config.walking_speed_kmh,
        );
        let favorites = FavoritesService::new(store.clone());
        let tracking = TrackingService::new(
            store.clone(),
            device_feed.clone(),
            device_feed.clone(),
            config.watch_options(),
            config.persist_track_points,
        );

        Self {
            config,
            store,
            catalog,
            pois,
            completions,
            preferences,
            recommendations,
            favorites,
            tracking,
            device_feed,
        }
    }
}
