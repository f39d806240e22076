// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for preferences, recommendations, the route and
//! point-of-interest catalogs, favorites and completed routes.

use crate::error::{AppError, Result};
use crate::geo_math::Coordinate;
use crate::middleware::auth::AuthUser;
use crate::models::{
    CompletedRoute, CompletedRouteEntry, PointOfInterest, RouteCandidate, RoutePreferences,
    UserStats,
};
use crate::routes::validated;
use crate::services::preferences::PreferencesInput;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/preferences",
            get(get_preferences).put(save_preferences),
        )
        .route("/api/recommendations", get(get_recommendations))
        .route("/api/recommendations/general", get(get_general))
        .route("/api/routes/nearby", get(get_nearby))
        .route("/api/routes/{route_id}", get(get_route))
        .route("/api/routes/{route_id}/complete", post(complete_route))
        .route("/api/completed-routes", get(list_completed))
        .route("/api/user/stats", get(get_stats))
        .route("/api/pois", get(list_pois))
        .route("/api/pois/types", get(list_poi_types))
        .route("/api/favorites", get(list_favorites))
        .route(
            "/api/favorites/{route_id}",
            put(add_favorite).delete(remove_favorite),
        )
}

// ─── Preferences ─────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PreferencesResponse {
    /// Whether the user has filled in the preferences form
    pub completed: bool,
    pub preferences: Option<RoutePreferences>,
}

async fn get_preferences(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PreferencesResponse>> {
    let preferences = state.preferences.get(&user.user_id).await?;
    Ok(Json(PreferencesResponse {
        completed: preferences.is_some(),
        preferences,
    }))
}

async fn save_preferences(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<PreferencesInput>,
) -> Result<Json<PreferencesResponse>> {
    let input = validated(input)?;
    let saved = state.preferences.save(&user.user_id, input).await?;
    Ok(Json(PreferencesResponse {
        completed: true,
        preferences: Some(saved),
    }))
}

// ─── Recommendations ─────────────────────────────────────────

/// Route list response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RoutesResponse {
    pub routes: Vec<RouteCandidate>,
}

#[derive(Debug, Deserialize, Validate)]
struct RecommendationsQuery {
    #[validate(range(min = -90.0, max = 90.0))]
    lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    lng: Option<f64>,
    #[validate(range(min = 1, max = 100))]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize, Validate)]
struct GeneralQuery {
    #[validate(range(min = 1, max = 100))]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize, Validate)]
struct NearbyQuery {
    #[validate(range(min = -90.0, max = 90.0))]
    lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    lng: Option<f64>,
    #[validate(range(min = 0.0))]
    radius_km: Option<f64>,
    #[validate(range(min = 1, max = 100))]
    limit: Option<usize>,
}

/// Request origin, or the configured default when the client sent none.
fn origin(state: &AppState, lat: Option<f64>, lng: Option<f64>) -> Coordinate {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Coordinate::new(lat, lng),
        _ => state.config.default_origin,
    }
}

async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RecommendationsQuery>,
) -> Result<Json<RoutesResponse>> {
    let query = validated(query)?;
    let origin = origin(&state, query.lat, query.lng);
    let limit = query.limit.unwrap_or(state.config.recommendation_limit);

    let routes = state
        .recommendations
        .get_personalized(&user.user_id, origin, limit)
        .await;
    Ok(Json(RoutesResponse { routes }))
}

async fn get_general(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GeneralQuery>,
) -> Result<Json<RoutesResponse>> {
    let query = validated(query)?;
    let limit = query.limit.unwrap_or(state.config.recommendation_limit);

    let routes = state.recommendations.get_general(limit).await;
    Ok(Json(RoutesResponse { routes }))
}

async fn get_nearby(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<RoutesResponse>> {
    let query = validated(query)?;
    let origin = origin(&state, query.lat, query.lng);
    let radius_km = query.radius_km.unwrap_or(state.config.nearby_radius_km);
    let limit = query.limit.unwrap_or(state.config.nearby_limit);

    let routes = state
        .recommendations
        .get_nearby(origin, radius_km, limit)
        .await;
    Ok(Json(RoutesResponse { routes }))
}

async fn get_route(
    State(state): State<Arc<AppState>>,
    Path(route_id): Path<String>,
) -> Result<Json<RouteCandidate>> {
    state
        .catalog
        .get_route(&route_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Route {}", route_id)))
}

// ─── Completed routes ────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
struct CompleteRequest {
    #[validate(range(max = 1440))]
    duration_minutes: u32,
    #[serde(default)]
    #[validate(range(min = 1, max = 5))]
    rating: Option<u8>,
}

async fn complete_route(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(route_id): Path<String>,
    Json(request): Json<CompleteRequest>,
) -> Result<(StatusCode, Json<CompletedRoute>)> {
    let request = validated(request)?;
    let completion = state
        .completions
        .mark_completed(
            &user.user_id,
            &route_id,
            request.duration_minutes,
            request.rating,
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Route {}", route_id)))?;
    Ok((StatusCode::CREATED, Json(completion)))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompletedRoutesResponse {
    pub routes: Vec<CompletedRouteEntry>,
}

async fn list_completed(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CompletedRoutesResponse>> {
    let routes = state.completions.list(&user.user_id).await?;
    Ok(Json(CompletedRoutesResponse { routes }))
}

async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<UserStats> {
    Json(state.completions.stats(&user.user_id).await)
}

// ─── Points of interest ──────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PoiQuery {
    #[serde(default, rename = "type")]
    poi_type: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PoisResponse {
    pub pois: Vec<PointOfInterest>,
}

async fn list_pois(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PoiQuery>,
) -> Result<Json<PoisResponse>> {
    let poi_type = query.poi_type.as_deref().filter(|t| !t.is_empty());
    let pois = state.pois.list(poi_type).await?;
    Ok(Json(PoisResponse { pois }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PoiTypesResponse {
    pub types: Vec<String>,
}

async fn list_poi_types(State(state): State<Arc<AppState>>) -> Result<Json<PoiTypesResponse>> {
    let types = state.pois.types().await?;
    Ok(Json(PoiTypesResponse { types }))
}

// ─── Favorites ───────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FavoriteResponse {
    pub route_id: String,
    pub favorite: bool,
}

async fn list_favorites(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RoutesResponse>> {
    let routes = state.favorites.list_routes(&user.user_id).await?;
    Ok(Json(RoutesResponse { routes }))
}

async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(route_id): Path<String>,
) -> Result<Json<FavoriteResponse>> {
    state.favorites.add(&user.user_id, &route_id).await?;
    Ok(Json(FavoriteResponse {
        route_id,
        favorite: true,
    }))
}

async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(route_id): Path<String>,
) -> Result<Json<FavoriteResponse>> {
    state.favorites.remove(&user.user_id, &route_id).await?;
    Ok(Json(FavoriteResponse {
        route_id,
        favorite: false,
    }))
}
