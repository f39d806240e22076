// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live tracking routes.
//!
//! The web client starts a session, then uploads each GPS fix and its
//! pedometer total while walking. Uploads are published to the device
//! feed, which the tracking service is subscribed to for the session's
//! lifetime.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{TrackPoint, TrackingSession};
use crate::routes::validated;
use crate::services::location::PositionEvent;
use crate::services::TrackingError;
use crate::time_utils::now_millis;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Tracking routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/tracking/start", post(start_tracking))
        .route("/api/tracking/positions", post(upload_position))
        .route("/api/tracking/steps", post(upload_steps))
        .route("/api/tracking/current", get(current_session))
        .route("/api/tracking/stop", post(stop_tracking))
        .route("/api/tracking/sessions", get(list_sessions))
        .route("/api/tracking/sessions/{id}", get(get_session))
        .route("/api/tracking/sessions/{id}/geojson", get(export_geojson))
        .route(
            "/api/tracking/sessions/{id}/description",
            put(update_description),
        )
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub session: Option<TrackingSession>,
}

// ─── Start / Stop ────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, Validate)]
struct StartRequest {
    #[serde(default, alias = "poi_id")]
    #[validate(length(min = 1, max = 100))]
    route_id: Option<String>,
    #[serde(default, alias = "poi_name")]
    #[validate(length(max = 200))]
    route_name: Option<String>,
}

async fn start_tracking(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<StartRequest>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let request = validated(request)?;

    // Fill in the route name from the catalog when only the ID was sent
    let route_name = match (&request.route_id, request.route_name) {
        (Some(route_id), None) => {
            let route = state.catalog.get_route(route_id).await.unwrap_or_else(|e| {
                tracing::warn!(route_id = %route_id, error = %e, "Failed to look up route name");
                None
            });
            route.map(|r| r.name)
        }
        (_, name) => name,
    };

    let session = state
        .tracking
        .start(&user.user_id, request.route_id, route_name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session: Some(session),
        }),
    ))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StopResponse {
    pub session: TrackingSession,
    /// False when the final record could not be saved
    pub persisted: bool,
}

async fn stop_tracking(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<StopResponse>> {
    let stopped = state.tracking.stop(&user.user_id).await?;
    Ok(Json(StopResponse {
        session: stopped.session,
        persisted: stopped.persisted,
    }))
}

// ─── Device uploads ──────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
struct PositionRequest {
    #[serde(alias = "lat")]
    #[validate(range(min = -90.0, max = 90.0))]
    latitude: f64,
    #[serde(alias = "lng")]
    #[validate(range(min = -180.0, max = 180.0))]
    longitude: f64,
    #[serde(default, alias = "altitude")]
    elevation: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    speed: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    accuracy: Option<f64>,
    /// Device time of the fix; server time when absent
    #[serde(default, alias = "timestamp")]
    timestamp_millis: Option<i64>,
}

impl From<PositionRequest> for TrackPoint {
    fn from(req: PositionRequest) -> Self {
        TrackPoint {
            latitude: req.latitude,
            longitude: req.longitude,
            elevation: req.elevation,
            speed: req.speed,
            accuracy: req.accuracy,
            timestamp_millis: req.timestamp_millis.unwrap_or_else(now_millis),
        }
    }
}

async fn upload_position(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<PositionRequest>,
) -> Result<StatusCode> {
    let point = TrackPoint::from(validated(request)?);

    if !state
        .device_feed
        .publish(&user.user_id, PositionEvent::Sample(point))
    {
        return Err(TrackingError::NoActiveSession.into());
    }
    Ok(StatusCode::ACCEPTED)
}

#[derive(Debug, Deserialize)]
struct StepsRequest {
    steps: u64,
}

async fn upload_steps(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<StepsRequest>,
) -> StatusCode {
    state.device_feed.report_steps(&user.user_id, request.steps);
    StatusCode::NO_CONTENT
}

// ─── History ─────────────────────────────────────────────────

async fn current_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<SessionResponse> {
    Json(SessionResponse {
        session: state.tracking.current(&user.user_id).await,
    })
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionsResponse {
    pub sessions: Vec<TrackingSession>,
}

async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SessionsResponse>> {
    let sessions = state.tracking.list_sessions(&user.user_id).await?;
    Ok(Json(SessionsResponse { sessions }))
}

async fn find_session(state: &AppState, user_id: &str, id: &str) -> Result<TrackingSession> {
    state
        .tracking
        .get_session(user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tracking session {}", id)))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<TrackingSession>> {
    Ok(Json(find_session(&state, &user.user_id, &id).await?))
}

async fn export_geojson(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let session = find_session(&state, &user.user_id, &id).await?;
    Ok((
        [(header::CONTENT_TYPE, "application/geo+json")],
        Json(session.to_geojson()),
    ))
}

#[derive(Debug, Deserialize, Validate)]
struct DescriptionRequest {
    #[validate(length(max = 2000))]
    description: String,
}

async fn update_description(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(request): Json<DescriptionRequest>,
) -> Result<Json<TrackingSession>> {
    let request = validated(request)?;
    state
        .tracking
        .update_description(&user.user_id, &id, &request.description)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Tracking session {}", id)))
}
