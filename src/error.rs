// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::db::StoreError;
use crate::services::TrackingError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Tracking(#[from] TrackingError),

    #[error("Data store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Tracking(err) => match err {
                TrackingError::AlreadyActive => (StatusCode::CONFLICT, "already_active", None),
                TrackingError::NoActiveSession => {
                    (StatusCode::CONFLICT, "no_active_session", None)
                }
                TrackingError::SessionStillActive => {
                    (StatusCode::CONFLICT, "session_active", None)
                }
                TrackingError::LocationUnsupported => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "location_unsupported",
                    None,
                ),
                TrackingError::SessionCreateFailed(e) => {
                    tracing::error!(error = %e, "Session create failed");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "session_create_failed",
                        None,
                    )
                }
                TrackingError::DataUnavailable(e) => {
                    tracing::error!(error = %e, "Tracking data unavailable");
                    (StatusCode::SERVICE_UNAVAILABLE, "data_unavailable", None)
                }
            },
            AppError::Store(StoreError::NotFound { collection, id }) => (
                StatusCode::NOT_FOUND,
                "not_found",
                Some(format!("{}/{}", collection, id)),
            ),
            AppError::Store(err) => {
                tracing::error!(error = %err, "Data store error");
                (StatusCode::SERVICE_UNAVAILABLE, "data_unavailable", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
