// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use std::sync::Arc;
use walkroute::config::Config;
use walkroute::db::DataStore;
use walkroute::middleware::auth::create_jwt;
use walkroute::routes::create_router;
use walkroute::services::catalog;
use walkroute::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> DataStore {
    DataStore::firestore("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// The six bundled Paris routes, in file order.
#[allow(dead_code)]
pub fn seed_routes() -> Vec<walkroute::models::RouteCandidate> {
    catalog::load_from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/data/seed_routes.json"))
        .expect("Failed to load seed routes")
}

/// In-memory store pre-loaded with the seed routes and points of interest.
#[allow(dead_code)]
pub async fn seeded_store() -> DataStore {
    let store = DataStore::in_memory();
    catalog::seed_if_empty(&store, &seed_routes())
        .await
        .expect("Failed to seed routes");
    let pois = catalog::load_pois_from_file(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/data/seed_pois.json"
    ))
    .expect("Failed to load seed points of interest");
    catalog::seed_pois_if_empty(&store, &pois)
        .await
        .expect("Failed to seed points of interest");
    store
}

/// Create a test app on a seeded in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Config::test_default(), seeded_store().await));
    (create_router(state.clone()), state)
}

/// Create a session token the auth middleware accepts.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    create_jwt(user_id, signing_key).expect("Failed to create JWT")
}

/// Authenticated request with an optional JSON body.
#[allow(dead_code)]
pub fn authed_request(
    method: &str,
    uri: &str,
    token: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a JSON response body.
#[allow(dead_code)]
pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}
