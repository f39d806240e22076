// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP API tests: validation, recommendations, the catalogs, favorites,
//! completed routes and the tracking flow, driven through the router.

use axum::http::{header, StatusCode};
use serde_json::json;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_invalid_latitude_rejected() {
    let (app, state) = common::create_test_app().await;
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(common::authed_request(
            "GET",
            "/api/recommendations?lat=123.0&lng=2.35",
            &token,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::json_body(response).await;
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_limit_out_of_range_rejected() {
    let (app, state) = common::create_test_app().await;
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(common::authed_request(
            "GET",
            "/api/recommendations/general?limit=0",
            &token,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_negative_radius_rejected() {
    let (app, state) = common::create_test_app().await;
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(common::authed_request(
            "GET",
            "/api/routes/nearby?lat=48.85&lng=2.35&radius_km=-1",
            &token,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_general_recommendations_default_limit() {
    let (app, state) = common::create_test_app().await;
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(common::authed_request(
            "GET",
            "/api/recommendations/general",
            &token,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["routes"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_save_preferences_then_personalized() {
    let (app, state) = common::create_test_app().await;
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "PUT",
            "/api/preferences",
            &token,
            Some(json!({
                "role": "parent",
                "activity_types": ["nature"],
                "age_groups": ["tout-petit"],
                "max_distance_km": 5,
                "requires_accessibility": true
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["completed"], true);
    assert_eq!(body["preferences"]["user_id"], "u1");

    let response = app
        .oneshot(common::authed_request(
            "GET",
            "/api/recommendations?lat=48.8566&lng=2.3522",
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::json_body(response).await;
    let names: Vec<&str> = body["routes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Jardin du Luxembourg", "Parc des Buttes-Chaumont"]);
    assert!(body["routes"][0]["distance_km_from_user"].as_f64().unwrap() < 2.0);
}

#[tokio::test]
async fn test_invalid_preferences_rejected() {
    let (app, state) = common::create_test_app().await;
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(common::authed_request(
            "PUT",
            "/api/preferences",
            &token,
            Some(json!({ "max_distance_km": -3 })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_nearby_uses_default_origin() {
    let (app, state) = common::create_test_app().await;
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .oneshot(common::authed_request(
            "GET",
            "/api/routes/nearby?radius_km=2",
            &token,
            None,
        ))
        .await
        .unwrap();

    let body = common::json_body(response).await;
    let ids: Vec<&str> = body["routes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["6", "2", "5"]);
}

#[tokio::test]
async fn test_favorites_roundtrip() {
    let (app, state) = common::create_test_app().await;
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    for route_id in ["4", "2", "4"] {
        let response = app
            .clone()
            .oneshot(common::authed_request(
                "PUT",
                &format!("/api/favorites/{}", route_id),
                &token,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(common::authed_request("DELETE", "/api/favorites/2", &token, None))
        .await
        .unwrap();
    let body = common::json_body(response).await;
    assert_eq!(body["favorite"], false);

    let response = app
        .oneshot(common::authed_request("GET", "/api/favorites", &token, None))
        .await
        .unwrap();
    let body = common::json_body(response).await;
    let routes = body["routes"].as_array().unwrap();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0]["name"], "Montmartre");
}

#[tokio::test]
async fn test_tracking_flow() {
    let (app, state) = common::create_test_app().await;
    let token = common::create_test_jwt("walker", &state.config.jwt_signing_key);

    // Positions before start have nowhere to go
    let response = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            "/api/tracking/positions",
            &token,
            Some(json!({ "lat": 48.8606, "lng": 2.3376, "timestamp": 0 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            "/api/tracking/start",
            &token,
            Some(json!({ "route_id": "2" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = common::json_body(response).await;
    assert_eq!(body["session"]["route_name"], "Musée du Louvre");
    let session_id = body["session"]["id"].as_str().unwrap().to_string();

    // A second start conflicts
    let response = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            "/api/tracking/start",
            &token,
            Some(json!({})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(common::json_body(response).await["error"], "already_active");

    let samples = [
        json!({ "latitude": 48.8606, "longitude": 2.3376, "elevation": 35.0, "timestamp_millis": 0 }),
        json!({ "latitude": 48.8612, "longitude": 2.3390, "elevation": 37.0, "timestamp_millis": 20000 }),
        json!({ "latitude": 48.8620, "longitude": 2.3405, "elevation": 36.0, "timestamp_millis": 40000 }),
    ];
    for sample in samples {
        let response = app
            .clone()
            .oneshot(common::authed_request(
                "POST",
                "/api/tracking/positions",
                &token,
                Some(sample),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            "/api/tracking/steps",
            &token,
            Some(json!({ "steps": 310 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(common::authed_request("POST", "/api/tracking/stop", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["persisted"], true);
    // Every accepted sample is in the final record, no matter how quickly stop follows
    assert_eq!(body["session"]["points"].as_array().unwrap().len(), 3);
    assert_eq!(body["session"]["steps"], 310);
    assert_eq!(body["session"]["is_active"], false);
    assert!(body["session"]["stats"]["distance_meters"].as_f64().unwrap() > 100.0);
    assert_eq!(body["session"]["stats"]["elevation_gain"], 2.0);
    assert_eq!(body["session"]["stats"]["elevation_loss"], 1.0);

    let response = app
        .clone()
        .oneshot(common::authed_request("POST", "/api/tracking/stop", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(common::json_body(response).await["error"], "no_active_session");

    let response = app
        .clone()
        .oneshot(common::authed_request("GET", "/api/tracking/sessions", &token, None))
        .await
        .unwrap();
    let body = common::json_body(response).await;
    assert_eq!(body["sessions"].as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "GET",
            &format!("/api/tracking/sessions/{}/geojson", session_id),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/geo+json"
    );
    let body = common::json_body(response).await;
    assert_eq!(body["type"], "Feature");
    assert_eq!(body["geometry"]["type"], "LineString");
    assert_eq!(body["geometry"]["coordinates"].as_array().unwrap().len(), 3);

    // Someone else cannot read it
    let other = common::create_test_jwt("someone-else", &state.config.jwt_signing_key);
    let response = app
        .oneshot(common::authed_request(
            "GET",
            &format!("/api/tracking/sessions/{}", session_id),
            &other,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_position_rejected() {
    let (app, state) = common::create_test_app().await;
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);
    state.tracking.start("u1", None, None).await.unwrap();

    let response = app
        .oneshot(common::authed_request(
            "POST",
            "/api/tracking/positions",
            &token,
            Some(json!({ "latitude": 91.0, "longitude": 2.35 })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_start_with_store_down() {
    let (app, state) = common::create_test_app().await;
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);
    state
        .store
        .memory()
        .unwrap()
        .set_unavailable("tracking_sessions", true);

    let response = app
        .oneshot(common::authed_request(
            "POST",
            "/api/tracking/start",
            &token,
            Some(json!({})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(common::json_body(response).await["error"], "session_create_failed");
}

#[tokio::test]
async fn test_route_detail() {
    let (app, state) = common::create_test_app().await;
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .clone()
        .oneshot(common::authed_request("GET", "/api/routes/3", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["name"], "Tour Eiffel");
    assert_eq!(body["duration_minutes"], 120);

    let response = app
        .oneshot(common::authed_request("GET", "/api/routes/99", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_completed_routes_and_stats() {
    let (app, state) = common::create_test_app().await;
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            "/api/routes/4/complete",
            &token,
            Some(json!({ "duration_minutes": 95, "rating": 4 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = common::json_body(response).await;
    assert_eq!(body["route_id"], "4");
    assert!(body["completed_at"].as_str().unwrap().ends_with('Z'));

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            "/api/routes/99/complete",
            &token,
            Some(json!({ "duration_minutes": 10 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            "/api/routes/1/complete",
            &token,
            Some(json!({ "duration_minutes": 30, "rating": 6 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(common::authed_request("GET", "/api/completed-routes", &token, None))
        .await
        .unwrap();
    let body = common::json_body(response).await;
    let routes = body["routes"].as_array().unwrap();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0]["rating"], 4);
    assert_eq!(routes[0]["route"]["name"], "Montmartre");

    app.clone()
        .oneshot(common::authed_request("PUT", "/api/favorites/2", &token, None))
        .await
        .unwrap();

    let response = app
        .oneshot(common::authed_request("GET", "/api/user/stats", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(
        body,
        json!({ "favorites": 1, "completed_routes": 1, "walks": 0 })
    );
}

#[tokio::test]
async fn test_points_of_interest() {
    let (app, state) = common::create_test_app().await;
    let token = common::create_test_jwt("u1", &state.config.jwt_signing_key);

    let response = app
        .clone()
        .oneshot(common::authed_request("GET", "/api/pois", &token, None))
        .await
        .unwrap();
    let body = common::json_body(response).await;
    assert_eq!(body["pois"].as_array().unwrap().len(), 6);

    let response = app
        .clone()
        .oneshot(common::authed_request("GET", "/api/pois?type=parc", &token, None))
        .await
        .unwrap();
    let body = common::json_body(response).await;
    let pois = body["pois"].as_array().unwrap();
    assert_eq!(pois.len(), 2);
    assert!(pois.iter().all(|p| p["type"] == "parc"));

    let response = app
        .oneshot(common::authed_request("GET", "/api/pois/types", &token, None))
        .await
        .unwrap();
    let body = common::json_body(response).await;
    assert_eq!(body["types"], json!(["monument", "musée", "parc"]));
}

#[tokio::test]
async fn test_walk_description() {
    let (app, state) = common::create_test_app().await;
    let token = common::create_test_jwt("walker", &state.config.jwt_signing_key);
    let session = state.tracking.start("walker", None, None).await.unwrap();
    let uri = format!("/api/tracking/sessions/{}/description", session.id);

    // Not while the walk is still going
    let response = app
        .clone()
        .oneshot(common::authed_request(
            "PUT",
            &uri,
            &token,
            Some(json!({ "description": "Trop tôt" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(common::json_body(response).await["error"], "session_active");

    state.tracking.stop("walker").await.unwrap();

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "PUT",
            &uri,
            &token,
            Some(json!({ "description": "Pique-nique au bord du lac" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["description"], "Pique-nique au bord du lac");

    let other = common::create_test_jwt("someone-else", &state.config.jwt_signing_key);
    let response = app
        .clone()
        .oneshot(common::authed_request(
            "PUT",
            &uri,
            &other,
            Some(json!({ "description": "Pas à moi" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(common::authed_request(
            "GET",
            &format!("/api/tracking/sessions/{}", session.id),
            &token,
            None,
        ))
        .await
        .unwrap();
    let body = common::json_body(response).await;
    assert_eq!(body["description"], "Pique-nique au bord du lac");
}
