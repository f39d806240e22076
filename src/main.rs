// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Walkroute API Server
//!
//! Recommends walking routes from user preferences and records live walks
//! uploaded by the web client.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use walkroute::{
    config::{Config, DataStoreKind},
    db::DataStore,
    services::catalog,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Walkroute API");

    let store = match config.data_store {
        DataStoreKind::Firestore => DataStore::firestore(&config.gcp_project_id)
            .await
            .expect("Failed to connect to Firestore"),
        DataStoreKind::Memory => {
            tracing::warn!("Using in-memory data store, nothing will be persisted");
            DataStore::in_memory()
        }
    };

    // Seed the route catalog on first start
    if let Some(path) = &config.seed_routes_path {
        tracing::info!(path = %path, "Loading seed routes");
        match catalog::load_from_file(path) {
            Ok(routes) => {
                if let Err(e) = catalog::seed_if_empty(&store, &routes).await {
                    tracing::error!(error = %e, "Failed to seed route catalog");
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to load seed routes"),
        }
    }

    if let Some(path) = &config.seed_pois_path {
        tracing::info!(path = %path, "Loading seed points of interest");
        match catalog::load_pois_from_file(path) {
            Ok(pois) => {
                if let Err(e) = catalog::seed_pois_if_empty(&store, &pois).await {
                    tracing::error!(error = %e, "Failed to seed points of interest");
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to load seed points of interest"),
        }
    }

    let state = Arc::new(AppState::new(config.clone(), store));

    // Build router
    let app = walkroute::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("walkroute=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
