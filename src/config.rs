//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local development.

use crate::geo_math::{Coordinate, DEFAULT_WALKING_SPEED_KMH};
use crate::services::WatchOptions;
use std::env;
use std::str::FromStr;

/// Which data store backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStoreKind {
    Memory,
    Firestore,
}

impl FromStr for DataStoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "firestore" => Ok(Self::Firestore),
            _ => Err(ConfigError::Invalid("DATA_STORE", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL (CORS origin)
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// JWT signing key shared with the auth issuer (raw bytes)
    pub jwt_signing_key: Vec<u8>,

    pub data_store: DataStoreKind,
    /// GCP project ID (Firestore backend only)
    pub gcp_project_id: String,
    /// Routes to seed into an empty catalog at startup
    pub seed_routes_path: Option<String>,
    /// Points of interest to seed into an empty collection at startup
    pub seed_pois_path: Option<String>,

    // --- Recommendation defaults ---
    /// Origin used when a request carries no position
    pub default_origin: Coordinate,
    pub walking_speed_kmh: f64,
    pub recommendation_limit: usize,
    pub nearby_radius_km: f64,
    pub nearby_limit: usize,

    // --- Tracking ---
    pub location_high_accuracy: bool,
    pub location_timeout_ms: u64,
    /// Also write each sample to `track_points` as it arrives
    pub persist_track_points: bool,
}

impl Config {
    /// Deterministic config for tests.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            data_store: DataStoreKind::Memory,
            gcp_project_id: "test-project".to_string(),
            seed_routes_path: None,
            seed_pois_path: None,
            default_origin: Coordinate::new(48.8566, 2.3522),
            walking_speed_kmh: DEFAULT_WALKING_SPEED_KMH,
            recommendation_limit: 4,
            nearby_radius_km: 10.0,
            nearby_limit: 6,
            location_high_accuracy: true,
            location_timeout_ms: 5000,
            persist_track_points: false,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let default_origin = Coordinate::new(
            parse_or("DEFAULT_ORIGIN_LAT", 48.8566)?,
            parse_or("DEFAULT_ORIGIN_LNG", 2.3522)?,
        );
        if !default_origin.is_valid() {
            return Err(ConfigError::Invalid(
                "DEFAULT_ORIGIN_LAT/DEFAULT_ORIGIN_LNG",
                format!("{}, {}", default_origin.latitude, default_origin.longitude),
            ));
        }

        let walking_speed_kmh: f64 = parse_or("WALKING_SPEED_KMH", DEFAULT_WALKING_SPEED_KMH)?;
        if walking_speed_kmh <= 0.0 {
            return Err(ConfigError::Invalid(
                "WALKING_SPEED_KMH",
                walking_speed_kmh.to_string(),
            ));
        }

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            data_store: parse_or("DATA_STORE", DataStoreKind::Memory)?,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            seed_routes_path: env::var("SEED_ROUTES_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty()),
            seed_pois_path: env::var("SEED_POIS_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty()),
            default_origin,
            walking_speed_kmh,
            recommendation_limit: parse_or("RECOMMENDATION_LIMIT", 4)?,
            nearby_radius_km: parse_or("NEARBY_RADIUS_KM", 10.0)?,
            nearby_limit: parse_or("NEARBY_LIMIT", 6)?,
            location_high_accuracy: parse_or("LOCATION_HIGH_ACCURACY", true)?,
            location_timeout_ms: parse_or("LOCATION_TIMEOUT_MS", 5000)?,
            persist_track_points: parse_or("PERSIST_TRACK_POINTS", false)?,
        })
    }

    /// Watch options handed to the location provider.
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            high_accuracy: self.location_high_accuracy,
            timeout_ms: self.location_timeout_ms,
            maximum_age_ms: 0,
        }
    }
}

/// Read `name`, falling back to `default` when unset.
fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
