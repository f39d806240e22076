// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recorded walk: raw GPS samples plus running statistics.
//!
//! Stored at `tracking_sessions/{id}`. The record is created when tracking
//! starts and rewritten with the final stats and point list on stop.

use crate::geo_math::{self, Coordinate};
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Utc};
use geo::LineString;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One position sample from the device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Altitude in meters, if the device reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
    /// Device-reported ground speed in m/s
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Horizontal accuracy in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub timestamp_millis: i64,
}

impl TrackPoint {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Statistics accumulated while a session is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RunningStats {
    pub distance_meters: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub duration_seconds: i64,
    /// Latest speed in m/s
    pub current_speed: f64,
    pub elevation_gain: f64,
    pub elevation_loss: f64,
}

/// What `TrackingSession::apply_point` did with a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointOutcome {
    /// First sample of the session; nothing to accumulate yet.
    First,
    /// Accumulated into the stats, with the leg length in meters.
    Accumulated { leg_meters: f64 },
    /// Timestamp earlier than the last accepted sample. Kept but not counted.
    OutOfOrder,
}

/// A walk recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TrackingSession {
    /// Document ID
    pub id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_name: Option<String>,
    /// Free-text note the walker adds after the walk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub points: Vec<TrackPoint>,
    #[serde(default)]
    pub stats: RunningStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub steps: Option<u64>,
    /// Google encoded polyline (precision 5) of the accepted samples, set on stop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoded_polyline: Option<String>,
    pub is_active: bool,

    /// Index into `points` of the last in-order sample.
    #[serde(skip)]
    #[cfg_attr(feature = "binding-generation", ts(skip))]
    last_accepted: Option<usize>,
    /// Altitude of the last in-order sample that carried one.
    #[serde(skip)]
    #[cfg_attr(feature = "binding-generation", ts(skip))]
    last_elevation: Option<f64>,
}

impl TrackingSession {
    /// Create an active session with no samples.
    pub fn begin(
        id: String,
        user_id: String,
        route_id: Option<String>,
        route_name: Option<String>,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            route_id,
            route_name,
            description: None,
            start_time,
            end_time: None,
            points: Vec::new(),
            stats: RunningStats::default(),
            steps: None,
            encoded_polyline: None,
            is_active: true,
            last_accepted: None,
            last_elevation: None,
        }
    }

    /// Append a sample and fold it into the running stats.
    pub fn apply_point(&mut self, point: TrackPoint) -> PointOutcome {
        self.points.push(point);
        let index = self.points.len() - 1;

        let Some(prev_index) = self.last_accepted else {
            self.last_accepted = Some(index);
            self.last_elevation = point.elevation;
            self.stats.current_speed = point.speed.unwrap_or(0.0);
            return PointOutcome::First;
        };

        let prev = self.points[prev_index];
        if point.timestamp_millis < prev.timestamp_millis {
            return PointOutcome::OutOfOrder;
        }

        let leg_meters = geo_math::distance_meters(prev.coordinate(), point.coordinate());
        self.stats.distance_meters += leg_meters;

        if let Some(elevation) = point.elevation {
            if let Some(last) = self.last_elevation {
                let delta = elevation - last;
                if delta > 0.0 {
                    self.stats.elevation_gain += delta;
                } else {
                    self.stats.elevation_loss += -delta;
                }
            }
            self.last_elevation = Some(elevation);
        }

        let elapsed_seconds = (point.timestamp_millis - prev.timestamp_millis) as f64 / 1000.0;
        if let Some(speed) = point.speed {
            self.stats.current_speed = speed;
        } else if elapsed_seconds > 0.0 {
            self.stats.current_speed = leg_meters / elapsed_seconds;
        }

        self.last_accepted = Some(index);
        PointOutcome::Accumulated { leg_meters }
    }

    /// Mark the session ended at `end_time` and compute its final duration.
    pub fn finish(&mut self, end_time: DateTime<Utc>, steps: Option<u64>) {
        self.end_time = Some(end_time);
        self.stats.duration_seconds = (end_time - self.start_time).num_seconds().max(0);
        self.steps = steps;
        self.is_active = false;
        self.encoded_polyline = self.encode_polyline();
    }

    /// Samples that were counted, in arrival order (out-of-order glitches removed).
    pub fn accepted_points(&self) -> Vec<TrackPoint> {
        let mut last_ts = i64::MIN;
        self.points
            .iter()
            .filter(|p| {
                if p.timestamp_millis >= last_ts {
                    last_ts = p.timestamp_millis;
                    true
                } else {
                    false
                }
            })
            .copied()
            .collect()
    }

    /// Path of the accepted samples as a line string (x = longitude).
    pub fn line_string(&self) -> LineString<f64> {
        self.accepted_points()
            .iter()
            .map(|p| geo::Coord::from(p.coordinate()))
            .collect()
    }

    fn encode_polyline(&self) -> Option<String> {
        let line = self.line_string();
        if line.0.is_empty() {
            return None;
        }
        match polyline::encode_coordinates(line.coords().copied(), 5) {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "Failed to encode track polyline");
                None
            }
        }
    }

    /// Export as a GeoJSON feature with a LineString geometry.
    pub fn to_geojson(&self) -> geojson::Feature {
        let line = self.line_string();
        let geometry = geojson::Geometry::new(geojson::Value::from(&line));

        let mut properties = geojson::JsonObject::new();
        properties.insert("id".to_string(), self.id.clone().into());
        properties.insert("start_time".to_string(), format_utc_rfc3339(self.start_time).into());
        if let Some(end) = self.end_time {
            properties.insert("end_time".to_string(), format_utc_rfc3339(end).into());
        }
        properties.insert("distance_meters".to_string(), self.stats.distance_meters.into());
        properties.insert("duration_seconds".to_string(), self.stats.duration_seconds.into());
        properties.insert("elevation_gain".to_string(), self.stats.elevation_gain.into());
        properties.insert("elevation_loss".to_string(), self.stats.elevation_loss.into());
        if let Some(route_name) = &self.route_name {
            properties.insert("route_name".to_string(), route_name.clone().into());
        }

        geojson::Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}
