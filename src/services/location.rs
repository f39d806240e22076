// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Position sources for live tracking.
//!
//! A [`LocationProvider`] turns a device's position stream into
//! [`PositionEvent`]s pushed onto a channel. The server build uses
//! [`DeviceFeed`], where the client app uploads its own GPS samples over
//! HTTP and they are forwarded to whoever is subscribed for that device.

use crate::models::TrackPoint;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Watch options forwarded to the position source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    /// How long to wait for a sample before reporting a timeout.
    pub timeout_ms: u64,
    /// Accept cached positions up to this age. 0 means always fresh.
    pub maximum_age_ms: u64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 5000,
            maximum_age_ms: 0,
        }
    }
}

/// Something the position source delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Sample(TrackPoint),
    /// Non-fatal source error (permission revoked, signal lost, ...).
    Error(String),
}

pub type PositionSink = mpsc::UnboundedSender<PositionEvent>;

/// Handle returned by [`LocationProvider::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location is not supported on this device")]
    Unsupported,
}

/// Source of position samples.
pub trait LocationProvider: Send + Sync {
    /// Start delivering positions for `device_id` into `sink`.
    fn subscribe(
        &self,
        device_id: &str,
        options: &WatchOptions,
        sink: PositionSink,
    ) -> Result<SubscriptionHandle, LocationError>;

    /// Stop delivering. Unknown handles are ignored.
    fn unsubscribe(&self, handle: SubscriptionHandle);
}

#[derive(Debug, thiserror::Error)]
#[error("Step count unavailable")]
pub struct StepsUnavailable;

/// Pedometer reading for a device.
pub trait StepCounter: Send + Sync {
    fn read_steps(&self, device_id: &str) -> Result<u64, StepsUnavailable>;
}

/// Provider for hosts without any position source.
pub struct UnsupportedLocation;

impl LocationProvider for UnsupportedLocation {
    fn subscribe(
        &self,
        _device_id: &str,
        _options: &WatchOptions,
        _sink: PositionSink,
    ) -> Result<SubscriptionHandle, LocationError> {
        Err(LocationError::Unsupported)
    }

    fn unsubscribe(&self, _handle: SubscriptionHandle) {}
}

/// Step counter for hosts without a pedometer.
pub struct NoStepCounter;

impl StepCounter for NoStepCounter {
    fn read_steps(&self, _device_id: &str) -> Result<u64, StepsUnavailable> {
        Err(StepsUnavailable)
    }
}

/// Positions and step counts uploaded by client devices.
///
/// One subscription per device; subscribing again replaces the old sink.
#[derive(Default)]
pub struct DeviceFeed {
    next_handle: AtomicU64,
    sinks: DashMap<u64, (String, PositionSink)>,
    by_device: DashMap<String, u64>,
    steps: DashMap<String, u64>,
}

impl DeviceFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward an event to the device's subscriber.
    ///
    /// Returns `false` when nobody is subscribed or the receiver is gone.
    pub fn publish(&self, device_id: &str, event: PositionEvent) -> bool {
        let Some(handle) = self.by_device.get(device_id).map(|h| *h) else {
            return false;
        };
        match self.sinks.get(&handle) {
            Some(entry) => entry.1.send(event).is_ok(),
            None => false,
        }
    }

    /// Record the device's latest pedometer total.
    pub fn report_steps(&self, device_id: &str, count: u64) {
        self.steps.insert(device_id.to_string(), count);
    }

    /// Whether the device currently has a subscriber.
    pub fn is_subscribed(&self, device_id: &str) -> bool {
        self.by_device.contains_key(device_id)
    }
}

impl LocationProvider for DeviceFeed {
    fn subscribe(
        &self,
        device_id: &str,
        options: &WatchOptions,
        sink: PositionSink,
    ) -> Result<SubscriptionHandle, LocationError> {
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed) + 1;

        if let Some(old) = self.by_device.insert(device_id.to_string(), handle) {
            self.sinks.remove(&old);
        }
        self.sinks.insert(handle, (device_id.to_string(), sink));
        // A new session starts counting from zero
        self.steps.remove(device_id);

        tracing::debug!(
            device_id,
            handle,
            high_accuracy = options.high_accuracy,
            "Position subscription opened"
        );
        Ok(SubscriptionHandle(handle))
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        if let Some((_, (device_id, _))) = self.sinks.remove(&handle.0) {
            self.by_device.remove_if(&device_id, |_, h| *h == handle.0);
            tracing::debug!(device_id = %device_id, handle = handle.0, "Position subscription closed");
        }
    }
}

impl StepCounter for DeviceFeed {
    fn read_steps(&self, device_id: &str) -> Result<u64, StepsUnavailable> {
        self.steps
            .get(device_id)
            .map(|s| *s)
            .ok_or(StepsUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: i64) -> TrackPoint {
        TrackPoint {
            latitude: 48.8566,
            longitude: 2.3522,
            elevation: None,
            speed: None,
            accuracy: None,
            timestamp_millis: ts,
        }
    }

    #[test]
    fn test_publish_without_subscriber() {
        let feed = DeviceFeed::new();
        assert!(!feed.publish("u1", PositionEvent::Sample(sample(0))));
    }

    #[test]
    fn test_subscribe_publish_unsubscribe() {
        let feed = DeviceFeed::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = feed.subscribe("u1", &WatchOptions::default(), tx).unwrap();

        assert!(feed.is_subscribed("u1"));
        assert!(feed.publish("u1", PositionEvent::Sample(sample(1))));
        assert_eq!(rx.try_recv().unwrap(), PositionEvent::Sample(sample(1)));

        feed.unsubscribe(handle);
        assert!(!feed.is_subscribed("u1"));
        assert!(!feed.publish("u1", PositionEvent::Sample(sample(2))));

        // Unknown handle is a no-op
        feed.unsubscribe(handle);
    }

    #[test]
    fn test_resubscribe_replaces_sink() {
        let feed = DeviceFeed::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let first = feed.subscribe("u1", &WatchOptions::default(), tx1).unwrap();
        let _second = feed.subscribe("u1", &WatchOptions::default(), tx2).unwrap();

        assert!(feed.publish("u1", PositionEvent::Error("lost".into())));
        assert!(rx1.try_recv().is_err());
        assert_eq!(rx2.try_recv().unwrap(), PositionEvent::Error("lost".into()));

        // Dropping the stale handle must not remove the live one
        feed.unsubscribe(first);
        assert!(feed.is_subscribed("u1"));
    }

    #[test]
    fn test_steps() {
        let feed = DeviceFeed::new();
        assert!(feed.read_steps("u1").is_err());
        feed.report_steps("u1", 1200);
        assert_eq!(feed.read_steps("u1").unwrap(), 1200);

        let (tx, _rx) = mpsc::unbounded_channel();
        feed.subscribe("u1", &WatchOptions::default(), tx).unwrap();
        assert!(feed.read_steps("u1").is_err());
    }

    #[test]
    fn test_unsupported_provider() {
        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(matches!(
            UnsupportedLocation.subscribe("u1", &WatchOptions::default(), tx),
            Err(LocationError::Unsupported)
        ));
        assert!(NoStepCounter.read_steps("u1").is_err());
    }
}
