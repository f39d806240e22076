// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live walk tracking.
//!
//! Each user has at most one session, moving through
//! `Idle -> Active -> Stopped`. A user's `start` and `stop` calls are
//! serialized by a lifecycle lock; the session itself sits behind a second
//! lock that every position sample takes, so samples never interleave with
//! each other or with a transition.
//!
//! While a session is active a background task drains the position
//! channel handed to the [`LocationProvider`] and feeds each sample to
//! [`TrackingService::on_position`]. `stop` releases the subscription and
//! waits for that task to empty the channel before finalizing, so every
//! sample the provider accepted ends up in the session.

use crate::db::{collections, DataStore, Filter, StoreError};
use crate::models::{PointOutcome, TrackPoint, TrackingSession};
use crate::services::location::{
    LocationProvider, PositionEvent, StepCounter, SubscriptionHandle, WatchOptions,
};
use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// How long `stop` waits for queued samples to be folded in.
const STREAM_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error("Failed to create tracking session: {0}")]
    SessionCreateFailed(StoreError),

    #[error("A tracking session is already active")]
    AlreadyActive,

    #[error("No active tracking session")]
    NoActiveSession,

    #[error("Tracking session is still running")]
    SessionStillActive,

    #[error("Location is not available on this device")]
    LocationUnsupported,

    #[error("Tracking data unavailable: {0}")]
    DataUnavailable(#[from] StoreError),
}

/// Subscription plus the task draining it.
struct PositionStream {
    subscription: SubscriptionHandle,
    consumer: JoinHandle<()>,
}

/// Per-user session lifecycle.
#[derive(Default)]
enum SessionState {
    #[default]
    Idle,
    Active {
        session: TrackingSession,
        /// Taken by `stop` while it drains the channel.
        stream: Option<PositionStream>,
        steps_baseline: Option<u64>,
    },
    /// Stopped, but the final record never reached the store.
    Stopped(TrackingSession),
}

#[derive(Default)]
struct Slot {
    lifecycle: Mutex<()>,
    state: Mutex<SessionState>,
}

/// Result of a successful `stop`.
#[derive(Debug, Clone)]
pub struct StoppedSession {
    pub session: TrackingSession,
    /// Whether the final record reached the data store.
    pub persisted: bool,
}

/// Per-sample record in `track_points`.
#[derive(Serialize)]
struct StoredTrackPoint<'a> {
    session_id: &'a str,
    user_id: &'a str,
    #[serde(flatten)]
    point: &'a TrackPoint,
}

type SessionSlots = Arc<DashMap<String, Arc<Slot>>>;

#[derive(Clone)]
pub struct TrackingService {
    store: DataStore,
    provider: Arc<dyn LocationProvider>,
    steps: Arc<dyn StepCounter>,
    options: WatchOptions,
    persist_points: bool,
    slots: SessionSlots,
}

impl TrackingService {
    pub fn new(
        store: DataStore,
        provider: Arc<dyn LocationProvider>,
        steps: Arc<dyn StepCounter>,
        options: WatchOptions,
        persist_points: bool,
    ) -> Self {
        Self {
            store,
            provider,
            steps,
            options,
            persist_points,
            slots: Arc::new(DashMap::new()),
        }
    }

    fn slot(&self, user_id: &str) -> Arc<Slot> {
        self.slots
            .entry(user_id.to_string())
            .or_default()
            .clone()
    }

    fn existing_slot(&self, user_id: &str) -> Option<Arc<Slot>> {
        self.slots.get(user_id).map(|slot| slot.value().clone())
    }

    /// Forget an idle user nobody else is holding on to.
    fn release_if_idle(&self, user_id: &str) {
        self.slots.remove_if(user_id, |_, slot| {
            Arc::strong_count(slot) == 1
                && slot
                    .state
                    .try_lock()
                    .is_ok_and(|state| matches!(*state, SessionState::Idle))
        });
    }

    // ─── Lifecycle ───────────────────────────────────────────────

    /// Start a session for `user_id`, optionally following a catalog route.
    ///
    /// Subscribes to the user's position stream and writes the initial
    /// session record. If that write fails the subscription is released and
    /// the user stays idle.
    pub async fn start(
        &self,
        user_id: &str,
        route_id: Option<String>,
        route_name: Option<String>,
    ) -> Result<TrackingSession, TrackingError> {
        let slot = self.slot(user_id);
        let result = self.start_in(&slot, user_id, route_id, route_name).await;
        drop(slot);
        self.release_if_idle(user_id);
        result
    }

    async fn start_in(
        &self,
        slot: &Slot,
        user_id: &str,
        route_id: Option<String>,
        route_name: Option<String>,
    ) -> Result<TrackingSession, TrackingError> {
        let _lifecycle = slot.lifecycle.lock().await;
        let mut state = slot.state.lock().await;

        if matches!(*state, SessionState::Active { .. }) {
            return Err(TrackingError::AlreadyActive);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self
            .provider
            .subscribe(user_id, &self.options, tx)
            .map_err(|e| {
                tracing::warn!(user_id, error = %e, "Cannot start tracking");
                TrackingError::LocationUnsupported
            })?;

        let steps_baseline = self.steps.read_steps(user_id).ok();

        let draft = TrackingSession::begin(
            String::new(),
            user_id.to_string(),
            route_id,
            route_name,
            Utc::now(),
        );
        let session = match self
            .store
            .insert_as(collections::TRACKING_SESSIONS, &draft)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                self.provider.unsubscribe(subscription);
                tracing::error!(user_id, error = %e, "Failed to create tracking session");
                return Err(TrackingError::SessionCreateFailed(e));
            }
        };

        // Samples block on `state` until the session below is in place.
        let consumer = tokio::spawn(self.clone().consume_positions(user_id.to_string(), rx));

        tracing::info!(
            user_id,
            session_id = %session.id,
            route_id = session.route_id.as_deref(),
            "Tracking started"
        );

        let snapshot = session.clone();
        *state = SessionState::Active {
            session,
            stream: Some(PositionStream {
                subscription,
                consumer,
            }),
            steps_baseline,
        };
        Ok(snapshot)
    }

    /// Fold a position sample into the user's active session.
    ///
    /// Returns `false` (and does nothing) if no session is active.
    pub async fn on_position(&self, user_id: &str, point: TrackPoint) -> bool {
        let Some(slot) = self.existing_slot(user_id) else {
            tracing::debug!(user_id, "Ignoring position sample, no session");
            return false;
        };

        let record = {
            let mut state = slot.state.lock().await;
            let SessionState::Active { session, .. } = &mut *state else {
                tracing::debug!(user_id, "Ignoring position sample, no active session");
                return false;
            };

            if session.apply_point(point) == PointOutcome::OutOfOrder {
                tracing::debug!(
                    user_id,
                    session_id = %session.id,
                    timestamp = point.timestamp_millis,
                    "Out-of-order sample kept but not counted"
                );
            }

            if self.persist_points {
                Self::track_point_record(&session.id, user_id, &point)
            } else {
                None
            }
        };

        // Written outside the session lock so a slow store only delays this sample.
        if let Some(record) = record {
            if let Err(e) = self.store.insert(collections::TRACK_POINTS, record).await {
                tracing::warn!(user_id, error = %e, "Failed to persist track point");
            }
        }

        true
    }

    fn track_point_record(session_id: &str, user_id: &str, point: &TrackPoint) -> Option<Value> {
        let record = StoredTrackPoint {
            session_id,
            user_id,
            point,
        };
        serde_json::to_value(&record)
            .map_err(|e| tracing::warn!(user_id, error = %e, "Failed to encode track point"))
            .ok()
    }

    /// Stop the user's active session.
    ///
    /// The position subscription is torn down first and samples already
    /// queued are folded in. The final record is then written best-effort:
    /// a failed write is logged and reported through
    /// [`StoppedSession::persisted`], and the session is kept in memory
    /// (see [`last_stopped`](Self::last_stopped)). The session is stopped
    /// either way.
    pub async fn stop(&self, user_id: &str) -> Result<StoppedSession, TrackingError> {
        let Some(slot) = self.existing_slot(user_id) else {
            return Err(TrackingError::NoActiveSession);
        };
        let result = self.stop_in(&slot, user_id).await;
        drop(slot);
        self.release_if_idle(user_id);
        result
    }

    async fn stop_in(&self, slot: &Slot, user_id: &str) -> Result<StoppedSession, TrackingError> {
        let _lifecycle = slot.lifecycle.lock().await;

        let stream = match &mut *slot.state.lock().await {
            SessionState::Active { stream, .. } => stream.take(),
            SessionState::Idle | SessionState::Stopped(_) => {
                return Err(TrackingError::NoActiveSession)
            }
        };

        if let Some(PositionStream {
            subscription,
            mut consumer,
        }) = stream
        {
            self.provider.unsubscribe(subscription);
            // The sender is gone; the consumer exits once the queue is empty.
            match tokio::time::timeout(STREAM_DRAIN_TIMEOUT, &mut consumer).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(user_id, error = %e, "Position consumer failed"),
                Err(_) => {
                    tracing::warn!(user_id, "Position stream did not close, dropping queued samples");
                    consumer.abort();
                }
            }
        }

        let mut state = slot.state.lock().await;
        let (mut session, steps_baseline) = match std::mem::take(&mut *state) {
            SessionState::Active {
                session,
                steps_baseline,
                ..
            } => (session, steps_baseline),
            other => {
                *state = other;
                return Err(TrackingError::NoActiveSession);
            }
        };

        let steps = self
            .steps
            .read_steps(user_id)
            .ok()
            .map(|end| end.saturating_sub(steps_baseline.unwrap_or(0)));
        session.finish(Utc::now(), steps);
        *state = SessionState::Stopped(session.clone());
        drop(state);

        let persisted = match self.persist_final(&session).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    user_id,
                    session_id = %session.id,
                    error = %e,
                    "Failed to persist stopped session"
                );
                false
            }
        };
        if persisted {
            *slot.state.lock().await = SessionState::Idle;
        }

        tracing::info!(
            user_id,
            session_id = %session.id,
            distance_meters = session.stats.distance_meters,
            duration_seconds = session.stats.duration_seconds,
            points = session.points.len(),
            persisted,
            "Tracking stopped"
        );

        Ok(StoppedSession { session, persisted })
    }

    async fn persist_final(&self, session: &TrackingSession) -> Result<(), StoreError> {
        let patch = serde_json::to_value(session).map_err(|e| StoreError::Serialization {
            collection: collections::TRACKING_SESSIONS.to_string(),
            message: e.to_string(),
        })?;
        self.store
            .update(collections::TRACKING_SESSIONS, &session.id, patch)
            .await?;
        Ok(())
    }

    /// Drain the position channel until the provider drops the sender.
    async fn consume_positions(self, user_id: String, mut rx: mpsc::UnboundedReceiver<PositionEvent>) {
        let timeout = Duration::from_millis(self.options.timeout_ms);

        loop {
            let event = if timeout.is_zero() {
                rx.recv().await
            } else {
                match tokio::time::timeout(timeout, rx.recv()).await {
                    Ok(event) => event,
                    Err(_) => {
                        tracing::debug!(
                            user_id = %user_id,
                            timeout_ms = self.options.timeout_ms,
                            "No position sample within timeout"
                        );
                        continue;
                    }
                }
            };

            match event {
                Some(PositionEvent::Sample(point)) => {
                    self.on_position(&user_id, point).await;
                }
                Some(PositionEvent::Error(message)) => {
                    tracing::warn!(user_id = %user_id, error = %message, "Position source error");
                }
                None => break,
            }
        }

        tracing::debug!(user_id = %user_id, "Position stream closed");
    }

    // ─── Queries ─────────────────────────────────────────────────

    /// Snapshot of the user's live session.
    pub async fn current(&self, user_id: &str) -> Option<TrackingSession> {
        let slot = self.existing_slot(user_id)?;
        let state = slot.state.lock().await;
        match &*state {
            SessionState::Active { session, .. } => Some(session.clone()),
            SessionState::Idle | SessionState::Stopped(_) => None,
        }
    }

    /// The last stopped session whose final write failed, if any.
    pub async fn last_stopped(&self, user_id: &str) -> Option<TrackingSession> {
        let slot = self.existing_slot(user_id)?;
        let state = slot.state.lock().await;
        match &*state {
            SessionState::Stopped(session) => Some(session.clone()),
            SessionState::Idle | SessionState::Active { .. } => None,
        }
    }

    /// The user's recorded sessions, newest first.
    pub async fn list_sessions(&self, user_id: &str) -> Result<Vec<TrackingSession>, TrackingError> {
        let mut sessions: Vec<TrackingSession> = self
            .store
            .get_as(
                collections::TRACKING_SESSIONS,
                &Filter::all().eq("user_id", user_id),
            )
            .await?;
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(sessions)
    }

    /// One of the user's sessions. Sessions owned by someone else are `None`.
    pub async fn get_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<TrackingSession>, TrackingError> {
        let session: Option<TrackingSession> = self
            .store
            .find_one(
                collections::TRACKING_SESSIONS,
                &Filter::all().eq("id", session_id),
            )
            .await?;
        Ok(session.filter(|s| s.user_id == user_id))
    }

    /// Set the note on one of the user's finished walks.
    ///
    /// `Ok(None)` if the session does not exist or belongs to someone else.
    pub async fn update_description(
        &self,
        user_id: &str,
        session_id: &str,
        description: &str,
    ) -> Result<Option<TrackingSession>, TrackingError> {
        let Some(session) = self.get_session(user_id, session_id).await? else {
            return Ok(None);
        };
        if session.is_active {
            return Err(TrackingError::SessionStillActive);
        }

        let updated = self
            .store
            .update(
                collections::TRACKING_SESSIONS,
                &session.id,
                json!({ "description": description }),
            )
            .await?;
        let updated = serde_json::from_value(updated).map_err(|e| StoreError::Serialization {
            collection: collections::TRACKING_SESSIONS.to_string(),
            message: e.to_string(),
        })?;
        tracing::info!(user_id, session_id, "Walk description updated");
        Ok(Some(updated))
    }
}
