// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user fasting session controller.
//!
//! Owns one [`FastingTimer`] per user and mirrors lifecycle changes to the
//! user's `fasting_sessions` sub-collection. Writes are best-effort: a failed
//! write is logged and the in-memory timer keeps running.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::fasting::FastingType;
use crate::models::{FastingPreferences, FastingSession, NotificationKind};
use crate::services::notifications::NotificationDispatcher;
use crate::services::timer::{FastingTimer, TimerError, TimerEvent, TimerState};
use crate::time_utils::{format_hms, SharedClock};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A user's current (or most recently finished) fast.
#[derive(Debug, Clone)]
struct ActiveFast {
    timer: FastingTimer,
    session: FastingSession,
}

/// Timer snapshot returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TimerStatus {
    pub state: TimerState,
    pub session_id: Option<String>,
    pub method: Option<String>,
    pub custom_window: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub started_at: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub ended_at: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub target_secs: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub elapsed_secs: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub remaining_secs: u64,
    /// Elapsed time as `HH:MM:SS`
    pub elapsed: String,
}

impl TimerStatus {
    pub fn idle() -> Self {
        Self {
            state: TimerState::Idle,
            session_id: None,
            method: None,
            custom_window: None,
            started_at: None,
            ended_at: None,
            target_secs: 0,
            elapsed_secs: 0,
            remaining_secs: 0,
            elapsed: format_hms(0),
        }
    }

    fn from_fast(fast: &ActiveFast, now: DateTime<Utc>) -> Self {
        let elapsed_secs = fast.timer.elapsed_secs(now);
        Self {
            state: fast.timer.state(),
            session_id: Some(fast.session.id.clone()),
            method: Some(fast.session.method.clone()),
            custom_window: fast.session.custom_window.clone(),
            started_at: fast.timer.started_at(),
            ended_at: fast.timer.finished_at(),
            target_secs: fast.timer.target_secs(),
            elapsed_secs,
            remaining_secs: fast.timer.remaining_secs(now),
            elapsed: format_hms(elapsed_secs),
        }
    }
}

/// Message sent when a fast reaches its target.
pub fn completion_message(method: &str, duration_secs: u64) -> String {
    format!(
        "Your {} fasting session has ended after {}.",
        method,
        format_hms(duration_secs)
    )
}

fn hourly_message(method: &str, hours: u64) -> String {
    let unit = if hours == 1 { "hour" } else { "hours" };
    format!("{} {} into your {} fast.", hours, unit, method)
}

pub struct SessionController {
    db: FirestoreDb,
    notifications: NotificationDispatcher,
    clock: SharedClock,
    active: DashMap<String, ActiveFast>,
    /// Users whose unfinished sessions have already been looked up.
    rehydrated: DashSet<String>,
}

impl SessionController {
    pub fn new(db: FirestoreDb, notifications: NotificationDispatcher, clock: SharedClock) -> Self {
        Self {
            db,
            notifications,
            clock,
            active: DashMap::new(),
            rehydrated: DashSet::new(),
        }
    }

    /// Start a fast. Without an explicit method the user's preferences apply.
    pub async fn start(
        &self,
        user_id: &str,
        method: Option<String>,
        custom_window: Option<String>,
    ) -> Result<TimerStatus, AppError> {
        self.rehydrate(user_id).await;

        let (method, custom_window) = match method {
            Some(method) => (method, custom_window),
            None => {
                let prefs = self.preferences_or_default(user_id).await;
                (prefs.preferred_method, custom_window.or(prefs.custom_window))
            }
        };

        let fasting_type = FastingType::find(&method);
        let custom_window = custom_window.filter(|_| fasting_type.is_custom());
        let target_secs = fasting_type.target_secs(custom_window.as_deref());

        let now = self.clock.now();
        let mut timer = FastingTimer::new(target_secs);
        timer.start(now)?;
        let session = FastingSession::started(now, fasting_type.name, custom_window, target_secs);

        let status = match self.active.entry(user_id.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get().timer.state().is_running() {
                    return Err(TimerError::AlreadyActive.into());
                }
                entry.insert(ActiveFast { timer, session: session.clone() });
                TimerStatus::from_fast(entry.get(), now)
            }
            Entry::Vacant(entry) => {
                let fast = entry.insert(ActiveFast { timer, session: session.clone() });
                TimerStatus::from_fast(&fast, now)
            }
        };

        tracing::info!(
            user_id,
            session_id = %session.id,
            method = %session.method,
            target_secs,
            "Fasting session started"
        );
        self.persist(user_id, &session).await;

        Ok(status)
    }

    pub async fn pause(&self, user_id: &str) -> Result<TimerStatus, AppError> {
        self.rehydrate(user_id).await;
        let now = self.clock.now();

        let mut fast = self
            .active
            .get_mut(user_id)
            .ok_or(TimerError::NotActive)?;
        fast.timer.pause(now)?;

        tracing::debug!(user_id, "Fasting session paused");
        Ok(TimerStatus::from_fast(&fast, now))
    }

    pub async fn resume(&self, user_id: &str) -> Result<TimerStatus, AppError> {
        self.rehydrate(user_id).await;
        let now = self.clock.now();

        let mut fast = self
            .active
            .get_mut(user_id)
            .ok_or(TimerError::NotPaused)?;
        fast.timer.resume(now)?;

        tracing::debug!(user_id, "Fasting session resumed");
        Ok(TimerStatus::from_fast(&fast, now))
    }

    /// Stop the running fast and record its final duration.
    pub async fn stop(&self, user_id: &str) -> Result<TimerStatus, AppError> {
        self.rehydrate(user_id).await;
        let now = self.clock.now();

        let (status, session) = {
            let mut fast = self
                .active
                .get_mut(user_id)
                .ok_or(TimerError::NotActive)?;
            Self::stop_fast(&mut fast, now)?;
            (TimerStatus::from_fast(&fast, now), fast.session.clone())
        };

        tracing::info!(
            user_id,
            session_id = %session.id,
            duration_secs = session.duration_secs.unwrap_or(0),
            "Fasting session stopped"
        );
        self.persist(user_id, &session).await;

        Ok(status)
    }

    /// Stop any running fast and return the timer to idle.
    pub async fn reset(&self, user_id: &str) -> Result<TimerStatus, AppError> {
        self.rehydrate(user_id).await;
        let now = self.clock.now();

        if let Some((_, mut fast)) = self.active.remove(user_id) {
            if fast.timer.state().is_running() {
                Self::stop_fast(&mut fast, now)?;
                self.persist(user_id, &fast.session).await;
            }
            tracing::info!(user_id, session_id = %fast.session.id, "Fasting timer reset");
        }

        Ok(TimerStatus::idle())
    }

    pub async fn status(&self, user_id: &str) -> TimerStatus {
        self.rehydrate(user_id).await;
        let now = self.clock.now();

        self.active
            .get(user_id)
            .map(|fast| TimerStatus::from_fast(&fast, now))
            .unwrap_or_else(TimerStatus::idle)
    }

    /// Advance every running timer. Driven once per second by a background task.
    ///
    /// Returns the number of sessions that completed on this tick.
    pub async fn tick_all(&self) -> usize {
        let now = self.clock.now();

        // Collect first so no map guard is held across an await.
        let mut fired: Vec<(String, FastingSession, Vec<TimerEvent>)> = Vec::new();
        for mut entry in self.active.iter_mut() {
            let user_id = entry.key().clone();
            let fast = entry.value_mut();
            let events = fast.timer.tick(now);
            if events.is_empty() {
                continue;
            }
            if events.contains(&TimerEvent::Completed) {
                let elapsed = fast.timer.elapsed_secs(now);
                let ended = fast.timer.finished_at().unwrap_or(now);
                fast.session.finish(ended, elapsed, true);
            }
            fired.push((user_id, fast.session.clone(), events));
        }

        let mut completed = 0;
        for (user_id, session, events) in fired {
            for event in events {
                match event {
                    TimerEvent::Hourly { hours } => {
                        self.notifications
                            .notify(
                                &user_id,
                                NotificationKind::Reminder,
                                hourly_message(&session.method, hours),
                                now,
                            )
                            .await;
                    }
                    TimerEvent::Completed => {
                        completed += 1;
                        let duration = session.duration_secs.unwrap_or(0);
                        tracing::info!(
                            user_id = %user_id,
                            session_id = %session.id,
                            duration_secs = duration,
                            "Fasting session completed"
                        );
                        self.persist(&user_id, &session).await;
                        self.notifications
                            .notify(
                                &user_id,
                                NotificationKind::Alert,
                                completion_message(&session.method, duration),
                                now,
                            )
                            .await;
                    }
                }
            }
        }

        completed
    }

    /// Finished session records, newest first.
    pub async fn history(&self, user_id: &str) -> Result<Vec<FastingSession>, AppError> {
        self.db.list_sessions(user_id).await
    }

    fn stop_fast(fast: &mut ActiveFast, now: DateTime<Utc>) -> Result<(), TimerError> {
        let elapsed = fast.timer.stop(now)?;
        let ended = fast.timer.finished_at().unwrap_or(now);
        let completed = elapsed >= fast.timer.target_secs();
        fast.session.finish(ended, elapsed, completed);
        Ok(())
    }

    async fn preferences_or_default(&self, user_id: &str) -> FastingPreferences {
        match self.db.get_preferences(user_id).await {
            Ok(prefs) => prefs.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to load preferences, using defaults");
                FastingPreferences::default()
            }
        }
    }

    async fn persist(&self, user_id: &str, session: &FastingSession) {
        if let Err(e) = self.db.set_session(user_id, session).await {
            tracing::warn!(
                user_id,
                session_id = %session.id,
                error = %e,
                "Failed to persist fasting session"
            );
        }
    }

    /// Restore an unfinished session after a restart, once per user.
    async fn rehydrate(&self, user_id: &str) {
        if self.active.contains_key(user_id) || self.rehydrated.contains(user_id) {
            return;
        }

        match self.db.find_unfinished_session(user_id).await {
            Ok(found) => {
                self.rehydrated.insert(user_id.to_string());
                if let Some(session) = found {
                    let timer = FastingTimer::restore(
                        session.start_time,
                        session.target_secs,
                        self.clock.now(),
                    );
                    tracing::info!(
                        user_id,
                        session_id = %session.id,
                        "Rehydrated unfinished fasting session"
                    );
                    self.active
                        .entry(user_id.to_string())
                        .or_insert(ActiveFast { timer, session });
                }
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to look up unfinished session");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::time_utils::ManualClock;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn controller() -> (SessionController, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 20, 0, 0).unwrap());
        let db = FirestoreDb::new_mock();
        let dispatcher = NotificationDispatcher::new(db.clone(), &Config::test_default());
        let controller = SessionController::new(db, dispatcher, Arc::new(clock.clone()));
        (controller, clock)
    }

    #[test]
    fn test_completion_message() {
        assert_eq!(
            completion_message("Ramadan", 14 * 3600 + 61),
            "Your Ramadan fasting session has ended after 14:01:01."
        );
    }

    #[tokio::test]
    async fn test_offline_start_keeps_local_state() {
        let (controller, clock) = controller();

        let status = controller
            .start("user-1", Some("Ramadan".to_string()), None)
            .await
            .unwrap();
        assert_eq!(status.state, TimerState::Active);
        assert_eq!(status.target_secs, 14 * 3600);

        clock.advance_secs(90);
        let status = controller.status("user-1").await;
        assert_eq!(status.elapsed_secs, 90);
        assert_eq!(status.elapsed, "00:01:30");
    }

    #[tokio::test]
    async fn test_second_start_conflicts() {
        let (controller, _clock) = controller();
        controller.start("user-1", None, None).await.unwrap();

        let err = controller.start("user-1", None, None).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_unknown_method_falls_back_to_first_preset() {
        let (controller, _clock) = controller();

        let status = controller
            .start("user-1", Some("Juice cleanse".to_string()), Some("02:00".to_string()))
            .await
            .unwrap();

        assert_eq!(status.method.as_deref(), Some("16:8 Intermittent Fasting"));
        assert_eq!(status.custom_window, None);
    }

    #[tokio::test]
    async fn test_custom_window_sets_target() {
        let (controller, _clock) = controller();

        let status = controller
            .start("user-1", Some("Custom".to_string()), Some("01:30".to_string()))
            .await
            .unwrap();

        assert_eq!(status.target_secs, 5400);
    }

    #[tokio::test]
    async fn test_tick_completes_once() {
        let (controller, clock) = controller();
        controller
            .start("user-1", Some("Custom".to_string()), Some("00:01".to_string()))
            .await
            .unwrap();

        clock.advance_secs(30);
        assert_eq!(controller.tick_all().await, 0);

        clock.advance_secs(30);
        assert_eq!(controller.tick_all().await, 1);

        clock.advance_secs(1);
        assert_eq!(controller.tick_all().await, 0);

        let status = controller.status("user-1").await;
        assert_eq!(status.state, TimerState::Completed);
        assert_eq!(status.elapsed_secs, 60);
    }

    #[tokio::test]
    async fn test_reset_returns_to_idle_and_allows_restart() {
        let (controller, clock) = controller();
        controller.start("user-1", None, None).await.unwrap();
        clock.advance_secs(10);

        let status = controller.reset("user-1").await.unwrap();
        assert_eq!(status, TimerStatus::idle());
        assert_eq!(controller.status("user-1").await.state, TimerState::Idle);

        controller.start("user-1", None, None).await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_without_session_is_conflict() {
        let (controller, _clock) = controller();

        let err = controller.stop("user-1").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
