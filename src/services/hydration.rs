// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Hydration reminders and water intake logging.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{FastingPreferences, HydrationLog, NotificationKind};
use crate::services::notifications::NotificationDispatcher;
use crate::time_utils::SharedClock;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;

/// Whether a reminder is due. Non-positive frequencies are always due;
/// frequencies too large to represent are never due.
pub fn is_due(now: DateTime<Utc>, last_fired: DateTime<Utc>, frequency_minutes: i64) -> bool {
    match Duration::try_minutes(frequency_minutes) {
        Some(frequency) => now - last_fired >= frequency,
        None => frequency_minutes < 0,
    }
}

pub fn reminder_message(current_ml: i64, goal_ml: i64) -> String {
    format!(
        "Time to drink some water! You've had {}ml out of your {}ml goal.",
        current_ml, goal_ml
    )
}

pub struct HydrationReminder {
    db: FirestoreDb,
    notifications: NotificationDispatcher,
    clock: SharedClock,
    last_fired: DashMap<String, DateTime<Utc>>,
}

impl HydrationReminder {
    pub fn new(db: FirestoreDb, notifications: NotificationDispatcher, clock: SharedClock) -> Self {
        Self {
            db,
            notifications,
            clock,
            last_fired: DashMap::new(),
        }
    }

    /// Decide whether to remind this user now, recording the firing time.
    ///
    /// The first observation of a user only starts the interval.
    pub fn observe(&self, user_id: &str, frequency_minutes: i64, now: DateTime<Utc>) -> bool {
        match self.last_fired.entry(user_id.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(now);
                false
            }
            Entry::Occupied(mut entry) => {
                if is_due(now, *entry.get(), frequency_minutes) {
                    entry.insert(now);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// One reminder pass over every user with reminders enabled.
    ///
    /// Returns the number of reminders sent.
    pub async fn poll(&self) -> Result<usize, AppError> {
        let users = self.db.list_hydration_enabled().await?;
        let now = self.clock.now();
        Ok(self.poll_users(&users, now).await)
    }

    pub async fn poll_users(&self, users: &[FastingPreferences], now: DateTime<Utc>) -> usize {
        let enabled: HashSet<&str> = users
            .iter()
            .filter(|p| p.hydration_reminders)
            .map(|p| p.user_id.as_str())
            .collect();
        // Users who turned reminders off start a fresh interval when they return.
        self.last_fired
            .retain(|user_id, _| enabled.contains(user_id.as_str()));

        let mut sent = 0;
        for prefs in users.iter().filter(|p| p.hydration_reminders) {
            if !self.observe(&prefs.user_id, prefs.reminder_frequency, now) {
                continue;
            }

            let current = match self.db.get_hydration(&prefs.user_id).await {
                Ok(log) => log.map(|l| l.current_intake_ml).unwrap_or(0),
                Err(e) => {
                    tracing::warn!(user_id = %prefs.user_id, error = %e, "Failed to read intake");
                    0
                }
            };

            self.notifications
                .notify(
                    &prefs.user_id,
                    NotificationKind::Hydration,
                    reminder_message(current, prefs.daily_water_goal_ml),
                    now,
                )
                .await;
            sent += 1;
        }

        if sent > 0 {
            tracing::debug!(sent, "Hydration reminders sent");
        }
        sent
    }

    pub async fn log(&self, user_id: &str) -> Result<HydrationLog, AppError> {
        Ok(self.db.get_hydration(user_id).await?.unwrap_or_default())
    }

    /// Add (or with a negative amount, correct) water intake.
    pub async fn log_intake(&self, user_id: &str, amount_ml: i64) -> Result<HydrationLog, AppError> {
        let mut log = self.log(user_id).await?;
        log.record(amount_ml, self.clock.now().timestamp_millis());
        self.db.set_hydration(user_id, &log).await?;

        tracing::debug!(user_id, amount_ml, total = log.current_intake_ml, "Water intake logged");
        Ok(log)
    }

    pub async fn reset_intake(&self, user_id: &str) -> Result<HydrationLog, AppError> {
        let log = HydrationLog::default();
        self.db.set_hydration(user_id, &log).await?;
        tracing::debug!(user_id, "Water intake reset");
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::time_utils::ManualClock;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn reminder() -> HydrationReminder {
        let db = FirestoreDb::new_mock();
        let dispatcher = NotificationDispatcher::new(db.clone(), &Config::test_default());
        HydrationReminder::new(db, dispatcher, Arc::new(ManualClock::new(t(0))))
    }

    fn prefs(user_id: &str, frequency: i64) -> FastingPreferences {
        FastingPreferences {
            user_id: user_id.to_string(),
            reminder_frequency: frequency,
            ..Default::default()
        }
    }

    #[test]
    fn test_is_due_boundary() {
        assert!(!is_due(t(59), t(0), 60));
        assert!(is_due(t(60), t(0), 60));
        assert!(is_due(t(0), t(0), 0));
        assert!(is_due(t(0), t(0), -5));
    }

    #[test]
    fn test_is_due_out_of_range_frequency() {
        assert!(!is_due(t(1_000_000), t(0), i64::MAX));
        assert!(is_due(t(0), t(0), i64::MIN));
    }

    #[tokio::test]
    async fn test_poll_survives_huge_frequency() {
        let reminder = reminder();
        let users = vec![prefs("user-1", i64::MAX), prefs("user-2", 30)];

        assert_eq!(reminder.poll_users(&users, t(0)).await, 0);
        assert_eq!(reminder.poll_users(&users, t(30)).await, 1);
        assert_eq!(reminder.poll_users(&users, t(60 * 24 * 365)).await, 1);
    }

    #[test]
    fn test_reminder_message() {
        assert_eq!(
            reminder_message(500, 2000),
            "Time to drink some water! You've had 500ml out of your 2000ml goal."
        );
    }

    #[test]
    fn test_first_observation_does_not_fire() {
        let reminder = reminder();

        assert!(!reminder.observe("user-1", 60, t(0)));
        assert!(!reminder.observe("user-1", 60, t(30)));
        assert!(reminder.observe("user-1", 60, t(60)));
        assert!(!reminder.observe("user-1", 60, t(61)));
        assert!(reminder.observe("user-1", 60, t(120)));
    }

    #[tokio::test]
    async fn test_poll_fires_at_most_once_per_interval() {
        let reminder = reminder();
        let users = vec![prefs("user-1", 60), prefs("user-2", 30)];

        assert_eq!(reminder.poll_users(&users, t(0)).await, 0);
        assert_eq!(reminder.poll_users(&users, t(30)).await, 1);
        assert_eq!(reminder.poll_users(&users, t(31)).await, 0);
        assert_eq!(reminder.poll_users(&users, t(60)).await, 2);
    }

    #[tokio::test]
    async fn test_disabled_user_restarts_interval() {
        let reminder = reminder();
        let users = vec![prefs("user-1", 60)];

        reminder.poll_users(&users, t(0)).await;
        reminder.poll_users(&[], t(30)).await;

        assert_eq!(reminder.poll_users(&users, t(60)).await, 0);
        assert_eq!(reminder.poll_users(&users, t(120)).await, 1);
    }
}
