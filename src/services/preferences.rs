// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Preference store proxy with live updates.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{FastingPreferences, PreferencesPatch};
use crate::time_utils::{format_utc_rfc3339, SharedClock};
use dashmap::DashMap;
use tokio::sync::broadcast;

/// Updates buffered per user before slow subscribers start lagging.
const CHANNEL_CAPACITY: usize = 16;

pub struct PreferenceService {
    db: FirestoreDb,
    clock: SharedClock,
    channels: DashMap<String, broadcast::Sender<FastingPreferences>>,
}

impl PreferenceService {
    pub fn new(db: FirestoreDb, clock: SharedClock) -> Self {
        Self {
            db,
            clock,
            channels: DashMap::new(),
        }
    }

    /// Stored preferences, or defaults when the user has none yet.
    pub async fn load(&self, user_id: &str) -> Result<FastingPreferences, AppError> {
        let mut prefs = self.db.get_preferences(user_id).await?.unwrap_or_default();
        prefs.user_id = user_id.to_string();
        Ok(prefs)
    }

    /// Merge a partial update and notify subscribers.
    pub async fn save(
        &self,
        user_id: &str,
        patch: &PreferencesPatch,
    ) -> Result<FastingPreferences, AppError> {
        let now = format_utc_rfc3339(self.clock.now());
        let prefs = self
            .db
            .save_preferences_atomic(user_id, patch, &now)
            .await?;

        tracing::info!(user_id, version = prefs.version, "Preferences updated");
        self.publish(user_id, &prefs);
        Ok(prefs)
    }

    /// Receive every preference update saved after this call.
    pub fn subscribe(&self, user_id: &str) -> broadcast::Receiver<FastingPreferences> {
        self.channels
            .entry(user_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Returns the number of subscribers that received the update.
    pub fn publish(&self, user_id: &str, prefs: &FastingPreferences) -> usize {
        let delivered = self
            .channels
            .get(user_id)
            .and_then(|tx| tx.send(prefs.clone()).ok())
            .unwrap_or(0);

        self.channels
            .remove_if(user_id, |_, tx| tx.receiver_count() == 0);

        delivered
    }

    pub fn subscriber_count(&self, user_id: &str) -> usize {
        self.channels
            .get(user_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_utils::SystemClock;
    use std::sync::Arc;

    fn service() -> PreferenceService {
        PreferenceService::new(FirestoreDb::new_mock(), Arc::new(SystemClock))
    }

    #[tokio::test]
    async fn test_subscribers_receive_published_updates() {
        let service = service();
        let mut rx = service.subscribe("user-1");
        let prefs = FastingPreferences {
            preferred_method: "Ramadan".to_string(),
            version: 2,
            ..Default::default()
        };

        assert_eq!(service.publish("user-1", &prefs), 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.preferred_method, "Ramadan");
        assert_eq!(received.version, 2);
    }

    #[test]
    fn test_updates_are_scoped_per_user() {
        let service = service();
        let mut other = service.subscribe("user-2");

        assert_eq!(service.publish("user-1", &FastingPreferences::default()), 0);
        assert!(other.try_recv().is_err());
    }

    #[test]
    fn test_channel_dropped_without_subscribers() {
        let service = service();
        let rx = service.subscribe("user-1");
        assert_eq!(service.subscriber_count("user-1"), 1);

        drop(rx);
        service.publish("user-1", &FastingPreferences::default());

        assert_eq!(service.subscriber_count("user-1"), 0);
        assert!(service.channels.is_empty());
    }

    #[tokio::test]
    async fn test_save_offline_is_database_error() {
        let service = service();

        let result = service.save("user-1", &PreferencesPatch::default()).await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }
}
