// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Profiles and preferences (top-level, keyed by user)
//! - Hydration logs (top-level, keyed by user)
//! - Fasting sessions, notifications and journal entries
//!   (sub-collections under `users/{user_id}`)

use crate::db::collections;
use firestore::FirestoreConsistencySelector;
use crate::error::AppError;
use crate::models::{
    FastingPreferences, FastingSession, HydrationLog, JournalEntry, Notification,
    PreferencesPatch, UserProfile,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Whether a real connection is configured.
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    fn user_path(&self, user_id: &str) -> Result<firestore::ParentPathBuilder, AppError> {
        self.get_client()?
            .parent_path(collections::USERS, user_id)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Profile Operations ──────────────────────────────────────

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        self.get_top_level(collections::USERS, user_id).await
    }

    pub async fn upsert_profile(
        &self,
        user_id: &str,
        profile: &UserProfile,
    ) -> Result<(), AppError> {
        self.set_top_level(collections::USERS, user_id, profile)
            .await
    }

    // ─── Preference Operations ───────────────────────────────────

    pub async fn get_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<FastingPreferences>, AppError> {
        self.get_top_level(collections::PREFERENCES, user_id).await
    }

    /// Apply a patch to stored preferences inside a transaction.
    ///
    /// The read runs under the transaction's consistency selector, which
    /// registers the document for conflict detection: a concurrent save
    /// either sees the newer version or fails to commit.
    /// Returns `AppError::Conflict` when `expected_version` is stale.
    pub async fn save_preferences_atomic(
        &self,
        user_id: &str,
        patch: &PreferencesPatch,
        now: &str,
    ) -> Result<FastingPreferences, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let tx_client = client.clone_with_consistency_selector(
            FirestoreConsistencySelector::Transaction(transaction.transaction_id().clone()),
        );

        let current: Option<FastingPreferences> = match tx_client
            .fluent()
            .select()
            .by_id_in(collections::PREFERENCES)
            .obj()
            .one(user_id)
            .await
        {
            Ok(current) => current,
            Err(e) => {
                let _ = transaction.rollback().await;
                return Err(AppError::Database(format!(
                    "Failed to read preferences in transaction: {}",
                    e
                )));
            }
        };

        let mut prefs = current.unwrap_or_default();
        prefs.user_id = user_id.to_string();

        if let Err(conflict) = prefs.apply_patch(patch, now) {
            let _ = transaction.rollback().await;
            return Err(conflict.into());
        }

        client
            .fluent()
            .update()
            .in_col(collections::PREFERENCES)
            .document_id(user_id)
            .object(&prefs)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add preferences to transaction: {}", e))
            })?;

        transaction.commit().await.map_err(commit_error)?;

        tracing::debug!(user_id, version = prefs.version, "Preferences saved");

        Ok(prefs)
    }

    /// All users that currently have hydration reminders enabled.
    pub async fn list_hydration_enabled(&self) -> Result<Vec<FastingPreferences>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::PREFERENCES)
            .filter(|q| q.field("hydration_reminders").eq(true))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Hydration Operations ────────────────────────────────────

    pub async fn get_hydration(&self, user_id: &str) -> Result<Option<HydrationLog>, AppError> {
        self.get_top_level(collections::HYDRATION, user_id).await
    }

    pub async fn set_hydration(&self, user_id: &str, log: &HydrationLog) -> Result<(), AppError> {
        self.set_top_level(collections::HYDRATION, user_id, log)
            .await
    }

    // ─── Fasting Session Operations ──────────────────────────────

    /// Create or update a session. The document ID is the start time in millis.
    pub async fn set_session(
        &self,
        user_id: &str,
        session: &FastingSession,
    ) -> Result<(), AppError> {
        self.set_child(user_id, collections::FASTING_SESSIONS, &session.id, session)
            .await
    }

    /// All sessions for a user, newest first.
    pub async fn list_sessions(&self, user_id: &str) -> Result<Vec<FastingSession>, AppError> {
        let mut sessions: Vec<FastingSession> = self
            .list_children(user_id, collections::FASTING_SESSIONS)
            .await?;
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(sessions)
    }

    /// The most recent session that has not been finished, if any.
    pub async fn find_unfinished_session(
        &self,
        user_id: &str,
    ) -> Result<Option<FastingSession>, AppError> {
        Ok(self
            .list_sessions(user_id)
            .await?
            .into_iter()
            .find(FastingSession::is_active))
    }

    // ─── Notification Operations ─────────────────────────────────

    pub async fn add_notification(
        &self,
        user_id: &str,
        notification: &Notification,
    ) -> Result<(), AppError> {
        self.set_child(
            user_id,
            collections::NOTIFICATIONS,
            &notification.id,
            notification,
        )
        .await
    }

    /// Notifications for a user, newest first.
    pub async fn list_notifications(&self, user_id: &str) -> Result<Vec<Notification>, AppError> {
        let mut notifications: Vec<Notification> = self
            .list_children(user_id, collections::NOTIFICATIONS)
            .await?;
        notifications.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(notifications)
    }

    pub async fn delete_notification(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        self.delete_child(user_id, collections::NOTIFICATIONS, id)
            .await
    }

    // ─── Journal Operations ──────────────────────────────────────

    /// Journal entries for a user, newest first.
    pub async fn list_journal_entries(
        &self,
        user_id: &str,
    ) -> Result<Vec<JournalEntry>, AppError> {
        let mut entries: Vec<JournalEntry> = self
            .list_children(user_id, collections::JOURNAL_ENTRIES)
            .await?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    pub async fn get_journal_entry(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Option<JournalEntry>, AppError> {
        self.get_child(user_id, collections::JOURNAL_ENTRIES, id)
            .await
    }

    pub async fn set_journal_entry(
        &self,
        user_id: &str,
        entry: &JournalEntry,
    ) -> Result<(), AppError> {
        self.set_child(user_id, collections::JOURNAL_ENTRIES, &entry.id, entry)
            .await
    }

    pub async fn delete_journal_entry(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        self.delete_child(user_id, collections::JOURNAL_ENTRIES, id)
            .await
    }

    // ─── Helper Methods ──────────────────────────────────────────

    async fn get_top_level<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_top_level<T>(&self, collection: &str, id: &str, obj: &T) -> Result<(), AppError>
    where
        T: Serialize + for<'de> Deserialize<'de> + Sync + Send,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(obj)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn get_child<T>(
        &self,
        user_id: &str,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        let parent_path = self.user_path(user_id)?;
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .parent(&parent_path)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_children<T>(&self, user_id: &str, collection: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        let parent_path = self.user_path(user_id)?;
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .parent(&parent_path)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn set_child<T>(
        &self,
        user_id: &str,
        collection: &str,
        id: &str,
        obj: &T,
    ) -> Result<(), AppError>
    where
        T: Serialize + for<'de> Deserialize<'de> + Sync + Send,
    {
        let parent_path = self.user_path(user_id)?;
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .parent(&parent_path)
            .object(obj)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_child(&self, user_id: &str, collection: &str, id: &str) -> Result<(), AppError> {
        let parent_path = self.user_path(user_id)?;
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .parent(&parent_path)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Contention on commit means another save won the race.
fn commit_error(err: firestore::errors::FirestoreError) -> AppError {
    match err {
        firestore::errors::FirestoreError::DatabaseError(ref db_err)
            if db_err.public.code == "Aborted" =>
        {
            AppError::Conflict("preferences changed concurrently".to_string())
        }
        other => AppError::Database(format!("Transaction commit failed: {}", other)),
    }
}
