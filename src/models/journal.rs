// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fasting journal entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Stored at: `users/{user_id}/journal_entries/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct JournalEntry {
    pub id: String,
    pub entry: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

/// Create/update request body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct JournalEntryRequest {
    #[validate(length(min = 1, max = 10000))]
    pub entry: String,
    #[serde(default)]
    pub is_public: bool,
    #[validate(length(max = 32))]
    pub emotion: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
}

impl JournalEntry {
    pub fn from_request(request: JournalEntryRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            entry: request.entry,
            is_public: request.is_public,
            emotion: request.emotion.filter(|e| !e.is_empty()),
            image_url: request.image_url.filter(|u| !u.is_empty()),
            created_at,
        }
    }

    /// Replace the editable fields. The entry is re-dated like a fresh write.
    pub fn apply(&mut self, request: JournalEntryRequest, updated_at: DateTime<Utc>) {
        self.entry = request.entry;
        self.is_public = request.is_public;
        self.emotion = request.emotion.filter(|e| !e.is_empty());
        self.image_url = request.image_url.filter(|u| !u.is_empty());
        self.created_at = updated_at;
    }
}
