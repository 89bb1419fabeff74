// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fasting journal routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{JournalEntry, JournalEntryRequest};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/journal", get(list_entries).post(create_entry))
        .route("/api/journal/{id}", put(update_entry).delete(delete_entry))
}

/// Entries, newest first.
async fn list_entries(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<JournalEntry>>> {
    Ok(Json(state.db.list_journal_entries(&user.user_id).await?))
}

async fn create_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<JournalEntryRequest>,
) -> Result<(StatusCode, Json<JournalEntry>)> {
    request.validate()?;

    let entry = JournalEntry::from_request(request, state.clock.now());
    state.db.set_journal_entry(&user.user_id, &entry).await?;

    tracing::debug!(user_id = %user.user_id, entry_id = %entry.id, "Journal entry created");
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(request): Json<JournalEntryRequest>,
) -> Result<Json<JournalEntry>> {
    request.validate()?;

    let mut entry = state
        .db
        .get_journal_entry(&user.user_id, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Journal entry {}", id)))?;

    entry.apply(request, state.clock.now());
    state.db.set_journal_entry(&user.user_id, &entry).await?;

    Ok(Json(entry))
}

async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.db.delete_journal_entry(&user.user_id, &id).await?;
    tracing::debug!(user_id = %user.user_id, entry_id = %id, "Journal entry deleted");
    Ok(StatusCode::NO_CONTENT)
}
