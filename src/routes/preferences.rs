// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Preference routes, including the live update stream.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{FastingPreferences, PreferencesPatch};
use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Extension, Json, Router,
};
use futures_util::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::{error::RecvError, Receiver};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/preferences",
            get(get_preferences).patch(update_preferences),
        )
        .route("/api/preferences/stream", get(stream_preferences))
}

async fn get_preferences(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<FastingPreferences>> {
    Ok(Json(state.preferences.load(&user.user_id).await?))
}

/// Merge a partial update. A stale `expected_version` yields 409.
async fn update_preferences(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(patch): Json<PreferencesPatch>,
) -> Result<Json<FastingPreferences>> {
    let prefs = state.preferences.save(&user.user_id, &patch).await?;

    if patch.hydration_reminders == Some(true) && state.notifications.clear_give_up(&user.user_id)
    {
        tracing::info!(user_id = %user.user_id, "Local alerts re-enabled");
    }

    Ok(Json(prefs))
}

fn preferences_event(prefs: &FastingPreferences) -> Event {
    Event::default()
        .event("preferences")
        .json_data(prefs)
        .unwrap_or_else(|e| Event::default().comment(format!("encode error: {}", e)))
}

/// Server-sent events: the current preferences, then every saved update.
async fn stream_preferences(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    // Subscribe before loading so no update slips between the two.
    let rx = state.preferences.subscribe(&user.user_id);
    let initial = match state.preferences.load(&user.user_id).await {
        Ok(prefs) => Some(prefs),
        Err(e) => {
            tracing::warn!(user_id = %user.user_id, error = %e, "Initial preferences unavailable");
            None
        }
    };

    tracing::debug!(user_id = %user.user_id, "Preference stream opened");

    let stream = stream::unfold(
        (rx, initial),
        |(mut rx, initial): (Receiver<FastingPreferences>, Option<FastingPreferences>)| async move {
            if let Some(prefs) = initial {
                return Some((Ok(preferences_event(&prefs)), (rx, None)));
            }
            loop {
                match rx.recv().await {
                    Ok(prefs) => return Some((Ok(preferences_event(&prefs)), (rx, None))),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Preference stream lagged");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        },
    );

    Sse::new(stream).keep_alive(KeepAlive::default())
}
