// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fasting timer lifecycle routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::services::TimerStatus;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/timer", get(get_status))
        .route("/api/timer/start", post(start))
        .route("/api/timer/pause", post(pause))
        .route("/api/timer/resume", post(resume))
        .route("/api/timer/stop", post(stop))
        .route("/api/timer/reset", post(reset))
}

/// Start request. Missing fields fall back to the user's preferences.
#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StartRequest {
    #[serde(default)]
    pub method: Option<String>,
    /// `HH:MM`, only used with the `Custom` method
    #[serde(default)]
    pub custom_window: Option<String>,
}

async fn get_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<TimerStatus> {
    Json(state.sessions.status(&user.user_id).await)
}

async fn start(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<StartRequest>,
) -> Result<Json<TimerStatus>> {
    let status = state
        .sessions
        .start(&user.user_id, request.method, request.custom_window)
        .await?;
    Ok(Json(status))
}

async fn pause(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<TimerStatus>> {
    Ok(Json(state.sessions.pause(&user.user_id).await?))
}

async fn resume(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<TimerStatus>> {
    Ok(Json(state.sessions.resume(&user.user_id).await?))
}

async fn stop(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<TimerStatus>> {
    Ok(Json(state.sessions.stop(&user.user_id).await?))
}

async fn reset(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<TimerStatus>> {
    Ok(Json(state.sessions.reset(&user.user_id).await?))
}
