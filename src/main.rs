// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fasting Tracker API Server
//!
//! Runs the fasting timer, hydration reminders and suggestion generator
//! behind the web client's JSON API.

use fasting_tracker::{
    config::Config, db::FirestoreDb, time_utils::SystemClock, AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const SESSION_TICK: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Fasting Tracker API");

    if config.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY not set, suggestions use fallback lists and schedules are unavailable");
    }
    if config.alert_webhook_url.is_none() {
        tracing::info!("ALERT_WEBHOOK_URL not set, local alerts disabled");
    }

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db, Arc::new(SystemClock)));

    spawn_session_ticker(state.clone());
    spawn_hydration_poll(state.clone());

    // Build router
    let app = fasting_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Advance all running fasting timers once per second.
fn spawn_session_ticker(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_TICK);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let completed = state.sessions.tick_all().await;
            if completed > 0 {
                tracing::debug!(completed, "Session tick completed fasts");
            }
        }
    });
}

/// Send due hydration reminders and drop stale generated-content cache entries.
fn spawn_hydration_poll(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(state.config.hydration_poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if let Err(e) = state.hydration.poll().await {
                tracing::warn!(error = %e, "Hydration poll failed");
            }
            let purged = state.suggestions.purge_expired()
                + state.schedules.purge_expired()
                + state.stress.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "Expired generated-content cache entries removed");
            }
        }
    });
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fasting_tracker=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
