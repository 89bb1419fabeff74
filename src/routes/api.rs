// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::fasting::FastingType;
use crate::models::{
    FastingHistory, FastingSession, Notification, ProfileUpdate, ProgressStats,
    StressAssessmentRequest, StressProfile, StressQuestion, UserProfile, WaterIntake,
    FASTING_TYPES,
};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/fasting-types", get(get_fasting_types))
        .route("/api/sessions", get(get_sessions))
        .route("/api/progress", get(get_progress))
        .route("/api/profile", get(get_profile).put(update_profile))
        .route("/api/notifications", get(get_notifications))
        .route("/api/notifications/{id}", delete(dismiss_notification))
        .route("/api/hydration", get(get_hydration))
        .route("/api/hydration/intake", post(log_intake))
        .route("/api/hydration/reset", post(reset_intake))
        .route("/api/suggestions", get(get_suggestions))
        .route("/api/schedule", get(get_schedule).post(generate_schedule))
        .route("/api/stress/questions", get(get_stress_questions))
        .route("/api/stress/assessment", post(submit_stress_assessment))
        .route("/api/stress/history", get(get_stress_history))
}

// ─── Catalog & History ───────────────────────────────────────

async fn get_fasting_types() -> Json<&'static [FastingType]> {
    Json(FASTING_TYPES)
}

/// Session history, newest first.
async fn get_sessions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<FastingSession>>> {
    Ok(Json(state.sessions.history(&user.user_id).await?))
}

async fn get_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProgressStats>> {
    let sessions = state.sessions.history(&user.user_id).await?;
    Ok(Json(ProgressStats::from_sessions(&sessions)))
}

// ─── User Profile ────────────────────────────────────────────

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    let profile = state.db.get_profile(&user.user_id).await?.unwrap_or_default();
    Ok(Json(profile))
}

/// Merge the present fields into the stored profile.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>> {
    update.validate()?;

    let mut profile = state.db.get_profile(&user.user_id).await?.unwrap_or_default();
    profile.merge(update, &format_utc_rfc3339(state.clock.now()));
    state.db.upsert_profile(&user.user_id, &profile).await?;

    tracing::info!(user_id = %user.user_id, "Profile updated");
    Ok(Json(profile))
}

// ─── Notifications ───────────────────────────────────────────

async fn get_notifications(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Notification>>> {
    Ok(Json(state.notifications.list(&user.user_id).await?))
}

async fn dismiss_notification(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.notifications.dismiss(&user.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Hydration ───────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HydrationResponse {
    pub current_intake_ml: i64,
    pub daily_water_goal_ml: i64,
    pub history: Vec<WaterIntake>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct IntakeRequest {
    /// Milliliters; negative values correct earlier entries
    #[validate(range(min = -5000, max = 5000))]
    pub amount_ml: i64,
}

async fn hydration_response(state: &AppState, user_id: &str) -> Result<HydrationResponse> {
    let log = state.hydration.log(user_id).await?;
    let prefs = state.preferences.load(user_id).await?;
    Ok(HydrationResponse {
        current_intake_ml: log.current_intake_ml,
        daily_water_goal_ml: prefs.daily_water_goal_ml,
        history: log.history,
    })
}

async fn get_hydration(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<HydrationResponse>> {
    Ok(Json(hydration_response(&state, &user.user_id).await?))
}

async fn log_intake(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<IntakeRequest>,
) -> Result<Json<HydrationResponse>> {
    request.validate()?;
    state
        .hydration
        .log_intake(&user.user_id, request.amount_ml)
        .await?;
    Ok(Json(hydration_response(&state, &user.user_id).await?))
}

async fn reset_intake(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<HydrationResponse>> {
    state.hydration.reset_intake(&user.user_id).await?;
    Ok(Json(hydration_response(&state, &user.user_id).await?))
}

// ─── Suggestions ─────────────────────────────────────────────

#[derive(Deserialize)]
struct SuggestionsQuery {
    /// Fasting method to advise on; defaults to the preferred method
    method: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SuggestionsResponse {
    pub fasting_type: String,
    pub history: FastingHistoryView,
    pub suggestions: Vec<String>,
}

/// Fasting history as shown next to the suggestions.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FastingHistoryView {
    pub completed_fasts: u32,
    pub average_fast_hours: f64,
    pub longest_fast_hours: f64,
    pub consistency: f64,
}

impl From<&FastingHistory> for FastingHistoryView {
    fn from(history: &FastingHistory) -> Self {
        Self {
            completed_fasts: history.completed_fasts,
            average_fast_hours: history.average_fast_duration,
            longest_fast_hours: history.longest_fast,
            consistency: history.consistency,
        }
    }
}

async fn get_suggestions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<SuggestionsQuery>,
) -> Result<Json<SuggestionsResponse>> {
    let profile = state.db.get_profile(&user.user_id).await?.unwrap_or_default();
    let sessions = state.sessions.history(&user.user_id).await?;
    let history = FastingHistory::from_sessions(&sessions);

    let method = match query.method {
        Some(method) => method,
        None => state.preferences.load(&user.user_id).await?.preferred_method,
    };
    let fasting_type = FastingType::find(&method);

    let suggestions = state
        .suggestions
        .generate(&profile, &history, fasting_type)
        .await;

    Ok(Json(SuggestionsResponse {
        fasting_type: fasting_type.name.to_string(),
        history: FastingHistoryView::from(&history),
        suggestions,
    }))
}

// ─── Optimized Schedule ──────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleRequest {
    /// Defaults to the preferred method
    pub method: Option<String>,
    pub custom_window: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ScheduleResponse {
    pub fasting_type: String,
    pub optimized_schedule: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StoredScheduleResponse {
    /// The last schedule generated for this user, if any
    pub optimized_schedule: Option<String>,
}

async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<StoredScheduleResponse>> {
    let profile = state.db.get_profile(&user.user_id).await?.unwrap_or_default();
    Ok(Json(StoredScheduleResponse {
        optimized_schedule: profile.optimized_schedule,
    }))
}

/// Generate a schedule and store it on the profile. Nothing is stored on failure.
async fn generate_schedule(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<ScheduleRequest>,
) -> Result<Json<ScheduleResponse>> {
    let (method, custom_window) = match request.method {
        Some(method) => (method, request.custom_window),
        None => {
            let prefs = state.preferences.load(&user.user_id).await?;
            (
                prefs.preferred_method,
                request.custom_window.or(prefs.custom_window),
            )
        }
    };
    let fasting_type = FastingType::find(&method);
    let target_secs = fasting_type.target_secs(custom_window.as_deref());

    let schedule = state.schedules.generate(fasting_type, target_secs).await?;

    let mut profile = state.db.get_profile(&user.user_id).await?.unwrap_or_default();
    profile.optimized_schedule = Some(schedule.clone());
    profile.updated_at = format_utc_rfc3339(state.clock.now());
    state.db.upsert_profile(&user.user_id, &profile).await?;

    tracing::info!(
        user_id = %user.user_id,
        fasting_type = fasting_type.name,
        "Optimized schedule stored"
    );
    Ok(Json(ScheduleResponse {
        fasting_type: fasting_type.name.to_string(),
        optimized_schedule: schedule,
    }))
}

// ─── Stress Check-in ─────────────────────────────────────────

async fn get_stress_questions(State(state): State<Arc<AppState>>) -> Json<Vec<StressQuestion>> {
    Json(state.stress.questions().await)
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StressAssessmentResponse {
    pub profile: StressProfile,
    pub suggestions: Vec<String>,
}

/// Score a completed check-in, append it to the history and advise.
async fn submit_stress_assessment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<StressAssessmentRequest>,
) -> Result<Json<StressAssessmentResponse>> {
    request.validate()?;

    let suggestions = state.stress.management_suggestions(&request.answers).await;

    let now = state.clock.now();
    let assessment = StressProfile::new(request.answers, now.format("%Y-%m-%d").to_string());

    let mut profile = state.db.get_profile(&user.user_id).await?.unwrap_or_default();
    profile.stress_profiles.push(assessment.clone());
    profile.updated_at = format_utc_rfc3339(now);
    state.db.upsert_profile(&user.user_id, &profile).await?;

    tracing::info!(
        user_id = %user.user_id,
        stress_level = assessment.stress_level,
        "Stress check-in recorded"
    );
    Ok(Json(StressAssessmentResponse {
        profile: assessment,
        suggestions,
    }))
}

async fn get_stress_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<StressProfile>>> {
    let profile = state.db.get_profile(&user.user_id).await?.unwrap_or_default();
    Ok(Json(profile.stress_profiles))
}
