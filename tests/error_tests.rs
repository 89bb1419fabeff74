// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use fasting_tracker::error::AppError;
use fasting_tracker::models::{ProfileUpdate, VersionConflict};
use fasting_tracker::services::TimerError;
use validator::Validate;

mod common;
use common::body_json;

async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    (status, body_json(response).await)
}

#[tokio::test]
async fn test_conflict_response() {
    let (status, body) = render(AppError::Conflict("stale".to_string())).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    assert_eq!(body["details"], "stale");
}

#[tokio::test]
async fn test_database_details_are_hidden() {
    let (status, body) = render(AppError::Database("connection refused".to_string())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_not_found_response() {
    let (status, body) = render(AppError::NotFound("Journal entry x".to_string())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_generative_error_is_bad_gateway() {
    let (status, body) = render(AppError::GenerativeApi("HTTP 503".to_string())).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "generative_error");
}

#[test]
fn test_timer_error_maps_to_conflict() {
    let err: AppError = TimerError::AlreadyActive.into();
    assert!(matches!(err, AppError::Conflict(_)));

    let err: AppError = TimerError::NotPaused.into();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[test]
fn test_validation_errors_map_to_bad_request() {
    let update = ProfileUpdate {
        age: Some(200),
        ..Default::default()
    };
    let err: AppError = update.validate().unwrap_err().into();

    assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("age")));
}

#[test]
fn test_version_conflict_maps_to_conflict() {
    let err: AppError = VersionConflict {
        expected: 3,
        actual: 4,
    }
    .into();

    assert!(matches!(err, AppError::Conflict(msg) if msg.contains("expected version 3")));
}
