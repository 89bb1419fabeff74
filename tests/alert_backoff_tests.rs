// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local alert delivery against a mock webhook.

use chrono::Utc;
use fasting_tracker::config::Config;
use fasting_tracker::models::{Notification, NotificationKind};
use fasting_tracker::services::{DeliveryOutcome, NotificationDispatcher};
use mockito::{Matcher, Server};
use serde_json::json;

mod common;
use common::test_db_offline;

fn dispatcher(server: &Server) -> NotificationDispatcher {
    let config = Config {
        alert_webhook_url: Some(format!("{}/alert", server.url())),
        ..Config::test_default()
    };
    NotificationDispatcher::new(test_db_offline(), &config)
}

fn alert(message: &str) -> Notification {
    Notification::new(NotificationKind::Alert, message, Utc::now())
}

#[tokio::test]
async fn test_alert_payload_delivered() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/alert")
        .match_body(Matcher::PartialJson(json!({
            "user_id": "user-1",
            "kind": "alert",
            "message": "Your Ramadan fasting session has ended after 14:00:00.",
        })))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let outcome = dispatcher(&server)
        .deliver_alert(
            "user-1",
            &alert("Your Ramadan fasting session has ended after 14:00:00."),
        )
        .await;

    assert_eq!(outcome, DeliveryOutcome::Delivered);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_transient_failures_are_bounded() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/alert")
        .with_status(500)
        .expect(3)
        .create_async()
        .await;

    let outcome = dispatcher(&server)
        .deliver_alert("user-1", &alert("hello"))
        .await;

    // test_default allows three attempts
    assert_eq!(outcome, DeliveryOutcome::GaveUp { attempts: 3 });
    mock.assert_async().await;
}

#[tokio::test]
async fn test_permission_denied_gives_up_until_cleared() {
    let mut server = Server::new_async().await;
    let denied = server
        .mock("POST", "/alert")
        .match_body(Matcher::Regex("\"one\"".to_string()))
        .with_status(403)
        .expect(1)
        .create_async()
        .await;

    let dispatcher = dispatcher(&server);

    let outcome = dispatcher.deliver_alert("user-1", &alert("one")).await;
    assert_eq!(outcome, DeliveryOutcome::PermissionDenied);
    assert!(dispatcher.is_given_up("user-1"));

    // No request is made while the user is in the give-up state.
    let outcome = dispatcher.deliver_alert("user-1", &alert("two")).await;
    assert_eq!(outcome, DeliveryOutcome::PermissionDenied);
    denied.assert_async().await;

    // Other users are unaffected.
    assert!(!dispatcher.is_given_up("user-2"));

    let accepted = server
        .mock("POST", "/alert")
        .match_body(Matcher::Regex("\"three\"".to_string()))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    assert!(dispatcher.clear_give_up("user-1"));
    let outcome = dispatcher.deliver_alert("user-1", &alert("three")).await;
    assert_eq!(outcome, DeliveryOutcome::Delivered);
    accepted.assert_async().await;
}
