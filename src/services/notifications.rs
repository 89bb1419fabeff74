// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Notification dispatcher.
//!
//! Every notification is written to the user's `notifications` sub-collection.
//! When an alert webhook is configured, the notification is also pushed there
//! as the "local alert" (sound/popup on the client side). Alert delivery retries
//! with bounded exponential backoff; an authorization failure from the alert
//! endpoint parks the user in a give-up set until reminders are re-enabled.

use crate::config::Config;
use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{Notification, NotificationKind};
use chrono::{DateTime, Utc};
use dashmap::DashSet;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.alert_max_attempts,
            initial_delay: config.alert_initial_delay,
            max_delay: config.alert_max_delay,
        }
    }

    /// Delay after the failed attempt with index `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// No alert channel configured.
    Disabled,
    GaveUp { attempts: u32 },
    PermissionDenied,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlertError {
    #[error("alert permission denied")]
    PermissionDenied,
    #[error("alert delivery failed: {0}")]
    Transient(String),
}

/// Run `attempt_fn` until it succeeds, is denied, or the policy is exhausted.
pub async fn retry_with_backoff<F, Fut>(policy: &RetryPolicy, mut attempt_fn: F) -> DeliveryOutcome
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<(), AlertError>>,
{
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 0..max_attempts {
        match attempt_fn(attempt).await {
            Ok(()) => return DeliveryOutcome::Delivered,
            Err(AlertError::PermissionDenied) => return DeliveryOutcome::PermissionDenied,
            Err(AlertError::Transient(reason)) => {
                tracing::warn!(attempt, reason = %reason, "Alert attempt failed");
                if attempt + 1 < max_attempts {
                    tokio::time::sleep(policy.delay_for(attempt)).await;
                }
            }
        }
    }

    DeliveryOutcome::GaveUp {
        attempts: max_attempts,
    }
}

/// Body posted to the alert webhook.
#[derive(Debug, Serialize)]
struct AlertPayload<'a> {
    user_id: &'a str,
    kind: NotificationKind,
    message: &'a str,
    timestamp: DateTime<Utc>,
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    db: FirestoreDb,
    http: reqwest::Client,
    alert_url: Option<String>,
    policy: RetryPolicy,
    given_up: Arc<DashSet<String>>,
}

impl NotificationDispatcher {
    pub fn new(db: FirestoreDb, config: &Config) -> Self {
        Self {
            db,
            http: reqwest::Client::new(),
            alert_url: config.alert_webhook_url.clone(),
            policy: RetryPolicy::from_config(config),
            given_up: Arc::new(DashSet::new()),
        }
    }

    /// Record a notification and fire the local alert in the background.
    ///
    /// A failed write is logged and does not prevent the alert.
    pub async fn notify(
        &self,
        user_id: &str,
        kind: NotificationKind,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Notification {
        let notification = Notification::new(kind, message, now);

        if let Err(e) = self.db.add_notification(user_id, &notification).await {
            tracing::warn!(
                user_id,
                kind = kind.as_str(),
                error = %e,
                "Failed to store notification"
            );
        }

        if self.alert_url.is_some() && !self.is_given_up(user_id) {
            let dispatcher = self.clone();
            let user_id = user_id.to_string();
            let alert = notification.clone();
            tokio::spawn(async move {
                dispatcher.deliver_alert(&user_id, &alert).await;
            });
        }

        notification
    }

    /// Push one notification to the alert webhook, retrying transient failures.
    pub async fn deliver_alert(&self, user_id: &str, notification: &Notification) -> DeliveryOutcome {
        let Some(url) = self.alert_url.as_deref() else {
            return DeliveryOutcome::Disabled;
        };
        if self.is_given_up(user_id) {
            return DeliveryOutcome::PermissionDenied;
        }

        let payload = AlertPayload {
            user_id,
            kind: notification.kind,
            message: &notification.message,
            timestamp: notification.timestamp,
        };

        let outcome = retry_with_backoff(&self.policy, |_| self.send_alert(url, &payload)).await;

        match outcome {
            DeliveryOutcome::Delivered => {
                tracing::debug!(user_id, notification_id = %notification.id, "Alert delivered");
            }
            DeliveryOutcome::PermissionDenied => {
                tracing::warn!(user_id, "Alert permission denied, suppressing further alerts");
                self.given_up.insert(user_id.to_string());
            }
            DeliveryOutcome::GaveUp { attempts } => {
                tracing::warn!(user_id, attempts, "Giving up on alert delivery");
            }
            DeliveryOutcome::Disabled => {}
        }

        outcome
    }

    async fn send_alert(&self, url: &str, payload: &AlertPayload<'_>) -> Result<(), AlertError> {
        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| AlertError::Transient(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(AlertError::PermissionDenied);
        }

        let body = response.text().await.unwrap_or_default();
        Err(AlertError::Transient(format!("HTTP {}: {}", status, body)))
    }

    pub fn is_given_up(&self, user_id: &str) -> bool {
        self.given_up.contains(user_id)
    }

    /// Allow local alerts again. Returns whether the user was in the give-up set.
    pub fn clear_give_up(&self, user_id: &str) -> bool {
        self.given_up.remove(user_id).is_some()
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Notification>, AppError> {
        self.db.list_notifications(user_id).await
    }

    pub async fn dismiss(&self, user_id: &str, notification_id: &str) -> Result<(), AppError> {
        self.db.delete_notification(user_id, notification_id).await?;
        tracing::debug!(user_id, notification_id, "Notification dismissed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(480),
        };

        assert_eq!(policy.delay_for(0), Duration::from_secs(30));
        assert_eq!(policy.delay_for(1), Duration::from_secs(60));
        assert_eq!(policy.delay_for(4), Duration::from_secs(480));
        assert_eq!(policy.delay_for(40), Duration::from_secs(480));
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);

        let outcome = retry_with_backoff(&fast_policy(5), |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(AlertError::Transient("503".to_string()))
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert_eq!(outcome, DeliveryOutcome::Delivered);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_is_bounded() {
        let calls = AtomicU32::new(0);

        let outcome = retry_with_backoff(&fast_policy(3), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AlertError::Transient("timeout".to_string())) }
        })
        .await;

        assert_eq!(outcome, DeliveryOutcome::GaveUp { attempts: 3 });
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permission_denied_stops_immediately() {
        let calls = AtomicU32::new(0);

        let outcome = retry_with_backoff(&fast_policy(5), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AlertError::PermissionDenied) }
        })
        .await;

        assert_eq!(outcome, DeliveryOutcome::PermissionDenied);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_webhook_is_disabled() {
        let dispatcher =
            NotificationDispatcher::new(FirestoreDb::new_mock(), &Config::test_default());
        let notification = Notification::new(NotificationKind::Alert, "done", Utc::now());

        let outcome = dispatcher.deliver_alert("user-1", &notification).await;

        assert_eq!(outcome, DeliveryOutcome::Disabled);
    }
}
