// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod cache;
pub mod gemini;
pub mod hydration;
pub mod notifications;
pub mod preferences;
pub mod schedule;
pub mod sessions;
pub mod stress;
pub mod suggestions;
pub mod timer;

pub use cache::TtlCache;
pub use gemini::GeminiClient;
pub use hydration::HydrationReminder;
pub use notifications::{DeliveryOutcome, NotificationDispatcher, RetryPolicy};
pub use preferences::PreferenceService;
pub use schedule::ScheduleGenerator;
pub use sessions::{SessionController, TimerStatus};
pub use stress::StressAdvisor;
pub use suggestions::SuggestionGenerator;
pub use timer::{FastingTimer, TimerError, TimerEvent, TimerState};
