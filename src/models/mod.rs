// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod fasting;
pub mod hydration;
pub mod journal;
pub mod notification;
pub mod preferences;
pub mod stats;
pub mod stress;
pub mod user;

pub use fasting::{FastingSession, FastingType, FASTING_TYPES};
pub use hydration::{HydrationLog, WaterIntake};
pub use journal::{JournalEntry, JournalEntryRequest};
pub use notification::{Notification, NotificationKind};
pub use preferences::{FastingPreferences, PreferencesPatch, VersionConflict};
pub use stats::{FastingHistory, ProgressStats};
pub use stress::{StressAnswer, StressAssessmentRequest, StressProfile, StressQuestion};
pub use user::{ActivityLevel, Gender, ProfileUpdate, UserProfile};
