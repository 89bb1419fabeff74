// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fasting and reminder preferences.
//!
//! Every stored document carries a `version`. A patch may name the version
//! it was based on; stale patches are rejected instead of silently
//! overwriting a newer write from another device.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::fasting::FASTING_TYPES;

pub const DEFAULT_REMINDER_FREQUENCY_MINUTES: i64 = 60;
pub const DEFAULT_DAILY_WATER_GOAL_ML: i64 = 2000;

/// Stored at: `preferences/{user_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FastingPreferences {
    /// Owning user (also used as document ID)
    #[serde(default)]
    pub user_id: String,
    /// Preferred fasting method name
    pub preferred_method: String,
    /// `HH:MM` window used by the `Custom` method
    #[serde(default)]
    pub custom_window: Option<String>,
    /// Hydration reminder interval in minutes
    #[serde(default = "default_reminder_frequency")]
    pub reminder_frequency: i64,
    /// Whether hydration reminders fire
    #[serde(default = "default_true")]
    pub hydration_reminders: bool,
    /// Daily water goal in milliliters
    #[serde(default = "default_water_goal")]
    pub daily_water_goal_ml: i64,
    /// Incremented on every successful save
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub version: u64,
    /// Last update timestamp (ISO 8601)
    #[serde(default)]
    pub updated_at: String,
}

fn default_reminder_frequency() -> i64 {
    DEFAULT_REMINDER_FREQUENCY_MINUTES
}

fn default_true() -> bool {
    true
}

fn default_water_goal() -> i64 {
    DEFAULT_DAILY_WATER_GOAL_ML
}

impl Default for FastingPreferences {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            preferred_method: FASTING_TYPES[0].name.to_string(),
            custom_window: None,
            reminder_frequency: DEFAULT_REMINDER_FREQUENCY_MINUTES,
            hydration_reminders: true,
            daily_water_goal_ml: DEFAULT_DAILY_WATER_GOAL_ML,
            version: 0,
            updated_at: String::new(),
        }
    }
}

/// Partial update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PreferencesPatch {
    #[serde(default)]
    pub preferred_method: Option<String>,
    #[serde(default)]
    pub custom_window: Option<String>,
    #[serde(default)]
    pub reminder_frequency: Option<i64>,
    #[serde(default)]
    pub hydration_reminders: Option<bool>,
    #[serde(default)]
    pub daily_water_goal_ml: Option<i64>,
    /// Version this patch was based on. `None` means last-writer-wins.
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub expected_version: Option<u64>,
}

/// A patch based on an outdated document version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("preferences changed (expected version {expected}, found {actual})")]
pub struct VersionConflict {
    pub expected: u64,
    pub actual: u64,
}

impl FastingPreferences {
    /// Merge `patch` into these preferences and bump the version.
    ///
    /// Values are not validated against each other.
    pub fn apply_patch(
        &mut self,
        patch: &PreferencesPatch,
        now: &str,
    ) -> Result<(), VersionConflict> {
        if let Some(expected) = patch.expected_version {
            if expected != self.version {
                return Err(VersionConflict {
                    expected,
                    actual: self.version,
                });
            }
        }

        if let Some(method) = &patch.preferred_method {
            self.preferred_method = method.clone();
        }
        if let Some(window) = &patch.custom_window {
            self.custom_window = Some(window.clone());
        }
        if let Some(frequency) = patch.reminder_frequency {
            self.reminder_frequency = frequency;
        }
        if let Some(enabled) = patch.hydration_reminders {
            self.hydration_reminders = enabled;
        }
        if let Some(goal) = patch.daily_water_goal_ml {
            self.daily_water_goal_ml = goal;
        }

        self.version += 1;
        self.updated_at = now.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_merges_only_present_fields() {
        let mut prefs = FastingPreferences::default();
        let patch = PreferencesPatch {
            custom_window: Some("10:30".to_string()),
            ..Default::default()
        };

        prefs.apply_patch(&patch, "2025-01-01T00:00:00Z").unwrap();

        assert_eq!(prefs.preferred_method, FASTING_TYPES[0].name);
        assert_eq!(prefs.custom_window.as_deref(), Some("10:30"));
        assert_eq!(prefs.version, 1);
        assert_eq!(prefs.updated_at, "2025-01-01T00:00:00Z");
    }

    #[test]
    fn test_stale_patch_is_rejected() {
        let mut prefs = FastingPreferences {
            version: 4,
            ..Default::default()
        };
        let patch = PreferencesPatch {
            reminder_frequency: Some(30),
            expected_version: Some(3),
            ..Default::default()
        };

        let err = prefs.apply_patch(&patch, "now").unwrap_err();

        assert_eq!(err, VersionConflict { expected: 3, actual: 4 });
        assert_eq!(prefs.reminder_frequency, DEFAULT_REMINDER_FREQUENCY_MINUTES);
        assert_eq!(prefs.version, 4);
    }

    #[test]
    fn test_negative_values_are_accepted() {
        let mut prefs = FastingPreferences::default();
        let patch = PreferencesPatch {
            custom_window: Some("-5:00".to_string()),
            reminder_frequency: Some(-10),
            expected_version: Some(0),
            ..Default::default()
        };

        prefs.apply_patch(&patch, "now").unwrap();

        assert_eq!(prefs.custom_window.as_deref(), Some("-5:00"));
        assert_eq!(prefs.reminder_frequency, -10);
    }

    #[test]
    fn test_missing_fields_deserialize_to_defaults() {
        let prefs: FastingPreferences =
            serde_json::from_str(r#"{"preferred_method":"Ramadan"}"#).unwrap();

        assert_eq!(prefs.preferred_method, "Ramadan");
        assert!(prefs.hydration_reminders);
        assert_eq!(prefs.daily_water_goal_ml, DEFAULT_DAILY_WATER_GOAL_ML);
        assert_eq!(prefs.version, 0);
    }
}
