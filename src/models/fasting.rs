// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fasting methods and session records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Name of the user-defined fasting method.
pub const CUSTOM_METHOD: &str = "Custom";

/// Window used for `Custom` when the user has not set one.
pub const DEFAULT_CUSTOM_WINDOW: &str = "16:00";

const HOUR: u64 = 60 * 60;

/// A named fasting preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FastingType {
    pub name: &'static str,
    /// Target fast length in seconds (0 for `Custom`)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub duration_secs: u64,
    pub icon: &'static str,
}

/// Built-in fasting presets, in display order.
pub const FASTING_TYPES: &[FastingType] = &[
    FastingType {
        name: "16:8 Intermittent Fasting",
        duration_secs: 16 * HOUR,
        icon: "🕰️",
    },
    FastingType {
        name: "18:6 Intermittent Fasting",
        duration_secs: 18 * HOUR,
        icon: "⏳",
    },
    FastingType {
        name: "20:4 Intermittent Fasting",
        duration_secs: 20 * HOUR,
        icon: "⌛",
    },
    FastingType {
        name: "OMAD (One Meal a Day)",
        duration_secs: 23 * HOUR,
        icon: "🍽️",
    },
    FastingType {
        name: "Ramadan",
        duration_secs: 14 * HOUR,
        icon: "🌙",
    },
    FastingType {
        name: "Shawwal (6 days)",
        duration_secs: 14 * HOUR,
        icon: "📅",
    },
    FastingType {
        name: "Muharram (Ashura)",
        duration_secs: 24 * HOUR,
        icon: "🕌",
    },
    FastingType {
        name: "Dhul-Hijjah (9 days)",
        duration_secs: 14 * HOUR,
        icon: "🐑",
    },
    FastingType {
        name: CUSTOM_METHOD,
        duration_secs: 0,
        icon: "✏️",
    },
];

impl FastingType {
    /// Look up a preset by name, falling back to the first preset.
    pub fn find(name: &str) -> &'static FastingType {
        FASTING_TYPES
            .iter()
            .find(|t| t.name == name)
            .unwrap_or(&FASTING_TYPES[0])
    }

    pub fn is_custom(&self) -> bool {
        self.name == CUSTOM_METHOD
    }

    /// Target duration for this method, using `custom_window` for `Custom`.
    pub fn target_secs(&self, custom_window: Option<&str>) -> u64 {
        if self.is_custom() {
            custom_window_secs(custom_window.unwrap_or(DEFAULT_CUSTOM_WINDOW))
        } else {
            self.duration_secs
        }
    }
}

/// Parse an `HH:MM` custom window into (hours, minutes).
///
/// Unparseable parts read as zero. Negative values are passed through.
pub fn parse_custom_window(window: &str) -> (i64, i64) {
    let mut parts = window.splitn(2, ':');
    let hours = parts
        .next()
        .and_then(|h| h.trim().parse().ok())
        .unwrap_or(0);
    let minutes = parts
        .next()
        .and_then(|m| m.trim().parse().ok())
        .unwrap_or(0);
    (hours, minutes)
}

/// Length of an `HH:MM` custom window in seconds, clamped at zero.
pub fn custom_window_secs(window: &str) -> u64 {
    let (hours, minutes) = parse_custom_window(window);
    let secs = hours.saturating_mul(3600).saturating_add(minutes.saturating_mul(60));
    secs.max(0) as u64
}

/// Stored fasting session record.
///
/// Stored at: `users/{user_id}/fasting_sessions/{start_millis}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FastingSession {
    /// Start instant in epoch milliseconds (also used as document ID)
    pub id: String,
    /// When the fast started
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub start_time: DateTime<Utc>,
    /// When the fast ended (None while active)
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub end_time: Option<DateTime<Utc>>,
    /// Fasting method name
    pub method: String,
    /// `HH:MM` window for custom fasts
    #[serde(default)]
    pub custom_window: Option<String>,
    /// Target duration in seconds
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub target_secs: u64,
    /// Elapsed fasting time in seconds, set when the session ends
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub duration_secs: Option<u64>,
    /// Whether the target duration was reached
    #[serde(default)]
    pub completed: bool,
}

impl FastingSession {
    /// Build the record written when a timer starts.
    pub fn started(
        start_time: DateTime<Utc>,
        method: &str,
        custom_window: Option<String>,
        target_secs: u64,
    ) -> Self {
        Self {
            id: start_time.timestamp_millis().to_string(),
            start_time,
            end_time: None,
            method: method.to_string(),
            custom_window,
            target_secs,
            duration_secs: None,
            completed: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }

    /// Finalize the record.
    pub fn finish(&mut self, end_time: DateTime<Utc>, duration_secs: u64, completed: bool) {
        self.end_time = Some(end_time);
        self.duration_secs = Some(duration_secs);
        self.completed = completed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_find_known_and_unknown() {
        assert_eq!(FastingType::find("Ramadan").duration_secs, 14 * HOUR);
        assert_eq!(FastingType::find("Juice Cleanse").name, FASTING_TYPES[0].name);
    }

    #[test]
    fn test_custom_target_from_window() {
        let custom = FastingType::find(CUSTOM_METHOD);
        assert_eq!(custom.target_secs(Some("12:30")), 12 * HOUR + 30 * 60);
        assert_eq!(custom.target_secs(None), 16 * HOUR);

        let preset = FastingType::find("18:6 Intermittent Fasting");
        assert_eq!(preset.target_secs(Some("01:00")), 18 * HOUR);
    }

    #[test]
    fn test_custom_window_is_lenient() {
        assert_eq!(parse_custom_window("07:15"), (7, 15));
        assert_eq!(parse_custom_window("9"), (9, 0));
        assert_eq!(parse_custom_window("abc:xx"), (0, 0));
        assert_eq!(parse_custom_window("-3:00"), (-3, 0));
        assert_eq!(custom_window_secs("-3:00"), 0);
    }

    #[test]
    fn test_session_id_is_start_millis() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 20, 0, 0).unwrap();
        let session = FastingSession::started(start, "Ramadan", None, 14 * HOUR);
        assert_eq!(session.id, start.timestamp_millis().to_string());
        assert!(session.is_active());
    }
}
