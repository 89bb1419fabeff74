// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fasting history and progress aggregates.
//!
//! Both are derived from the user's finished session records on read; nothing
//! here is stored.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::FastingSession;

const SECS_PER_HOUR: f64 = 3600.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Summary of past fasts, used by the suggestion generator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FastingHistory {
    /// Fasts that reached their target duration
    pub completed_fasts: u32,
    /// Mean length of finished fasts, in hours
    pub average_fast_duration: f64,
    /// Longest finished fast, in hours
    pub longest_fast: f64,
    /// Completed fasts divided by finished fasts (0..=1)
    pub consistency: f64,
}

impl FastingHistory {
    pub fn from_sessions(sessions: &[FastingSession]) -> Self {
        let finished: Vec<&FastingSession> =
            sessions.iter().filter(|s| s.end_time.is_some()).collect();

        if finished.is_empty() {
            return Self::default();
        }

        let hours: Vec<f64> = finished
            .iter()
            .map(|s| s.duration_secs.unwrap_or(0) as f64 / SECS_PER_HOUR)
            .collect();
        let completed = finished.iter().filter(|s| s.completed).count();

        Self {
            completed_fasts: completed as u32,
            average_fast_duration: hours.iter().sum::<f64>() / hours.len() as f64,
            longest_fast: hours.iter().copied().fold(0.0, f64::max),
            consistency: completed as f64 / finished.len() as f64,
        }
    }
}

/// One finished fast on the progress chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProgressPoint {
    /// Session start date ("YYYY-MM-DD")
    pub date: String,
    /// Whole-hour-scale fasts are reported in hours...
    pub fasting_hours: f64,
    /// ...and fasts shorter than an hour in minutes.
    pub fasting_minutes: f64,
}

/// Progress tracker response body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProgressStats {
    /// Chart points, oldest first
    pub points: Vec<ProgressPoint>,
    pub average_fasting_hours: f64,
    pub longest_fast_hours: f64,
    pub total_fasts: u32,
    /// Average share of a day spent fasting
    pub daily_fasting_hours: f64,
    pub daily_non_fasting_hours: f64,
}

impl ProgressStats {
    pub fn from_sessions(sessions: &[FastingSession]) -> Self {
        let mut finished: Vec<&FastingSession> = sessions
            .iter()
            .filter(|s| s.end_time.is_some() && s.duration_secs.unwrap_or(0) > 0)
            .collect();
        finished.sort_by_key(|s| s.start_time);

        if finished.is_empty() {
            return Self {
                daily_non_fasting_hours: HOURS_PER_DAY,
                ..Default::default()
            };
        }

        let mut total_hours = 0.0;
        let mut longest_hours: f64 = 0.0;
        let points: Vec<ProgressPoint> = finished
            .iter()
            .map(|s| {
                let hours = s.duration_secs.unwrap_or(0) as f64 / SECS_PER_HOUR;
                total_hours += hours;
                longest_hours = longest_hours.max(hours);

                let (fasting_hours, fasting_minutes) = if hours < 1.0 {
                    (0.0, hours * 60.0)
                } else {
                    (hours, 0.0)
                };

                ProgressPoint {
                    date: s.start_time.format("%Y-%m-%d").to_string(),
                    fasting_hours,
                    fasting_minutes,
                }
            })
            .collect();

        let average = total_hours / points.len() as f64;

        Self {
            total_fasts: points.len() as u32,
            points,
            average_fasting_hours: average,
            longest_fast_hours: longest_hours,
            daily_fasting_hours: average.min(HOURS_PER_DAY),
            daily_non_fasting_hours: (HOURS_PER_DAY - average).max(0.0),
        }
    }
}
