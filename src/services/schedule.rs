// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Generated daily schedule for a fasting method.
//!
//! Unlike suggestions there is no fallback text: a failed call is reported
//! to the caller and nothing is stored.

use crate::error::AppError;
use crate::models::fasting::FastingType;
use crate::services::cache::TtlCache;
use crate::services::gemini::GeminiClient;
use crate::time_utils::SharedClock;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Intermittent methods are planned around the clock; religious fasts
/// around prayer and meal times.
pub fn is_intermittent(fasting_type: &FastingType) -> bool {
    fasting_type.name.contains("Intermittent") || fasting_type.name.starts_with("OMAD")
}

pub fn schedule_prompt(fasting_type: &FastingType, target_secs: u64, now: DateTime<Utc>) -> String {
    let name = fasting_type.name;
    let hours = target_secs as f64 / 3600.0;

    let factors = if is_intermittent(fasting_type) {
        format!(
            "Current time: {}\n\
             Fasting duration: {} hours\n\n\
             Consider the following factors:\n\
             1. Circadian rhythm\n\
             2. Meal timing\n\
             3. Sleep schedule\n\
             4. Daily routine",
            now.format("%H:%M UTC"),
            hours
        )
    } else {
        format!(
            "Consider the following factors:\n\
             1. Prayer times\n\
             2. Suhoor and Iftar timings (if applicable)\n\
             3. Energy levels throughout the day\n\
             4. Spiritual practices associated with {}\n\
             5. Fasting duration: {} hours",
            name, hours
        )
    };

    format!(
        "Generate an optimized fasting schedule for {}.\n\n{}\n\n\
         Provide a schedule with specific timings, and include brief explanations for why these times are optimal.\n\
         Also, include any specific guidelines or practices associated with {}.",
        name, factors, name
    )
}

pub struct ScheduleGenerator {
    gemini: GeminiClient,
    cache: TtlCache<String>,
    clock: SharedClock,
}

impl ScheduleGenerator {
    pub fn new(gemini: GeminiClient, cache_ttl: Duration, clock: SharedClock) -> Self {
        Self {
            gemini,
            cache: TtlCache::new(cache_ttl),
            clock,
        }
    }

    /// Schedule text for `fasting_type` with the given target length.
    pub async fn generate(
        &self,
        fasting_type: &FastingType,
        target_secs: u64,
    ) -> Result<String, AppError> {
        if !self.gemini.is_configured() {
            return Err(AppError::GenerativeApi(
                "Schedule generation is not configured".to_string(),
            ));
        }

        let key = format!("{}|{}", fasting_type.name, target_secs);
        let now = self.clock.now();
        if let Some(cached) = self.cache.get(&key, now) {
            tracing::debug!(fasting_type = fasting_type.name, "Schedule cache hit");
            return Ok(cached);
        }

        let prompt = schedule_prompt(fasting_type, target_secs, now);
        let schedule = self.gemini.generate_text(&prompt).await.map_err(|e| {
            tracing::warn!(error = %e, fasting_type = fasting_type.name, "Schedule generation failed");
            e
        })?;

        self.cache.insert(key, schedule.clone(), now);
        Ok(schedule)
    }

    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired(self.clock.now())
    }
}
