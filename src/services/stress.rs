// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stress check-in: generated questions and stress-management suggestions.
//!
//! Both calls fall back to fixed lists when the model is unavailable or its
//! reply does not have the expected shape. Results are cached like
//! suggestions.

use crate::error::AppError;
use crate::models::stress::{average_score, StressAnswer, StressQuestion};
use crate::services::cache::TtlCache;
use crate::services::gemini::GeminiClient;
use crate::services::suggestions::{extract_json_array, fallback_list, parse_suggestions};
use crate::time_utils::SharedClock;
use std::ops::RangeInclusive;
use std::time::Duration;

pub const QUESTION_COUNT: usize = 5;

const QUESTIONS_PROMPT: &str = "Generate 5 unique questions for a stress assessment. Each question should gauge different aspects of stress. Return only a JSON array of objects, where each object has 'id' (number), 'text' (string), and 'score' (number, initially 0).";

const QUESTIONS_KEY: &str = "questions";

pub const FALLBACK_QUESTIONS: [&str; QUESTION_COUNT] = [
    "How often do you feel overwhelmed?",
    "How would you rate your sleep quality?",
    "How often do you experience physical tension?",
    "How easily can you concentrate on tasks?",
    "How often do you feel irritable?",
];

pub const FALLBACK_STRESS_SUGGESTIONS: [&str; 5] = [
    "Practice deep breathing exercises for 5 minutes each day",
    "Take short breaks every hour to stretch and relax",
    "Prioritize getting 7-9 hours of sleep each night",
    "Engage in regular physical activity to reduce stress",
    "Consider trying meditation or mindfulness techniques",
];

const SUGGESTION_COUNT: RangeInclusive<usize> = 3..=5;

pub fn fallback_questions() -> Vec<StressQuestion> {
    FALLBACK_QUESTIONS
        .iter()
        .zip(1..)
        .map(|(text, id)| StressQuestion::new(id, text))
        .collect()
}

/// Questions from a model reply. Exactly five well-formed entries, or an error.
pub fn parse_questions(text: &str) -> Result<Vec<StressQuestion>, AppError> {
    let questions: Vec<StressQuestion> = extract_json_array(text)?;
    if questions.len() != QUESTION_COUNT {
        return Err(AppError::GenerativeApi(format!(
            "Expected {} questions, got {}",
            QUESTION_COUNT,
            questions.len()
        )));
    }
    Ok(questions)
}

/// Management suggestions from a model reply. Three to five strings, or an error.
pub fn parse_stress_suggestions(text: &str) -> Result<Vec<String>, AppError> {
    let suggestions = parse_suggestions(text)?;
    if !SUGGESTION_COUNT.contains(&suggestions.len()) {
        return Err(AppError::GenerativeApi(format!(
            "Expected 3-5 suggestions, got {}",
            suggestions.len()
        )));
    }
    Ok(suggestions)
}

pub fn suggestions_prompt(average: f64) -> String {
    format!(
        "Based on an average stress score of {:.2} (on a scale from 0 to 4, where 4 is highest stress), \
         provide 3-5 personalized stress management suggestions. \
         Return only a JSON array of strings, without any additional formatting or markdown.",
        average
    )
}

pub struct StressAdvisor {
    gemini: GeminiClient,
    questions: TtlCache<Vec<StressQuestion>>,
    suggestions: TtlCache<Vec<String>>,
    clock: SharedClock,
}

impl StressAdvisor {
    pub fn new(gemini: GeminiClient, cache_ttl: Duration, clock: SharedClock) -> Self {
        Self {
            gemini,
            questions: TtlCache::new(cache_ttl),
            suggestions: TtlCache::new(cache_ttl),
            clock,
        }
    }

    /// Five check-in questions, every score zero.
    pub async fn questions(&self) -> Vec<StressQuestion> {
        let now = self.clock.now();
        if let Some(cached) = self.questions.get(QUESTIONS_KEY, now) {
            return cached;
        }

        let questions = match self.request_questions().await {
            Ok(questions) => questions
                .into_iter()
                .map(|q| StressQuestion { score: 0.0, ..q })
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Stress question generation failed, using fallback");
                fallback_questions()
            }
        };

        self.questions
            .insert(QUESTIONS_KEY.to_string(), questions.clone(), now);
        questions
    }

    /// Suggestions for the average of `answers`, cached per rounded average.
    pub async fn management_suggestions(&self, answers: &[StressAnswer]) -> Vec<String> {
        let average = average_score(answers);
        let key = format!("{:.2}", average);
        let now = self.clock.now();

        if let Some(cached) = self.suggestions.get(&key, now) {
            tracing::debug!(average = %key, "Stress suggestion cache hit");
            return cached;
        }

        let suggestions = match self.request_suggestions(average).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                tracing::warn!(error = %e, "Stress suggestion generation failed, using fallback");
                fallback_list(&FALLBACK_STRESS_SUGGESTIONS)
            }
        };

        self.suggestions.insert(key, suggestions.clone(), now);
        suggestions
    }

    async fn request_questions(&self) -> Result<Vec<StressQuestion>, AppError> {
        if !self.gemini.is_configured() {
            return Err(AppError::GenerativeApi("API key not configured".to_string()));
        }
        let text = self.gemini.generate_text(QUESTIONS_PROMPT).await?;
        parse_questions(&text)
    }

    async fn request_suggestions(&self, average: f64) -> Result<Vec<String>, AppError> {
        if !self.gemini.is_configured() {
            return Err(AppError::GenerativeApi("API key not configured".to_string()));
        }
        let text = self.gemini.generate_text(&suggestions_prompt(average)).await?;
        parse_stress_suggestions(&text)
    }

    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        self.questions.purge_expired(now) + self.suggestions.purge_expired(now)
    }
}
