// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stress check-in questions and recorded results.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Highest score a single answer can carry.
pub const MAX_ANSWER_SCORE: u32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StressQuestion {
    pub id: i64,
    pub text: String,
    /// Always 0 when handed out
    pub score: f64,
}

impl StressQuestion {
    pub fn new(id: i64, text: &str) -> Self {
        Self {
            id,
            text: text.to_string(),
            score: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StressAnswer {
    pub question_id: i64,
    #[validate(range(max = 4))]
    pub score: u32,
}

/// One completed check-in.
///
/// Stored in `users/{user_id}.stress_profiles`, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StressProfile {
    /// Percentage of the maximum possible score
    pub stress_level: f64,
    pub answers: Vec<StressAnswer>,
    /// Calendar date (YYYY-MM-DD)
    pub date: String,
}

impl StressProfile {
    pub fn new(answers: Vec<StressAnswer>, date: String) -> Self {
        Self {
            stress_level: stress_level(&answers),
            answers,
            date,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StressAssessmentRequest {
    #[validate(length(min = 1, max = 20), nested)]
    pub answers: Vec<StressAnswer>,
}

/// Total score as a percentage of the maximum. Zero for no answers.
pub fn stress_level(answers: &[StressAnswer]) -> f64 {
    if answers.is_empty() {
        return 0.0;
    }
    let total: u32 = answers.iter().map(|a| a.score).sum();
    f64::from(total) / (answers.len() as f64 * f64::from(MAX_ANSWER_SCORE)) * 100.0
}

pub fn average_score(answers: &[StressAnswer]) -> f64 {
    if answers.is_empty() {
        return 0.0;
    }
    let total: u32 = answers.iter().map(|a| a.score).sum();
    f64::from(total) / answers.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(scores: &[u32]) -> Vec<StressAnswer> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &score)| StressAnswer {
                question_id: i as i64 + 1,
                score,
            })
            .collect()
    }

    #[test]
    fn test_stress_level_is_percentage_of_max() {
        assert_eq!(stress_level(&answers(&[4, 4, 4, 4, 4])), 100.0);
        assert_eq!(stress_level(&answers(&[0, 0, 0, 0, 0])), 0.0);
        assert_eq!(stress_level(&answers(&[2, 2, 1, 3, 2])), 50.0);
        assert_eq!(stress_level(&[]), 0.0);
    }

    #[test]
    fn test_average_score() {
        assert_eq!(average_score(&answers(&[1, 2, 3, 4, 0])), 2.0);
        assert_eq!(average_score(&[]), 0.0);
    }

    #[test]
    fn test_request_rejects_out_of_range_scores() {
        let ok = StressAssessmentRequest {
            answers: answers(&[0, 4]),
        };
        assert!(ok.validate().is_ok());

        let too_high = StressAssessmentRequest {
            answers: answers(&[5]),
        };
        assert!(too_high.validate().is_err());

        let empty = StressAssessmentRequest { answers: vec![] };
        assert!(empty.validate().is_err());
    }
}
